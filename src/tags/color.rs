//! Deterministic tag colours.

/// Background and text colours for one tag, as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagColor {
    pub bg: &'static str,
    pub text: &'static str,
}

impl TagColor {
    /// The text colour as an RGB triple.
    pub fn text_rgb(&self) -> (u8, u8, u8) {
        hex_rgb(self.text)
    }

    pub fn bg_rgb(&self) -> (u8, u8, u8) {
        hex_rgb(self.bg)
    }
}

fn hex_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0)
    };
    (channel(0), channel(2), channel(4))
}

pub const PALETTE: [TagColor; 12] = [
    TagColor { bg: "#DBEAFE", text: "#1E40AF" }, // blue
    TagColor { bg: "#D1FAE5", text: "#065F46" }, // green
    TagColor { bg: "#FEE2E2", text: "#991B1B" }, // red
    TagColor { bg: "#FEF3C7", text: "#92400E" }, // yellow
    TagColor { bg: "#E0E7FF", text: "#3730A3" }, // indigo
    TagColor { bg: "#FCE7F3", text: "#9D174D" }, // pink
    TagColor { bg: "#CFFAFE", text: "#155E75" }, // cyan
    TagColor { bg: "#F3E8FF", text: "#6B21A8" }, // purple
    TagColor { bg: "#FFEDD5", text: "#9A3412" }, // orange
    TagColor { bg: "#ECFDF5", text: "#047857" }, // emerald
    TagColor { bg: "#FDF4FF", text: "#86198F" }, // fuchsia
    TagColor { bg: "#F0FDF4", text: "#166534" }, // lime
];

/// 32-bit `h * 31 + unit` over UTF-16 code units, as an absolute value.
fn hash_tag(tag: &str) -> u32 {
    let hash = tag
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

/// Palette entry for `tag`. Case-insensitive.
pub fn tag_color(tag: &str) -> TagColor {
    let index = hash_tag(&tag.to_lowercase()) as usize % PALETTE.len();
    PALETTE[index]
}
