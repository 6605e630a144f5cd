//! Page-number window for pagination controls.

use serde::Serialize;

/// Pages shown around the current one when not overridden.
pub const DEFAULT_MAX_VISIBLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

/// A window of at most `max_visible` pages centred on `current`, plus the
/// first and last page when the window misses them. Gaps of more than one
/// page are shown as [`PageItem::Ellipsis`].
pub fn page_numbers(current: usize, total_pages: usize, max_visible: usize) -> Vec<PageItem> {
    if total_pages == 0 || max_visible == 0 {
        return Vec::new();
    }

    let current = current.clamp(1, total_pages);
    let mut start = current.saturating_sub(max_visible / 2).max(1);
    let end = (start + max_visible - 1).min(total_pages);
    if end - start < max_visible - 1 {
        start = (end + 1).saturating_sub(max_visible).max(1);
    }

    let mut items = Vec::with_capacity(max_visible + 4);
    if start > 1 {
        items.push(PageItem::Page(1));
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }
    items.extend((start..=end).map(PageItem::Page));
    if end < total_pages {
        if end < total_pages - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Page(total_pages));
    }
    items
}
