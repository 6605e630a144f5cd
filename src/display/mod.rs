//! Terminal rendering for listings.
//!
//! Colours are only emitted when stdout supports them, so piped output and
//! tests see plain text.

use owo_colors::{OwoColorize, Stream};
use tabled::Tabled;

use crate::query::{PageItem, PageSummary};
use crate::tags::{TagCatalog, tag_color};
use crate::types::Record;

/// One channel in the `ls` table.
#[derive(Tabled)]
pub struct ChannelRow {
    #[tabled(rename = "Row")]
    pub row: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub channel_type: String,
    #[tabled(rename = "Tags")]
    pub tags: String,
    #[tabled(rename = "Members")]
    pub members: usize,
}

impl ChannelRow {
    /// `tags` are the record's effective tags; `dirty` marks unsaved edits.
    pub fn new(record: &Record, tags: &[String], catalog: &TagCatalog, dirty: bool) -> Self {
        let row = if dirty {
            format!("{}*", record.row_id)
        } else {
            record.row_id.to_string()
        };
        Self {
            row,
            name: format!("#{}", record.name),
            channel_type: format_type(&record.channel_type),
            tags: format_tags(tags, catalog),
            members: record.member_list().len(),
        }
    }
}

/// One tag in the `tags` table.
#[derive(Tabled)]
pub struct TagRow {
    #[tabled(rename = "Tag")]
    pub tag: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Agents")]
    pub agents: String,
    #[tabled(rename = "Channels")]
    pub channels: usize,
}

/// A tag rendered with its palette colours, showing its label.
pub fn tag_chip(tag: &str, catalog: &TagCatalog) -> String {
    let color = tag_color(tag);
    let (fr, fg, fb) = color.text_rgb();
    let (br, bg, bb) = color.bg_rgb();
    let label = catalog.label_for(tag);
    label
        .if_supports_color(Stream::Stdout, |t| {
            t.truecolor(fr, fg, fb).on_truecolor(br, bg, bb).to_string()
        })
        .to_string()
}

pub fn format_tags(tags: &[String], catalog: &TagCatalog) -> String {
    if tags.is_empty() {
        return "-"
            .if_supports_color(Stream::Stdout, |t| t.dimmed())
            .to_string();
    }
    tags.iter()
        .map(|t| tag_chip(t, catalog))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_type(channel_type: &str) -> String {
    if channel_type.eq_ignore_ascii_case("private") {
        channel_type
            .if_supports_color(Stream::Stdout, |t| t.yellow())
            .to_string()
    } else {
        channel_type.to_string()
    }
}

/// Page strip such as `1 … 4 5 [6] 7 8 … 12`.
pub fn format_page_items(items: &[PageItem], current: usize) -> String {
    items
        .iter()
        .map(|item| match item {
            PageItem::Page(n) if *n == current => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Showing 26-50 of 120 channels`.
pub fn format_page_footer(summary: &PageSummary) -> String {
    format!(
        "Showing {}-{} of {} channel(s)",
        summary.start, summary.end, summary.total
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    #[test]
    fn test_format_page_items_marks_current() {
        let items = vec![Page(1), Ellipsis, Page(5), Page(6), Page(7), Ellipsis, Page(12)];
        assert_eq!(format_page_items(&items, 6), "1 … 5 [6] 7 … 12");
    }

    #[test]
    fn test_footer_for_empty_result() {
        let summary = PageSummary {
            total: 0,
            start: 0,
            end: 0,
            page: 1,
            total_pages: 0,
        };
        assert_eq!(format_page_footer(&summary), "Showing 0-0 of 0 channel(s)");
    }

    #[test]
    fn test_channel_row_marks_dirty() {
        let record = Record::new(7, "eng-backend", "private", "ana, bo", "eng");
        let row = ChannelRow::new(&record, &record.tags, &TagCatalog::default(), true);
        assert_eq!(row.row, "7*");
        assert_eq!(row.name, "#eng-backend");
        assert_eq!(row.members, 2);
    }
}
