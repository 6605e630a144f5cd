use serde_json::json;
use tabled::Table;
use tabled::settings::Style;

use super::{CommandOutput, GlobalOptions, load_session};
use crate::cli::OutputOptions;
use crate::display::{ChannelRow, format_page_footer, format_page_items};
use crate::error::Result;
use crate::query::{SortDirection, SortField};

/// Listing criteria from the command line.
#[derive(Debug, Clone, Default)]
pub struct LsOptions {
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub untagged: bool,
    pub sort: SortField,
    pub desc: bool,
    pub page: usize,
    pub page_size: Option<usize>,
}

/// List channels matching the given criteria
pub async fn cmd_ls(global: &GlobalOptions, options: LsOptions, output: OutputOptions) -> Result<()> {
    let mut session = load_session(global, output).await?;

    let filters = session.filters_mut();
    if let Some(size) = options.page_size {
        filters.set_page_size(size);
    }
    if let Some(search) = &options.search {
        filters.set_search(search);
    }
    if !options.tags.is_empty() {
        filters.apply_tag_filters(options.tags.clone());
    } else if options.untagged {
        filters.toggle_untagged();
    }
    filters.sort_field = options.sort;
    filters.sort_direction = if options.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    filters.page = options.page.max(1);

    let view = session.view();
    let summary = view.summary();

    let json_rows: Vec<_> = view
        .page
        .iter()
        .map(|r| {
            json!({
                "row": r.row_id,
                "name": r.name,
                "type": r.channel_type,
                "tags": session.effective_tags(r),
                "members": r.member_list(),
            })
        })
        .collect();
    let json_output = json!({
        "channels": json_rows,
        "page": summary,
        "filters": session.filters(),
    });

    let text = if view.total == 0 {
        "No channels found.".to_string()
    } else if view.page.is_empty() {
        format!(
            "Page {} is past the end ({} page(s)).",
            view.page_number, view.total_pages
        )
    } else {
        let rows: Vec<ChannelRow> = view
            .page
            .iter()
            .map(|r| {
                ChannelRow::new(
                    r,
                    session.effective_tags(r),
                    session.catalog(),
                    session.pending().contains(r.row_id),
                )
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());

        let mut text = format!("{table}\n\n{}", format_page_footer(&summary));
        if view.total_pages > 1 {
            text.push_str(&format!(
                "\nPages: {}",
                format_page_items(&view.page_numbers(), view.page_number)
            ));
        }
        text
    };

    CommandOutput::new(json_output).with_text(text).print(output)
}
