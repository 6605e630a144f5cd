use serde_json::json;
use tabled::Table;
use tabled::settings::Style;

use super::{CommandOutput, GlobalOptions, load_session};
use crate::cli::OutputOptions;
use crate::display::{TagRow, tag_chip};
use crate::error::Result;

/// List known tags, most used first
pub async fn cmd_tags(global: &GlobalOptions, query: Option<&str>, output: OutputOptions) -> Result<()> {
    let session = load_session(global, output).await?;
    let catalog = session.catalog();
    let stats = session.statistics();
    let tags = session.filter_tags(query.unwrap_or(""));

    let json_tags: Vec<_> = tags
        .iter()
        .map(|t| {
            json!({
                "tag": t,
                "label": catalog.labels.get(&t.to_lowercase()),
                "agents": catalog.agents_for(t),
                "channels": stats.usage(t),
            })
        })
        .collect();

    let text = if tags.is_empty() {
        "No tags found.".to_string()
    } else {
        let rows: Vec<TagRow> = tags
            .iter()
            .map(|t| TagRow {
                tag: tag_chip(t, catalog),
                label: catalog.label_for(t).to_string(),
                agents: catalog.agents_for(t).unwrap_or("-").to_string(),
                channels: stats.usage(t),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        format!("{table}\n\n{} tag(s)", tags.len())
    };

    CommandOutput::new(json!({ "tags": json_tags }))
        .with_text(text)
        .print(output)
}
