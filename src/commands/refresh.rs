use serde_json::json;

use super::{CommandOutput, GlobalOptions, open_session};
use crate::cli::OutputOptions;
use crate::error::Result;

/// Clear the cache and reload everything from the sheet
pub async fn cmd_refresh(global: &GlobalOptions, output: OutputOptions) -> Result<()> {
    let mut session = open_session(global, output)?;
    // A fresh process has no pending edits, so this never prompts.
    session.refresh().await?;

    let stats = session.statistics();
    CommandOutput::new(json!({
        "channels": stats.total_records,
        "tags": stats.total_tags,
        "refreshed": true,
    }))
    .with_text(format!(
        "Loaded {} channel(s) and {} tag(s)",
        stats.total_records, stats.total_tags
    ))
    .print(output)
}
