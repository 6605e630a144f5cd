use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, GlobalOptions, load_session};
use crate::cli::OutputOptions;
use crate::error::Result;

/// Show channel and tag counts
pub async fn cmd_stats(global: &GlobalOptions, output: OutputOptions) -> Result<()> {
    let session = load_session(global, output).await?;
    let stats = session.statistics();

    let mut counts: Vec<(&String, &usize)> = stats.tag_counts.iter().collect();
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    let mut text = format!("{}\n", "Statistics:".cyan().bold());
    text.push_str(&format!("  Channels: {}\n", stats.total_records));
    text.push_str(&format!("  Tags: {}\n", stats.total_tags));
    text.push_str(&format!("  Untagged: {}", stats.untagged_count));
    if !counts.is_empty() {
        text.push_str(&format!("\n\n{}", "Usage:".cyan().bold()));
        for (tag, count) in counts {
            text.push_str(&format!("\n  {tag}: {count}"));
        }
    }

    CommandOutput::new(json!(stats)).with_text(text).print(output)
}
