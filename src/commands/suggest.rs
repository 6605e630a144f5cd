use serde_json::json;

use super::{CommandOutput, GlobalOptions, load_session};
use crate::cli::OutputOptions;
use crate::error::Result;
use crate::reconcile::SaveOutcome;
use crate::suggest::suggest_prefix_tags;
use crate::types::has_tag;

/// Suggest tags from name prefixes, optionally applying them
pub async fn cmd_suggest(global: &GlobalOptions, apply: bool, output: OutputOptions) -> Result<()> {
    let mut session = load_session(global, output).await?;
    let suggestions = suggest_prefix_tags(session.records());

    // Rows whose effective tags already carry the suggestion are skipped.
    let missing: Vec<_> = suggestions
        .rows
        .iter()
        .filter(|s| {
            session
                .record(s.row_id)
                .map(|r| !has_tag(session.effective_tags(r), &s.tag))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    let mut saved = 0;
    if apply {
        for suggestion in &missing {
            session.toggle_tag(suggestion.row_id, &suggestion.tag)?;
        }
        if let SaveOutcome::Saved { count, .. } = session.save().await? {
            saved = count;
        }
    }

    let mut text = String::new();
    if missing.is_empty() {
        text.push_str("No new suggestions.");
    } else {
        for s in &missing {
            text.push_str(&format!("{:>5}  #{} -> {}\n", s.row_id, s.name, s.tag));
        }
        text.push_str(&format!("\nPrefixes: {}", suggestions.prefixes.join(", ")));
        if apply {
            text.push_str(&format!("\nApplied to {saved} channel(s)"));
        } else {
            text.push_str("\nRun with --apply to save these tags.");
        }
    }

    CommandOutput::new(json!({
        "suggestions": missing,
        "prefixes": suggestions.prefixes,
        "applied": apply,
        "saved": saved,
    }))
    .with_text(text)
    .print(output)
}
