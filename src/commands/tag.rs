use serde_json::json;

use super::{CommandOutput, GlobalOptions, load_session};
use crate::cli::OutputOptions;
use crate::error::{ChantagError, Result};
use crate::reconcile::SaveOutcome;
use crate::types::{RowId, join_tags, parse_tags};

/// Toggle each tag on one row, then save
pub async fn cmd_tag(
    global: &GlobalOptions,
    row: RowId,
    tags: &[String],
    output: OutputOptions,
) -> Result<()> {
    // `"a,b"` toggles `a` and `b`.
    let mut wanted = Vec::new();
    for tag in tags {
        let parsed = parse_tags(tag);
        if parsed.is_empty() {
            return Err(ChantagError::InvalidTag(tag.clone()));
        }
        wanted.extend(parsed);
    }

    let mut session = load_session(global, output).await?;

    let before = session
        .record(row)
        .map(|r| r.tags.clone())
        .unwrap_or_default();
    let mut after = before.clone();
    for tag in &wanted {
        after = session.toggle_tag(row, tag)?.to_vec();
    }

    let outcome = session.save().await?;
    let added_tags = match &outcome {
        SaveOutcome::Saved { added_tags, .. } => added_tags.clone(),
        SaveOutcome::NothingToDo => Vec::new(),
    };

    let mut text = format!("Row {row}: [{}] -> [{}]", join_tags(&before), join_tags(&after));
    if !added_tags.is_empty() {
        text.push_str(&format!("\nNew tags: {}", join_tags(&added_tags)));
    }

    CommandOutput::new(json!({
        "row": row,
        "previous_tags": before,
        "tags": after,
        "added_tags": added_tags,
        "saved": matches!(outcome, SaveOutcome::Saved { .. }),
    }))
    .with_text(text)
    .print(output)
}
