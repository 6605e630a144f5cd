//! Tag suggestions derived from channel naming conventions.
//!
//! Channels are commonly named `<team>-<topic>`; the text before the first
//! dash makes a reasonable starting tag.

use serde::Serialize;

use crate::types::{Record, RowId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixSuggestion {
    pub row_id: RowId,
    pub name: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub rows: Vec<PrefixSuggestion>,
    /// Lowercased, de-duplicated and sorted.
    pub prefixes: Vec<String>,
}

/// The trimmed text before the first `-`, if any.
pub fn name_prefix(name: &str) -> Option<&str> {
    let (prefix, _) = name.split_once('-')?;
    let prefix = prefix.trim();
    (!prefix.is_empty()).then_some(prefix)
}

pub fn suggest_prefix_tags(records: &[Record]) -> Suggestions {
    let rows: Vec<PrefixSuggestion> = records
        .iter()
        .filter_map(|record| {
            name_prefix(&record.name).map(|tag| PrefixSuggestion {
                row_id: record.row_id,
                name: record.name.clone(),
                tag: tag.to_string(),
            })
        })
        .collect();

    let mut prefixes: Vec<String> = rows.iter().map(|s| s.tag.to_lowercase()).collect();
    prefixes.sort();
    prefixes.dedup();

    Suggestions { rows, prefixes }
}
