//! Staged, unsaved tag edits.

use std::collections::BTreeMap;

use crate::types::{Record, RowId, TagChange, find_tag};

/// Complete replacement tag lists keyed by row. Never deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdits {
    edits: BTreeMap<RowId, Vec<String>>,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    /// The staged list for `record`, or its stored tags.
    pub fn effective_tags<'a>(&'a self, record: &'a Record) -> &'a [String] {
        self.edits
            .get(&record.row_id)
            .map(Vec::as_slice)
            .unwrap_or(&record.tags)
    }

    /// Add `tag` to the record's effective tags, or remove its first
    /// case-insensitive match. The result replaces any staged list.
    ///
    /// Returns the new effective list.
    pub fn toggle(&mut self, record: &Record, tag: &str) -> &[String] {
        let mut tags = self.effective_tags(record).to_vec();
        match find_tag(&tags, tag) {
            Some(index) => {
                tags.remove(index);
            }
            None => tags.push(tag.to_string()),
        }
        self.edits.insert(record.row_id, tags);
        &self.edits[&record.row_id]
    }

    /// Stage a complete list directly.
    pub fn stage(&mut self, row_id: RowId, tags: Vec<String>) {
        self.edits.insert(row_id, tags);
    }

    pub fn get(&self, row_id: RowId) -> Option<&[String]> {
        self.edits.get(&row_id).map(Vec::as_slice)
    }

    pub fn contains(&self, row_id: RowId) -> bool {
        self.edits.contains_key(&row_id)
    }

    pub fn discard_all(&mut self) {
        self.edits.clear();
    }

    /// Rows with staged edits.
    pub fn count(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Staged edits as write requests, in row order.
    pub fn changes(&self) -> Vec<TagChange> {
        self.edits
            .iter()
            .map(|(row_id, tags)| TagChange {
                row_id: *row_id,
                tags: tags.clone(),
            })
            .collect()
    }

    /// Every tag referenced by any staged edit, de-duplicated case-insensitively.
    pub fn union_tags(&self) -> Vec<String> {
        let mut union: Vec<String> = Vec::new();
        for tag in self.edits.values().flatten() {
            if find_tag(&union, tag).is_none() {
                union.push(tag.clone());
            }
        }
        union
    }
}
