//! Counts over the loaded records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::pending::PendingEdits;
use crate::tags::TagCatalog;
use crate::types::{Record, tag_eq};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_records: usize,
    pub total_tags: usize,
    pub untagged_count: usize,
    /// Records per tag, keyed by the catalog's spelling when the tag is
    /// known and by the first spelling seen otherwise.
    pub tag_counts: BTreeMap<String, usize>,
}

impl Statistics {
    /// Count effective tags across `records`.
    pub fn compute(records: &[Record], pending: &PendingEdits, catalog: &TagCatalog) -> Self {
        let mut stats = Statistics {
            total_records: records.len(),
            total_tags: catalog.len(),
            ..Self::default()
        };

        for record in records {
            let tags = pending.effective_tags(record);
            if tags.is_empty() {
                stats.untagged_count += 1;
                continue;
            }
            for tag in tags {
                let key = match catalog.canonical(tag) {
                    Some(canonical) => canonical.to_string(),
                    None => stats
                        .tag_counts
                        .keys()
                        .find(|k| tag_eq(k, tag))
                        .cloned()
                        .unwrap_or_else(|| tag.clone()),
                };
                *stats.tag_counts.entry(key).or_insert(0) += 1;
            }
        }

        stats
    }

    /// Records carrying `tag`, matched case-insensitively.
    pub fn usage(&self, tag: &str) -> usize {
        self.tag_counts
            .iter()
            .find(|(k, _)| tag_eq(k, tag))
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn tagged_count(&self) -> usize {
        self.total_records - self.untagged_count
    }
}
