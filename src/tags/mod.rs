//! The tag directory: the catalog of known tags kept on the tags sheet.
//!
//! The sheet's header row decides which column holds the tag prefix and
//! which optional columns hold display labels and agents metadata. Matching
//! is always case-insensitive; the first spelling seen is the one kept.

mod color;
mod picker;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, TAGS_KEY};
use crate::error::Result;
use crate::remote::{ColumnRef, Grid, SheetSource, cell_at, header_text};
use crate::types::{FIRST_DATA_ROW, RowId, find_tag, normalize_tags};

pub use color::{PALETTE, TagColor, tag_color};
pub use picker::{filter_list_order, picker_order};

/// Where the tags sheet keeps each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagColumns {
    pub prefix: ColumnRef,
    pub label: Option<ColumnRef>,
    pub agents: Option<ColumnRef>,
}

/// Resolve tags-sheet columns from its header row.
///
/// The identity column is `prefix`, else `tag` or `tags`, else the first
/// column. Header text is compared trimmed and lowercased.
pub fn resolve_tag_columns(header: &[String]) -> TagColumns {
    let find = |names: &[&str]| {
        header
            .iter()
            .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
            .map(ColumnRef)
    };

    TagColumns {
        prefix: find(&["prefix"])
            .or_else(|| find(&["tag", "tags"]))
            .unwrap_or(ColumnRef(0)),
        label: find(&["label"]),
        agents: find(&["agents"]),
    }
}

/// Every known tag plus its optional label and agents metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCatalog {
    /// Sorted case-insensitively, unique by case-folded value.
    pub tags: Vec<String>,
    /// Lowercased prefix to label.
    pub labels: BTreeMap<String, String>,
    /// Lowercased prefix to agents metadata.
    pub agents: BTreeMap<String, String>,
}

impl TagCatalog {
    /// Build from data rows (header excluded).
    pub fn from_rows(columns: &TagColumns, rows: &Grid) -> Self {
        let mut catalog = TagCatalog::default();

        for row in rows {
            let prefix = cell_at(row, columns.prefix.index());
            if prefix.is_empty() || catalog.contains(&prefix) {
                continue;
            }

            let key = prefix.to_lowercase();
            if let Some(col) = columns.label {
                let label = cell_at(row, col.index());
                if !label.is_empty() {
                    catalog.labels.insert(key.clone(), label);
                }
            }
            if let Some(col) = columns.agents {
                let agents = cell_at(row, col.index());
                if !agents.is_empty() {
                    catalog.agents.insert(key, agents);
                }
            }
            catalog.tags.push(prefix);
        }

        catalog
            .tags
            .sort_by_cached_key(|t| t.to_lowercase());
        catalog
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        find_tag(&self.tags, tag.trim()).is_some()
    }

    /// The catalog's spelling of `tag`, if known.
    pub fn canonical(&self, tag: &str) -> Option<&str> {
        find_tag(&self.tags, tag.trim()).map(|i| self.tags[i].as_str())
    }

    /// Display label for `prefix`, falling back to the prefix itself.
    pub fn label_for<'a>(&'a self, prefix: &'a str) -> &'a str {
        self.labels
            .get(&prefix.to_lowercase())
            .map(String::as_str)
            .unwrap_or(prefix)
    }

    pub fn agents_for(&self, prefix: &str) -> Option<&str> {
        self.agents.get(&prefix.to_lowercase()).map(String::as_str)
    }
}

/// Result of [`TagDirectory::ensure_exist`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnsureOutcome {
    pub added_count: usize,
    pub added_tags: Vec<String>,
}

/// Reads and extends the tags sheet through the cache.
pub struct TagDirectory {
    remote: Arc<dyn SheetSource>,
    cache: CacheStore,
    sheet: String,
}

impl TagDirectory {
    pub fn new(remote: Arc<dyn SheetSource>, cache: CacheStore, sheet: impl Into<String>) -> Self {
        Self {
            remote,
            cache,
            sheet: sheet.into(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    async fn columns(&self) -> Result<TagColumns> {
        let header = self.remote.read_range(&self.sheet, "A1:Z1").await?;
        let columns = resolve_tag_columns(&header_text(&header));
        tracing::debug!(
            "Tags sheet columns: prefix={} label={:?} agents={:?}",
            columns.prefix,
            columns.label.map(|c| c.letters()),
            columns.agents.map(|c| c.letters())
        );
        Ok(columns)
    }

    /// Cached catalog, or a fresh read of the tags sheet.
    pub async fn load_all(&self) -> Result<TagCatalog> {
        if let Some(catalog) = self.cache.get::<TagCatalog>(TAGS_KEY) {
            return Ok(catalog);
        }

        let columns = self.columns().await?;
        let rows = self.remote.read_range(&self.sheet, "A2:Z").await?;
        let catalog = TagCatalog::from_rows(&columns, &rows);

        tracing::info!("Loaded {} tags", catalog.len());
        self.cache.set(TAGS_KEY, &catalog);
        Ok(catalog)
    }

    /// Append every candidate the catalog does not know yet.
    ///
    /// Candidates are split on commas and trimmed, empties dropped and
    /// case-insensitive duplicates collapsed to their first spelling before
    /// checking.
    pub async fn ensure_exist<S: AsRef<str>>(&self, candidates: &[S]) -> Result<EnsureOutcome> {
        let mut wanted: Vec<String> = Vec::new();
        for tag in normalize_tags(candidates) {
            if find_tag(&wanted, &tag).is_none() {
                wanted.push(tag);
            }
        }
        if wanted.is_empty() {
            return Ok(EnsureOutcome::default());
        }

        let catalog = self.load_all().await?;
        let missing: Vec<String> = wanted
            .into_iter()
            .filter(|t| !catalog.contains(t))
            .collect();
        if missing.is_empty() {
            return Ok(EnsureOutcome::default());
        }

        let column = self.columns().await?.prefix;
        let occupied = self
            .remote
            .read_range(&self.sheet, &format!("{column}:{column}"))
            .await?
            .len();
        let first_free = (occupied.max(1) as RowId + 1).max(FIRST_DATA_ROW);

        let values: Vec<Vec<String>> = missing.iter().map(|t| vec![t.clone()]).collect();
        if column.index() == 0 {
            self.remote.append_rows(&self.sheet, first_free, values).await?;
        } else {
            self.remote
                .write_range(&self.sheet, &column.cell(first_free), values)
                .await?;
        }

        self.cache.clear_all();
        tracing::info!("Added {} new tag(s) at row {first_free}", missing.len());

        Ok(EnsureOutcome {
            added_count: missing.len(),
            added_tags: missing,
        })
    }
}
