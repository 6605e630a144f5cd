//! The record store: channel rows read from the main sheet.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, RECORDS_KEY};
use crate::error::Result;
use crate::remote::{CellWrite, ColumnRef, Grid, SheetSource, a1::qualified_range, cell_at, header_text};
use crate::types::{FIRST_DATA_ROW, Record, RowId, TagChange, join_tags, normalize_tags};

/// Main-sheet column positions, each absent when the header lacks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordColumns {
    pub name: Option<ColumnRef>,
    pub channel_type: Option<ColumnRef>,
    pub members: Option<ColumnRef>,
    pub tags: Option<ColumnRef>,
}

impl RecordColumns {
    /// Column tags are written to; `D` when the header has no `tags` column.
    pub fn tags_or_default(&self) -> ColumnRef {
        self.tags.unwrap_or(ColumnRef::DEFAULT_TAGS)
    }
}

/// Resolve main-sheet columns by exact, case-insensitive header match.
pub fn resolve_columns(header: &[String]) -> RecordColumns {
    let find = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .map(ColumnRef)
    };

    RecordColumns {
        name: find("name"),
        channel_type: find("type"),
        members: find("members"),
        tags: find("tags"),
    }
}

/// One record per data row with a non-empty name. Row ids are physical rows.
pub fn build_records(columns: &RecordColumns, rows: &Grid) -> Vec<Record> {
    let text = |row: &[serde_json::Value], col: Option<ColumnRef>| {
        col.map(|c| cell_at(row, c.index())).unwrap_or_default()
    };

    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let row = row.as_slice();
            let name = text(row, columns.name);
            if name.is_empty() {
                return None;
            }
            Some(Record::new(
                i as RowId + FIRST_DATA_ROW,
                name,
                text(row, columns.channel_type),
                text(row, columns.members),
                text(row, columns.tags),
            ))
        })
        .collect()
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    records: Vec<Record>,
    tags_column: ColumnRef,
}

/// Channel records plus the column their tags live in.
pub struct RecordStore {
    remote: Arc<dyn SheetSource>,
    cache: CacheStore,
    sheet: String,
    records: Vec<Record>,
    tags_column: ColumnRef,
}

impl RecordStore {
    pub fn new(remote: Arc<dyn SheetSource>, cache: CacheStore, sheet: impl Into<String>) -> Self {
        Self {
            remote,
            cache,
            sheet: sheet.into(),
            records: Vec::new(),
            tags_column: ColumnRef::DEFAULT_TAGS,
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn tags_column(&self) -> ColumnRef {
        self.tags_column
    }

    pub fn get(&self, row_id: RowId) -> Option<&Record> {
        self.records.iter().find(|r| r.row_id == row_id)
    }

    /// Drop loaded records, e.g. after sign-out.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Replace the collection from cache, or from the sheet on a miss.
    ///
    /// On error the current collection is left as it was.
    pub async fn load_all(&mut self) -> Result<&[Record]> {
        let snapshot = match self.cache.get::<Snapshot>(RECORDS_KEY) {
            Some(snapshot) => snapshot,
            None => {
                let snapshot = self.fetch().await?;
                self.cache.set(RECORDS_KEY, &snapshot);
                snapshot
            }
        };

        self.records = snapshot.records;
        self.tags_column = snapshot.tags_column;
        Ok(&self.records)
    }

    async fn fetch(&self) -> Result<Snapshot> {
        let header = self.remote.read_range(&self.sheet, "A1:Z1").await?;
        let columns = resolve_columns(&header_text(&header));
        tracing::debug!("Main sheet columns: {columns:?}");

        let rows = self.remote.read_range(&self.sheet, "A2:Z").await?;
        let records = build_records(&columns, &rows);
        tracing::info!(
            "Loaded {} records from {} rows, tags in column {}",
            records.len(),
            rows.len(),
            columns.tags_or_default()
        );

        Ok(Snapshot {
            records,
            tags_column: columns.tags_or_default(),
        })
    }

    /// The batch that writes every change to the tags column.
    pub fn writes_for(&self, changes: &[TagChange]) -> Vec<CellWrite> {
        changes
            .iter()
            .map(|change| CellWrite {
                range: qualified_range(&self.sheet, &self.tags_column.cell(change.row_id)),
                value: join_tags(&normalize_tags(&change.tags)),
            })
            .collect()
    }

    /// Write all changes in one batch call.
    pub async fn write_tags(&self, changes: &[TagChange]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.remote.batch_write(self.writes_for(changes)).await
    }

    /// Overwrite local tags after a confirmed remote write.
    ///
    /// Each change is applied on its own. Returns the rows that were not
    /// in the store.
    pub fn apply_changes(&mut self, changes: &[TagChange]) -> Vec<RowId> {
        let mut missing = Vec::new();
        for change in changes {
            match self.records.iter_mut().find(|r| r.row_id == change.row_id) {
                Some(record) => record.set_tags(change.tags.clone()),
                None => missing.push(change.row_id),
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemorySheet;
    use serde_json::json;
    use std::time::Duration;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_columns() {
        let cols = resolve_columns(&strings(&["Tags", "NAME", "members"]));
        assert_eq!(cols.tags, Some(ColumnRef(0)));
        assert_eq!(cols.name, Some(ColumnRef(1)));
        assert_eq!(cols.members, Some(ColumnRef(2)));
        assert_eq!(cols.channel_type, None);
    }

    #[test]
    fn test_missing_tags_column_defaults_to_d() {
        let cols = resolve_columns(&strings(&["name", "type"]));
        assert_eq!(cols.tags_or_default(), ColumnRef(3));
    }

    #[test]
    fn test_build_records_skips_nameless_rows() {
        let cols = resolve_columns(&strings(&["name", "type", "members", "tags"]));
        let rows = vec![
            vec![json!("general"), json!(""), json!("ana"), json!("")],
            vec![json!("  "), json!("public")],
            vec![],
            vec![json!("random"), json!("private"), json!(""), json!("eng, ops")],
        ];

        let records = build_records(&cols, &rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row_id, 2);
        assert_eq!(records[0].channel_type, "public");
        assert_eq!(records[1].row_id, 5);
        assert_eq!(records[1].tags, vec!["eng", "ops"]);
    }

    #[test]
    fn test_build_records_without_name_column_is_empty() {
        let cols = resolve_columns(&strings(&["type", "tags"]));
        let rows = vec![vec![json!("public"), json!("eng")]];
        assert!(build_records(&cols, &rows).is_empty());
    }

    #[test]
    fn test_numeric_cells_become_text() {
        let cols = resolve_columns(&strings(&["name", "type", "members", "tags"]));
        let rows = vec![vec![json!(2024), json!(""), json!(""), json!(7)]];
        let records = build_records(&cols, &rows);
        assert_eq!(records[0].name, "2024");
        assert_eq!(records[0].tags, vec!["7"]);
    }

    fn sheet() -> Arc<MemorySheet> {
        Arc::new(MemorySheet::new().with_sheet(
            "Channels",
            vec![
                vec![json!("name"), json!("tags"), json!("type")],
                vec![json!("general"), json!(""), json!("public")],
                vec![json!("random"), json!("eng")],
            ],
        ))
    }

    #[tokio::test]
    async fn test_load_all_records_tags_column_and_caches() {
        let sheet = sheet();
        let cache = CacheStore::in_memory(Duration::from_secs(300));
        let mut store = RecordStore::new(sheet.clone(), cache.clone(), "Channels");

        store.load_all().await.unwrap();
        assert_eq!(store.records().len(), 2);
        assert_eq!(store.tags_column(), ColumnRef(1));

        let reads = sheet.read_count();
        let mut again = RecordStore::new(sheet.clone(), cache, "Channels");
        again.load_all().await.unwrap();
        assert_eq!(sheet.read_count(), reads);
        assert_eq!(again.tags_column(), ColumnRef(1));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_records() {
        let sheet = sheet();
        let cache = CacheStore::in_memory(Duration::from_secs(300));
        let mut store = RecordStore::new(sheet.clone(), cache.clone(), "Channels");
        store.load_all().await.unwrap();

        cache.clear_all();
        sheet.set_fail_reads(true);
        assert!(store.load_all().await.is_err());
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_write_tags_single_batch() {
        let sheet = sheet();
        let mut store = RecordStore::new(
            sheet.clone(),
            CacheStore::in_memory(Duration::from_secs(300)),
            "Channels",
        );
        store.load_all().await.unwrap();

        let changes = vec![
            TagChange {
                row_id: 2,
                tags: strings(&["eng", "ops"]),
            },
            TagChange {
                row_id: 3,
                tags: vec![],
            },
        ];
        store.write_tags(&changes).await.unwrap();

        assert_eq!(sheet.batch_call_count(), 1);
        assert_eq!(sheet.cell("Channels", "B2"), "eng, ops");
        assert_eq!(sheet.cell("Channels", "B3"), "");
    }

    #[tokio::test]
    async fn test_apply_changes() {
        let mut store = RecordStore::new(
            sheet(),
            CacheStore::in_memory(Duration::from_secs(300)),
            "Channels",
        );
        store.load_all().await.unwrap();

        let missing = store.apply_changes(&[TagChange {
            row_id: 2,
            tags: strings(&["eng", "ops"]),
        }]);
        assert!(missing.is_empty());
        let record = store.get(2).unwrap();
        assert_eq!(record.tag_raw, "eng, ops");
    }

    #[tokio::test]
    async fn test_apply_changes_skips_unknown_rows_only() {
        let mut store = RecordStore::new(
            sheet(),
            CacheStore::in_memory(Duration::from_secs(300)),
            "Channels",
        );
        store.load_all().await.unwrap();

        let missing = store.apply_changes(&[
            TagChange {
                row_id: 2,
                tags: strings(&["eng"]),
            },
            TagChange {
                row_id: 99,
                tags: vec![],
            },
        ]);

        assert_eq!(missing, vec![99]);
        assert_eq!(store.get(2).unwrap().tags, vec!["eng"]);
    }

    #[test]
    fn test_writes_for_normalizes_tag_text() {
        let store = RecordStore::new(
            sheet(),
            CacheStore::in_memory(Duration::from_secs(300)),
            "Channels",
        );
        let writes = store.writes_for(&[TagChange {
            row_id: 2,
            tags: strings(&["a,b", "  "]),
        }]);
        assert_eq!(writes[0].value, "a, b");
    }
}
