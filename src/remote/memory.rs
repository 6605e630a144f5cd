//! In-process spreadsheet.
//!
//! Behaves like the REST API where it matters to callers: reads trim trailing
//! empty cells and rows, unknown sheets are errors, and a batch write is
//! validated in full before any cell changes. Failure switches and call
//! counters make it usable as a test double; [`MemorySheet::open`] backs it
//! with a JSON fixture file for offline runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChantagError, Result};

use super::a1::{CellAnchor, CellRange, split_qualified};
use super::{CellWrite, Grid, SheetSource, cell_text};

/// On-disk fixture layout: sheet name to rows of cells.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub sheets: BTreeMap<String, Grid>,
}

#[derive(Default)]
pub struct MemorySheet {
    sheets: Mutex<BTreeMap<String, Grid>>,
    persist_to: Option<PathBuf>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    batch_calls: AtomicUsize,
    write_log: Mutex<Vec<CellWrite>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file; successful writes are saved back to it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| {
            ChantagError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read fixture at {}: {}", path.display(), e),
            ))
        })?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded fixture {} with {} sheet(s)",
            path.display(),
            fixture.sheets.len()
        );

        Ok(Self {
            sheets: Mutex::new(fixture.sheets),
            persist_to: Some(path),
            ..Self::default()
        })
    }

    pub fn with_sheet(self, name: &str, grid: Grid) -> Self {
        self.set_grid(name, grid);
        self
    }

    pub fn set_grid(&self, name: &str, grid: Grid) {
        self.sheets.lock().insert(name.to_string(), grid);
    }

    pub fn grid(&self, name: &str) -> Option<Grid> {
        self.sheets.lock().get(name).cloned()
    }

    /// Text of one cell, e.g. `cell("Channels", "D2")`. Empty when absent.
    pub fn cell(&self, sheet: &str, cell: &str) -> String {
        let Ok(anchor) = cell.parse::<CellAnchor>() else {
            return String::new();
        };
        let sheets = self.sheets.lock();
        let row = anchor.row.unwrap_or(1) as usize - 1;
        let value = sheets
            .get(sheet)
            .and_then(|g| g.get(row))
            .and_then(|r| r.get(anchor.column.index()));
        cell_text(value)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn batch_call_count(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Every cell written so far, in order.
    pub fn write_log(&self) -> Vec<CellWrite> {
        self.write_log.lock().clone()
    }

    pub fn save_fixture(&self, path: &Path) -> Result<()> {
        let fixture = Fixture {
            sheets: self.sheets.lock().clone(),
        };
        fs::write(path, serde_json::to_string_pretty(&fixture)?)?;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        match &self.persist_to {
            Some(path) => self.save_fixture(path),
            None => Ok(()),
        }
    }

    fn check_write(&self, what: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChantagError::RemoteWrite(format!("{what}: simulated failure")));
        }
        Ok(())
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn unknown_sheet(sheet: &str) -> String {
    format!("{sheet}: no sheet named '{sheet}'")
}

/// Cut `range` out of `grid`, trimming trailing blanks like the API does.
fn slice(grid: &Grid, range: &CellRange) -> Grid {
    let first = range.first_row() as usize - 1;
    let last = range
        .last_row()
        .map(|r| r as usize)
        .unwrap_or(grid.len())
        .min(grid.len());
    let columns = range.columns();

    let mut out: Grid = (first..last)
        .map(|r| {
            let row = &grid[r];
            let mut cells: Vec<Value> = columns
                .clone()
                .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                .collect();
            while cells.last().is_some_and(is_blank) {
                cells.pop();
            }
            cells
        })
        .collect();

    while out.last().is_some_and(Vec::is_empty) {
        out.pop();
    }
    out
}

fn put(grid: &mut Grid, row: usize, column: usize, value: Value) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= column {
        cells.resize(column + 1, Value::Null);
    }
    cells[column] = value;
}

#[async_trait]
impl SheetSource for MemorySheet {
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Grid> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ChantagError::RemoteRead(format!("{sheet}: simulated failure")));
        }

        let range: CellRange = range.parse()?;
        let sheets = self.sheets.lock();
        let grid = sheets
            .get(sheet)
            .ok_or_else(|| ChantagError::RemoteRead(unknown_sheet(sheet)))?;
        Ok(slice(grid, &range))
    }

    async fn write_range(&self, sheet: &str, cell: &str, values: Vec<Vec<String>>) -> Result<()> {
        self.check_write(sheet)?;
        let anchor: CellAnchor = cell.parse()?;
        let top = anchor.row.unwrap_or(1) as usize - 1;
        let left = anchor.column.index();

        {
            let mut sheets = self.sheets.lock();
            let grid = sheets
                .get_mut(sheet)
                .ok_or_else(|| ChantagError::RemoteWrite(unknown_sheet(sheet)))?;
            let mut log = self.write_log.lock();

            for (dr, row) in values.into_iter().enumerate() {
                for (dc, value) in row.into_iter().enumerate() {
                    let column = super::ColumnRef(left + dc);
                    log.push(CellWrite {
                        range: super::a1::qualified_range(sheet, &column.cell((top + dr + 1) as u32)),
                        value: value.clone(),
                    });
                    put(grid, top + dr, left + dc, Value::String(value));
                }
            }
        }

        self.persist()
    }

    async fn batch_write(&self, writes: Vec<CellWrite>) -> Result<()> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write("channels")?;

        {
            let mut sheets = self.sheets.lock();

            let mut targets = Vec::with_capacity(writes.len());
            for write in &writes {
                let (sheet, cell) = split_qualified(&write.range)
                    .ok_or_else(|| ChantagError::InvalidCellRef(write.range.clone()))?;
                let anchor: CellAnchor = cell.parse()?;
                if !sheets.contains_key(&sheet) {
                    return Err(ChantagError::RemoteWrite(unknown_sheet(&sheet)));
                }
                targets.push((sheet, anchor));
            }

            for ((sheet, anchor), write) in targets.into_iter().zip(&writes) {
                if let Some(grid) = sheets.get_mut(&sheet) {
                    let row = anchor.row.unwrap_or(1) as usize - 1;
                    put(grid, row, anchor.column.index(), Value::String(write.value.clone()));
                }
            }

            self.write_log.lock().extend(writes);
        }

        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn channels() -> MemorySheet {
        MemorySheet::new().with_sheet(
            "Channels",
            vec![
                vec![json!("name"), json!("type"), json!("members"), json!("tags")],
                vec![json!("eng-backend"), json!("public"), json!(""), json!("eng")],
                vec![json!("random"), json!(""), json!("ana,bo")],
            ],
        )
    }

    #[tokio::test]
    async fn test_read_header_and_rows() {
        let sheet = channels();

        let header = sheet.read_range("Channels", "A1:Z1").await.unwrap();
        assert_eq!(header[0].len(), 4);

        let rows = sheet.read_range("Channels", "A2:Z").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![json!("random"), json!(""), json!("ana,bo")]);
        assert_eq!(sheet.read_count(), 2);
    }

    #[tokio::test]
    async fn test_read_trims_trailing_blanks() {
        let sheet = MemorySheet::new().with_sheet(
            "Tags",
            vec![vec![json!("prefix"), json!("")], vec![json!("eng"), Value::Null], vec![]],
        );
        let grid = sheet.read_range("Tags", "A:A").await.unwrap();
        assert_eq!(grid, vec![vec![json!("prefix")], vec![json!("eng")]]);
    }

    #[tokio::test]
    async fn test_unknown_sheet_is_an_error() {
        let err = channels().read_range("Nope", "A1:Z1").await.unwrap_err();
        assert!(matches!(err, ChantagError::RemoteRead(_)));
    }

    #[tokio::test]
    async fn test_write_range_extends_grid() {
        let sheet = MemorySheet::new().with_sheet("Tags", vec![vec![json!("prefix")]]);
        sheet
            .write_range("Tags", "A3", vec![vec!["ops".to_string()], vec!["qa".to_string()]])
            .await
            .unwrap();

        assert_eq!(sheet.cell("Tags", "A3"), "ops");
        assert_eq!(sheet.cell("Tags", "A4"), "qa");
        assert_eq!(sheet.cell("Tags", "A2"), "");
        assert_eq!(sheet.write_log()[0].range, "Tags!A3");
    }

    #[tokio::test]
    async fn test_batch_write_is_all_or_nothing() {
        let sheet = channels();
        let writes = vec![
            CellWrite {
                range: "Channels!D2".to_string(),
                value: "eng, ops".to_string(),
            },
            CellWrite {
                range: "Missing!D3".to_string(),
                value: "x".to_string(),
            },
        ];

        assert!(sheet.batch_write(writes).await.is_err());
        assert_eq!(sheet.cell("Channels", "D2"), "eng");
        assert!(sheet.write_log().is_empty());
    }

    #[tokio::test]
    async fn test_fail_switches() {
        let sheet = channels();
        sheet.set_fail_writes(true);
        let err = sheet
            .batch_write(vec![CellWrite {
                range: "Channels!D2".to_string(),
                value: "x".to_string(),
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, ChantagError::RemoteWrite(_)));
        assert_eq!(sheet.batch_call_count(), 1);

        sheet.set_fail_reads(true);
        assert!(sheet.read_range("Channels", "A1:Z1").await.is_err());
    }

    #[tokio::test]
    async fn test_open_persists_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.json");
        channels().save_fixture(&path).unwrap();

        let sheet = MemorySheet::open(&path).unwrap();
        sheet
            .batch_write(vec![CellWrite {
                range: "Channels!D3".to_string(),
                value: "ops".to_string(),
            }])
            .await
            .unwrap();

        let reopened = MemorySheet::open(&path).unwrap();
        assert_eq!(reopened.cell("Channels", "D3"), "ops");
    }
}
