//! Remote tabular storage.
//!
//! The app reads and writes two sheets of a spreadsheet through the
//! [`SheetSource`] trait. [`sheets::SheetsClient`] talks to the Google Sheets
//! REST API; [`memory::MemorySheet`] keeps grids in process for tests and
//! offline runs. [`AuthGate`] wraps either one so that no call leaves the
//! process unless the user is signed in.

pub mod a1;
pub mod error;
pub mod memory;
pub mod sheets;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthProvider;
use crate::error::{ChantagError, Result};
use crate::types::RowId;

pub use a1::{CellRange, ColumnRef};
pub use error::{ApiError, Direction};
pub use memory::MemorySheet;
pub use sheets::SheetsClient;

/// Rows of cells as returned by a range read. Rows may be ragged; trailing
/// empty cells and rows are omitted.
pub type Grid = Vec<Vec<Value>>;

/// One single-cell write in a batch. `range` is sheet-qualified, e.g. `Channels!D5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWrite {
    pub range: String,
    pub value: String,
}

/// A remote spreadsheet addressed by sheet name and A1 range.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Read `range` of `sheet` as unformatted values.
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Grid>;

    /// Write a rectangular block of raw values anchored at `cell`.
    async fn write_range(&self, sheet: &str, cell: &str, values: Vec<Vec<String>>) -> Result<()>;

    /// Write many single cells in one call. Either all land or none do.
    async fn batch_write(&self, writes: Vec<CellWrite>) -> Result<()>;

    /// Write `values` as whole rows starting at column `A` of `start_row`.
    async fn append_rows(&self, sheet: &str, start_row: RowId, values: Vec<Vec<String>>) -> Result<()> {
        self.write_range(sheet, &ColumnRef(0).cell(start_row), values).await
    }
}

/// Text of a cell. Missing and null cells read as empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "TRUE".to_string(),
        Some(Value::Bool(false)) => "FALSE".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Trimmed text of cell `index` in `row`.
pub fn cell_at(row: &[Value], index: usize) -> String {
    cell_text(row.get(index)).trim().to_string()
}

/// Header row text from a header read, trimmed.
pub fn header_text(grid: &Grid) -> Vec<String> {
    grid.first()
        .map(|row| (0..row.len()).map(|i| cell_at(row, i)).collect())
        .unwrap_or_default()
}

/// Refuses every call while signed out, then delegates.
pub struct AuthGate {
    inner: Arc<dyn SheetSource>,
    auth: Arc<dyn AuthProvider>,
}

impl AuthGate {
    pub fn new(inner: Arc<dyn SheetSource>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { inner, auth }
    }

    fn check(&self) -> Result<()> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            Err(ChantagError::AuthRequired)
        }
    }
}

#[async_trait]
impl SheetSource for AuthGate {
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Grid> {
        self.check()?;
        self.inner.read_range(sheet, range).await
    }

    async fn write_range(&self, sheet: &str, cell: &str, values: Vec<Vec<String>>) -> Result<()> {
        self.check()?;
        self.inner.write_range(sheet, cell, values).await
    }

    async fn batch_write(&self, writes: Vec<CellWrite>) -> Result<()> {
        self.check()?;
        self.inner.batch_write(writes).await
    }
}

/// HTTP classification used by the retry loop.
pub trait AsHttpError {
    fn as_http_error(&self) -> Option<(reqwest::StatusCode, Option<u64>)>;

    /// Worth retrying: server errors and requests that never completed.
    fn is_transient(&self) -> bool;

    fn is_rate_limited(&self) -> bool;

    fn get_retry_after(&self) -> Option<Duration> {
        match self.as_http_error() {
            Some((status, retry_after)) if status.as_u16() == 429 => {
                Some(Duration::from_secs(retry_after.unwrap_or(60)))
            }
            _ => None,
        }
    }
}

/// Attempts and backoff for remote calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Longest wait honoured from a Retry-After header before giving up.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_wait: Duration::from_secs(10),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
///
/// Transient failures back off exponentially from `base_delay`. Rate-limited
/// failures wait for the server's Retry-After when it is within `max_wait`,
/// otherwise the error is returned straight away.
pub async fn execute_with_retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> std::result::Result<T, E>
where
    E: AsHttpError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= policy.max_attempts {
            return Err(err);
        }

        let wait = if let Some(retry_after) = err.get_retry_after() {
            if retry_after > policy.max_wait {
                return Err(err);
            }
            retry_after
        } else if err.is_transient() {
            policy.base_delay * 2u32.saturating_pow(attempt - 1)
        } else {
            return Err(err);
        };

        tracing::debug!("Attempt {attempt} failed ({err}), retrying in {wait:?}");
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}
