pub mod auth;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod macros;
pub mod notify;
pub mod paths;
pub mod pending;
pub mod query;
pub mod reconcile;
pub mod records;
pub mod remote;
pub mod session;
pub mod stats;
pub mod suggest;
pub mod tags;
pub mod types;

pub use auth::{AuthProvider, TokenAuth};
pub use cache::{CacheBackend, CacheStore, FileBackend, MemoryBackend};
pub use config::Config;
pub use error::{ChantagError, Result};
pub use notify::{ConsoleNotifier, Notifier, RecordingNotifier, ToastLevel};
pub use pending::PendingEdits;
pub use query::{FilterState, RecordView, SortDirection, SortField, compute_view};
pub use reconcile::{Reconciler, SaveOutcome, SaveState};
pub use records::RecordStore;
pub use remote::{MemorySheet, SheetSource, SheetsClient};
pub use session::Session;
pub use stats::Statistics;
pub use tags::{TagCatalog, TagDirectory};
pub use types::{Record, RowId, TagChange};
