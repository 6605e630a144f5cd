//! One editing session over a spreadsheet.
//!
//! A [`Session`] owns every piece of state an editor needs (loaded records,
//! the tag catalog, staged edits, listing criteria) and the collaborators that
//! fill it. Errors from remote calls are shown through the [`Notifier`] and
//! returned marked as [reported](ChantagError::reported), so callers can tell
//! they need no further display.

use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::cache::CacheStore;
use crate::config::{Config, SheetNames};
use crate::error::{ChantagError, Result};
use crate::notify::{Notifier, ToastLevel};
use crate::pending::PendingEdits;
use crate::query::{FilterState, RecordView, compute_view};
use crate::reconcile::{Reconciler, SaveContext, SaveOutcome, SaveState};
use crate::records::RecordStore;
use crate::remote::{AuthGate, SheetSource};
use crate::stats::Statistics;
use crate::tags::{TagCatalog, TagDirectory, filter_list_order, picker_order};
use crate::types::{Record, RowId, normalize_tag};

pub const REFRESH_PROMPT: &str = "You have unsaved changes. Refresh will discard them. Continue?";

pub struct Session {
    auth: Arc<dyn AuthProvider>,
    notifier: Arc<dyn Notifier>,
    cache: CacheStore,
    tags: TagDirectory,
    records: RecordStore,
    catalog: TagCatalog,
    pending: PendingEdits,
    filters: FilterState,
    stats: Statistics,
    reconciler: Reconciler,
}

impl Session {
    /// Every remote call made by the session is gated on `auth`.
    pub fn new(
        remote: Arc<dyn SheetSource>,
        auth: Arc<dyn AuthProvider>,
        cache: CacheStore,
        notifier: Arc<dyn Notifier>,
        sheets: &SheetNames,
    ) -> Self {
        let remote: Arc<dyn SheetSource> = Arc::new(AuthGate::new(remote, auth.clone()));
        Self {
            tags: TagDirectory::new(remote.clone(), cache.clone(), sheets.tags.clone()),
            records: RecordStore::new(remote, cache.clone(), sheets.main.clone()),
            auth,
            notifier,
            cache,
            catalog: TagCatalog::default(),
            pending: PendingEdits::new(),
            filters: FilterState::default(),
            stats: Statistics::default(),
            reconciler: Reconciler::new(),
        }
    }

    pub fn from_config(
        config: &Config,
        remote: Arc<dyn SheetSource>,
        auth: Arc<dyn AuthProvider>,
        cache: CacheStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut session = Self::new(remote, auth, cache, notifier, &config.sheets);
        session.filters = FilterState::with_page_size(config.page_size);
        session
    }

    fn report(&self, prefix: &str, err: ChantagError) -> ChantagError {
        if !err.is_reported() {
            self.notifier
                .notify(ToastLevel::Error, &format!("{prefix}: {err}"));
        }
        err.reported()
    }

    /// Load tags then records, cache first. Pending edits are dropped.
    pub async fn load(&mut self) -> Result<()> {
        match self.load_inner().await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.report("Failed to load data", e)),
        }
    }

    async fn load_inner(&mut self) -> Result<()> {
        // Nothing is replaced until both reads succeed.
        let catalog = self.tags.load_all().await?;
        self.records.load_all().await?;
        self.catalog = catalog;
        self.pending.discard_all();
        self.recompute_statistics();
        tracing::debug!(
            "Session loaded {} records and {} tags",
            self.records.records().len(),
            self.catalog.len()
        );
        Ok(())
    }

    fn recompute_statistics(&mut self) {
        self.stats = Statistics::compute(self.records.records(), &self.pending, &self.catalog);
    }

    /// Drop the cache and reload. Asks first when edits are pending.
    ///
    /// Returns `false` when the user declined.
    pub async fn refresh(&mut self) -> Result<bool> {
        if !self.pending.is_empty() && !self.notifier.confirm(REFRESH_PROMPT) {
            return Ok(false);
        }
        self.pending.discard_all();
        self.cache.clear_all();
        self.load().await?;
        self.notifier.notify(ToastLevel::Success, "Data refreshed");
        Ok(true)
    }

    /// Drop every pending edit, after confirmation.
    pub fn discard(&mut self) -> bool {
        let count = self.pending.count();
        if count == 0 {
            return false;
        }
        let prompt = format!("Discard {count} unsaved change(s)?");
        if !self.notifier.confirm(&prompt) {
            return false;
        }
        self.pending.discard_all();
        self.recompute_statistics();
        self.notifier.notify(ToastLevel::Info, "Changes discarded");
        true
    }

    /// Stage adding or removing `tag` on `row_id`. Returns the new effective tags.
    ///
    /// `tag` is trimmed; blank tags and tags containing a comma are rejected.
    pub fn toggle_tag(&mut self, row_id: RowId, tag: &str) -> Result<&[String]> {
        let record = self
            .records
            .get(row_id)
            .ok_or(ChantagError::RowNotFound(row_id))?;
        let tag = normalize_tag(tag).ok_or_else(|| ChantagError::InvalidTag(tag.to_string()))?;
        self.pending.toggle(record, tag);
        self.recompute_statistics();
        Ok(self.pending.get(row_id).unwrap_or_default())
    }

    /// Write pending edits through the reconciler and report the result.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let outcome = self
            .reconciler
            .save(SaveContext {
                pending: &mut self.pending,
                records: &mut self.records,
                tags: &self.tags,
                cache: &self.cache,
            })
            .await;

        match outcome {
            Ok(SaveOutcome::NothingToDo) => {
                self.notifier.notify(ToastLevel::Info, "No changes to save");
                Ok(SaveOutcome::NothingToDo)
            }
            Ok(SaveOutcome::Saved { count, added_tags }) => {
                let noun = if count == 1 { "channel" } else { "channels" };
                self.notifier
                    .notify(ToastLevel::Success, &format!("Saved {count} {noun}"));
                self.reload_catalog().await;
                self.recompute_statistics();
                Ok(SaveOutcome::Saved { count, added_tags })
            }
            Err(e) => Err(self.report("Failed to save", e)),
        }
    }

    /// Re-read the catalog after a save. Failure keeps the old one.
    async fn reload_catalog(&mut self) {
        match self.tags.load_all().await {
            Ok(catalog) => self.catalog = catalog,
            Err(e) => tracing::warn!("Could not reload tags after save: {e}"),
        }
    }

    /// Sign out, clearing the cache and everything loaded.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.auth.sign_out().await?;
        self.cache.clear_all();
        self.records.clear();
        self.pending.discard_all();
        self.catalog = TagCatalog::default();
        self.stats = Statistics::default();
        self.reconciler.reset();
        self.notifier.notify(ToastLevel::Info, "Signed out");
        Ok(())
    }

    pub fn view(&self) -> RecordView<'_> {
        compute_view(self.records.records(), &self.pending, &self.filters)
    }

    /// Candidate tags for one row's picker, selected first.
    pub fn picker_for(&self, row_id: RowId, query: &str) -> Result<Vec<&str>> {
        let record = self
            .records
            .get(row_id)
            .ok_or(ChantagError::RowNotFound(row_id))?;
        let current = self.pending.effective_tags(record);
        Ok(picker_order(&self.catalog.tags, current, query, |t| {
            self.stats.usage(t)
        }))
    }

    /// Catalog tags for the filter list, most used first.
    pub fn filter_tags(&self, query: &str) -> Vec<&str> {
        filter_list_order(&self.catalog.tags, query, |t| self.stats.usage(t))
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn records(&self) -> &[Record] {
        self.records.records()
    }

    pub fn record(&self, row_id: RowId) -> Option<&Record> {
        self.records.get(row_id)
    }

    pub fn effective_tags<'a>(&'a self, record: &'a Record) -> &'a [String] {
        self.pending.effective_tags(record)
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn pending(&self) -> &PendingEdits {
        &self.pending
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn save_state(&self) -> &SaveState {
        self.reconciler.state()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenAuth;
    use crate::notify::RecordingNotifier;
    use crate::remote::MemorySheet;
    use serde_json::json;
    use std::time::Duration;

    fn sheet() -> Arc<MemorySheet> {
        Arc::new(
            MemorySheet::new()
                .with_sheet(
                    "Channels",
                    vec![
                        vec![json!("Name"), json!("Type"), json!("Tags")],
                        vec![json!("general"), json!(""), json!("")],
                        vec![json!("random"), json!("private"), json!("eng")],
                    ],
                )
                .with_sheet("Tags", vec![vec![json!("Prefix")], vec![json!("eng")]]),
        )
    }

    fn session(
        sheet: Arc<MemorySheet>,
        auth: TokenAuth,
        notifier: Arc<RecordingNotifier>,
    ) -> Session {
        Session::new(
            sheet,
            Arc::new(auth),
            CacheStore::in_memory(Duration::from_secs(300)),
            notifier,
            &SheetNames::default(),
        )
    }

    #[tokio::test]
    async fn test_load_reads_tags_column_from_header() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut s = session(sheet(), TokenAuth::signed_in("t"), notifier);
        s.load().await.unwrap();

        assert_eq!(s.records().len(), 2);
        assert_eq!(s.record(3).unwrap().tags, vec!["eng"]);
        assert_eq!(s.statistics().untagged_count, 1);
    }

    #[tokio::test]
    async fn test_load_signed_out_notifies() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut s = session(sheet(), TokenAuth::signed_out(), notifier.clone());

        let err = s.load().await.unwrap_err();
        assert!(err.is_reported());
        assert!(matches!(err.root(), ChantagError::AuthRequired));
        let (level, message) = notifier.last().unwrap();
        assert_eq!(level, ToastLevel::Error);
        assert!(message.starts_with("Failed to load data: "));
    }

    #[tokio::test]
    async fn test_toggle_unknown_row() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut s = session(sheet(), TokenAuth::signed_in("t"), notifier);
        s.load().await.unwrap();

        assert!(matches!(
            s.toggle_tag(99, "eng"),
            Err(ChantagError::RowNotFound(99))
        ));
        assert_eq!(s.toggle_tag(2, "eng").unwrap(), &["eng"]);
    }

    #[tokio::test]
    async fn test_toggle_rejects_blank_and_comma_tags() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut s = session(sheet(), TokenAuth::signed_in("t"), notifier);
        s.load().await.unwrap();

        assert!(matches!(s.toggle_tag(2, "a,b"), Err(ChantagError::InvalidTag(_))));
        assert!(matches!(s.toggle_tag(2, "   "), Err(ChantagError::InvalidTag(_))));
        assert!(s.pending().is_empty());

        assert_eq!(s.toggle_tag(2, "  ops ").unwrap(), &["ops"]);
    }

    #[tokio::test]
    async fn test_usage_counts_follow_staged_edits() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut s = session(sheet(), TokenAuth::signed_in("t"), notifier);
        s.load().await.unwrap();
        assert_eq!(s.statistics().usage("eng"), 1);

        s.toggle_tag(2, "eng").unwrap();
        assert_eq!(s.statistics().usage("eng"), 2);
        assert_eq!(s.statistics().untagged_count, 0);

        assert!(s.discard());
        assert_eq!(s.statistics().usage("eng"), 1);
    }

    #[tokio::test]
    async fn test_picker_puts_selected_first() {
        let sheet = sheet();
        sheet.set_grid(
            "Tags",
            vec![vec![json!("prefix")], vec![json!("ads")], vec![json!("eng")]],
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut s = session(sheet, TokenAuth::signed_in("t"), notifier);
        s.load().await.unwrap();

        assert_eq!(s.picker_for(2, "").unwrap(), vec!["eng", "ads"]);
        s.toggle_tag(2, "ads").unwrap();
        assert_eq!(s.picker_for(2, "").unwrap(), vec!["ads", "eng"]);
        assert_eq!(s.filter_tags("E"), vec!["eng"]);
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut s = session(sheet(), TokenAuth::signed_in("t"), notifier);
        s.load().await.unwrap();
        s.toggle_tag(2, "eng").unwrap();

        s.sign_out().await.unwrap();

        assert!(s.records().is_empty());
        assert!(s.pending().is_empty());
        assert!(s.cache().entries().is_empty());
        assert!(s.load().await.is_err());
    }
}
