//! The save flow: staged edits to the sheet, then into the local store.
//!
//! ```text
//! Idle -> Saving -> Succeeded | Failed -> Idle
//! ```
//!
//! Local state changes only after the batch write is confirmed. A failed
//! write leaves the pending edits exactly as they were so the user can retry.

use serde::Serialize;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::pending::PendingEdits;
use crate::records::RecordStore;
use crate::tags::TagDirectory;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Succeeded {
        saved: usize,
    },
    Failed {
        message: String,
    },
}

impl SaveState {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveState::Saving)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    NothingToDo,
    Saved { count: usize, added_tags: Vec<String> },
}

/// Returns the state to `Idle` if a save is abandoned mid-flight.
struct SavingGuard<'a>(&'a mut SaveState);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if self.0.is_saving() {
            tracing::warn!("Save abandoned before completion");
            *self.0 = SaveState::Idle;
        }
    }
}

/// Everything a save touches.
pub struct SaveContext<'a> {
    pub pending: &'a mut PendingEdits,
    pub records: &'a mut RecordStore,
    pub tags: &'a TagDirectory,
    pub cache: &'a CacheStore,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    state: SaveState,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    /// Acknowledge a finished save.
    pub fn reset(&mut self) {
        if !self.state.is_saving() {
            self.state = SaveState::Idle;
        }
    }

    /// Flush every pending edit in one batch write.
    ///
    /// Registering new tags is best effort: a failure there is logged and
    /// the rows are still written.
    pub async fn save(&mut self, ctx: SaveContext<'_>) -> Result<SaveOutcome> {
        if ctx.pending.is_empty() {
            self.state = SaveState::Idle;
            return Ok(SaveOutcome::NothingToDo);
        }

        let guard = SavingGuard(&mut self.state);
        *guard.0 = SaveState::Saving;

        let changes = ctx.pending.changes();
        let union = ctx.pending.union_tags();
        tracing::info!(
            "Saving {} row(s) referencing {} tag(s)",
            changes.len(),
            union.len()
        );

        let added_tags = match ctx.tags.ensure_exist(&union).await {
            Ok(outcome) => outcome.added_tags,
            Err(e) => {
                tracing::warn!("Could not register new tags, saving rows anyway: {e}");
                Vec::new()
            }
        };

        if let Err(e) = ctx.records.write_tags(&changes).await {
            tracing::warn!("Batch write failed, keeping {} pending edit(s): {e}", changes.len());
            *guard.0 = SaveState::Failed {
                message: e.to_string(),
            };
            return Err(e);
        }

        ctx.cache.clear_all();
        let missing = ctx.records.apply_changes(&changes);
        if !missing.is_empty() {
            tracing::warn!("Saved rows missing from the local store: {missing:?}");
        }
        ctx.pending.discard_all();

        *guard.0 = SaveState::Succeeded {
            saved: changes.len(),
        };
        tracing::info!("Saved {} row(s)", changes.len());

        Ok(SaveOutcome::Saved {
            count: changes.len(),
            added_tags,
        })
    }
}
