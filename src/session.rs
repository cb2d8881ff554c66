//! Orchestration over the fan-out coordinator and the history store.
//!
//! A [`Session`] is owned by a single-threaded presentation layer: it
//! validates input, runs the fan-out, records the outcome as one history
//! entry, and translates display-order indices into storage-order indices
//! for deletion.

use crate::error::ClientError;
use crate::fanout::FanOutCoordinator;
use crate::history::{HistoryEntry, HistoryError, HistoryStore};

pub struct Session {
    coordinator: FanOutCoordinator,
    history: HistoryStore,
}

impl Session {
    pub fn new(coordinator: FanOutCoordinator, history: HistoryStore) -> Self {
        Self {
            coordinator,
            history,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// History entries in display order, most recent first.
    pub fn displayed(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.entries().iter().rev()
    }

    /// Runs `prompt` against every selected model and records the outcome as
    /// one new history entry.
    ///
    /// An empty selection or a blank prompt is rejected before anything is
    /// dispatched. A persistence failure is advisory: the entry stays in
    /// memory, a warning is logged, and the run still succeeds.
    pub async fn submit(
        &mut self,
        prompt: &str,
        models: &[String],
    ) -> Result<HistoryEntry, ClientError> {
        if prompt.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if models.is_empty() {
            return Err(ClientError::InvalidRequest(
                "at least one model must be selected".to_string(),
            ));
        }

        let responses = self.coordinator.run_all(prompt, models).await;
        let entry = HistoryEntry::new(prompt, responses);

        if let Err(err) = self.history.append(entry.clone()) {
            log::warn!("could not persist history entry: {err}");
        }

        Ok(entry)
    }

    /// Deletes one result addressed in display order (entry 0 is the most
    /// recent run).
    ///
    /// The store itself is chronological, so the display index is mapped to
    /// `len - 1 - display_index` before delegating. Stale indices are a
    /// no-op returning `Ok(false)`.
    pub fn delete_displayed(
        &mut self,
        display_index: usize,
        result_index: usize,
    ) -> Result<bool, HistoryError> {
        let len = self.history.len();
        if display_index >= len {
            return Ok(false);
        }
        let entry_index = len - 1 - display_index;
        self.history.delete_result(entry_index, result_index)
    }
}
