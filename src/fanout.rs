//! Concurrent fan-out of one prompt to many models.

use std::sync::Arc;

use futures::future::join_all;

use crate::ollama::GenerateProvider;
use crate::result::ModelResult;

/// Runs one generation request per selected model concurrently and returns
/// the results in selection order.
///
/// Each call launches its own set of futures; nothing is pooled or reused
/// across calls, and no future outlives the call. A failing model yields a
/// failure-tagged [`ModelResult`] in its slot and leaves every other model
/// untouched. There is no cancellation: `run_all` resolves once every
/// dispatched request has completed.
pub struct FanOutCoordinator {
    provider: Arc<dyn GenerateProvider>,
}

impl FanOutCoordinator {
    pub fn new(provider: Arc<dyn GenerateProvider>) -> Self {
        Self { provider }
    }

    /// Queries every model in `models` concurrently with `prompt`.
    ///
    /// Results are reassembled by input position, so the output has exactly
    /// one result per input slot in the same order, even when the same model
    /// identifier was selected more than once. An empty selection or a blank
    /// prompt (both rejected upstream) yields an empty sequence rather than
    /// a fault.
    pub async fn run_all(&self, prompt: &str, models: &[String]) -> Vec<ModelResult> {
        if models.is_empty() || prompt.trim().is_empty() {
            return Vec::new();
        }

        let futures = models.iter().enumerate().map(|(slot, model)| {
            let provider = self.provider.clone();
            async move { (slot, provider.query(model, prompt).await) }
        });

        let mut slots: Vec<Option<ModelResult>> = (0..models.len()).map(|_| None).collect();
        for (slot, result) in join_all(futures).await {
            slots[slot] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }
}
