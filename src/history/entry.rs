use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::ModelResult;

/// One conversation turn: the submitted prompt plus one result per model, in
/// the order the models were selected.
///
/// An entry never holds an empty `responses` sequence; deleting the last
/// result deletes the entry itself (enforced by the store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub prompt: String,
    pub responses: Vec<ModelResult>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(prompt: impl Into<String>, responses: Vec<ModelResult>) -> Self {
        Self {
            prompt: prompt.into(),
            responses,
            created_at: Utc::now(),
        }
    }
}
