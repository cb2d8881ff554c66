use serde::{Deserialize, Serialize};

/// What querying one model produced: a generated answer with its metrics, or
/// a captured failure.
///
/// The tag keeps success and failure on separate channels so a consumer can
/// pattern-match instead of sniffing the response text for an error marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Success {
        /// Wall-clock seconds for the round trip, rounded to hundredths.
        duration: f64,
        /// Generated token count.
        eval_count: u64,
        /// Tokens per second.
        eval_rate: f64,
        /// The generated text.
        text: String,
    },
    Failure {
        /// Human-readable description of what went wrong.
        reason: String,
    },
}

/// Outcome of querying one model for one prompt.
///
/// Created exactly once per call by the client and immutable afterwards. The
/// `model` field always equals the identifier that was requested, on failure
/// too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model: String,
    #[serde(flatten)]
    pub outcome: ModelOutcome,
}

impl ModelResult {
    pub fn success(
        model: impl Into<String>,
        duration: f64,
        eval_count: u64,
        eval_rate: f64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            outcome: ModelOutcome::Success {
                duration,
                eval_count,
                eval_rate,
                text: text.into(),
            },
        }
    }

    pub fn failure(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            outcome: ModelOutcome::Failure {
                reason: reason.into(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ModelOutcome::Failure { .. })
    }

    /// Round-trip duration in seconds; `0.0` for a failed call.
    pub fn duration(&self) -> f64 {
        match &self.outcome {
            ModelOutcome::Success { duration, .. } => *duration,
            ModelOutcome::Failure { .. } => 0.0,
        }
    }

    /// Generated token count; `0` for a failed call.
    pub fn eval_count(&self) -> u64 {
        match &self.outcome {
            ModelOutcome::Success { eval_count, .. } => *eval_count,
            ModelOutcome::Failure { .. } => 0,
        }
    }

    /// Tokens per second; `0.0` for a failed call.
    pub fn eval_rate(&self) -> f64 {
        match &self.outcome {
            ModelOutcome::Success { eval_rate, .. } => *eval_rate,
            ModelOutcome::Failure { .. } => 0.0,
        }
    }

    /// Text for display: the answer itself, or an `Error:`-marked description
    /// when the call failed.
    pub fn display_text(&self) -> String {
        match &self.outcome {
            ModelOutcome::Success { text, .. } => text.clone(),
            ModelOutcome::Failure { reason } => format!("Error: {reason}"),
        }
    }
}

/// Tokens per second from a count and a duration, rounded to hundredths.
/// Zero duration (the failure sentinel) yields a zero rate.
pub(crate) fn derive_eval_rate(eval_count: u64, duration: f64) -> f64 {
    if duration > 0.0 {
        round_hundredths(eval_count as f64 / duration)
    } else {
        0.0
    }
}

pub(crate) fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
