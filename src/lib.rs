//! llm-fanout is a small library for comparing local text-generation models.
//!
//! One prompt is fanned out to several independently selected models served
//! by an Ollama-compatible inference service. Each model is queried
//! concurrently, each result (success or failure) is captured on its own,
//! and the results come back in the order the models were selected, not the
//! order they finished. Completed runs are recorded in an append-only
//! history that is persisted to disk as a single JSON document.
//!
//! The pieces:
//!
//! - [`OllamaClient`] issues one non-streaming generation request, measures
//!   latency, and derives token throughput.
//! - [`FanOutCoordinator`] runs one query per selected model concurrently
//!   and reassembles the results by input position.
//! - [`HistoryStore`] keeps the persisted log of past runs and supports
//!   deleting individual results.
//! - [`Session`] ties the two together for a single-threaded presentation
//!   layer.
//!
//! ```no_run
//! use llm_fanout::{FanOutCoordinator, HistoryStore, OllamaClient, Session};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let client = OllamaClient::new(None, None, false);
//! let coordinator = FanOutCoordinator::new(Arc::new(client));
//! let history = HistoryStore::open("history.json");
//! let mut session = Session::new(coordinator, history);
//!
//! let models = vec!["llama3.2".to_string(), "mistral".to_string()];
//! let entry = session.submit("Why is the sky blue?", &models).await.unwrap();
//! for result in &entry.responses {
//!     println!("{}: {}", result.model, result.display_text());
//! }
//! # }
//! ```

pub mod error;
pub mod fanout;
pub mod history;
pub mod ollama;
pub mod result;
pub mod session;

pub use error::ClientError;
pub use fanout::FanOutCoordinator;
pub use history::{HistoryEntry, HistoryError, HistoryStore};
pub use ollama::{GenerateProvider, OllamaClient, OllamaConfig};
pub use result::{ModelOutcome, ModelResult};
pub use session::Session;
