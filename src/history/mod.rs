//! Persisted, append-only log of past fan-out runs.

mod entry;
mod error;
mod store;

pub use entry::HistoryEntry;
pub use error::HistoryError;
pub use store::HistoryStore;
