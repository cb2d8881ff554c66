use std::fs;
use std::path::{Path, PathBuf};

use super::entry::HistoryEntry;
use super::error::HistoryError;

/// Append-only history log persisted as one pretty-printed JSON document.
///
/// The in-memory sequence is a cache of the file: it is read once when the
/// store is opened and the file is rewritten in full on every mutation.
/// Entries are kept in chronological (append) order; any translation from a
/// most-recent-first display order is the caller's job. No locking is done,
/// so concurrent external writers would race.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Opens the store backed by `path` and loads any persisted entries.
    ///
    /// A missing file yields an empty store. A malformed file also yields an
    /// empty store, with a warning; the bytes on disk are left untouched
    /// until the next successful save overwrites them.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self { path, entries }
    }

    /// Default history file for a named UI variant, under the user data
    /// directory.
    pub fn default_path(namespace: &str) -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(
            home.join(".local")
                .join("share")
                .join("llm-fanout")
                .join(format!("{namespace}.json")),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in chronological order, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends one entry and persists the full sequence.
    ///
    /// The in-memory append is not rolled back when the write fails; the
    /// error is advisory and the states reconverge on the next successful
    /// save.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.push(entry);
        self.persist()
    }

    /// Removes one result from one entry, then re-persists.
    ///
    /// Indices are chronological storage order. An entry whose last result
    /// is removed is removed itself. Out-of-range indices are a guarded
    /// no-op returning `Ok(false)`.
    pub fn delete_result(
        &mut self,
        entry_index: usize,
        result_index: usize,
    ) -> Result<bool, HistoryError> {
        let Some(entry) = self.entries.get_mut(entry_index) else {
            return Ok(false);
        };
        if result_index >= entry.responses.len() {
            return Ok(false);
        }

        entry.responses.remove(result_index);
        if entry.responses.is_empty() {
            self.entries.remove(entry_index);
        }

        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Vec<HistoryEntry> {
    if !path.exists() {
        return Vec::new();
    }
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            log::warn!("could not read history file {}: {err}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_slice(&data) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!(
                "malformed history file {}, starting empty: {err}",
                path.display()
            );
            Vec::new()
        }
    }
}
