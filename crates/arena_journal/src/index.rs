//! The in-memory index of every saved journal (spec §4.12 "index maps
//! journal id -> {path, matchId?, createdAt, duration, eventCount,
//! playerIds, fileSize, compressed}").

use crate::error::{JournalError, JournalResult};
use arena_core::{MatchId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One journal's entry in the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Path to the journal file, relative to the journal base directory.
    pub path: PathBuf,
    /// The match this journal is scoped to, if any.
    pub match_id: Option<MatchId>,
    /// When the journal was opened, epoch milliseconds.
    pub created_at: u64,
    /// Wall-clock span covered, milliseconds, as of the last save.
    pub duration: u64,
    /// Entry count as of the last save.
    pub event_count: u64,
    /// Every distinct player id seen in the journal as of the last save.
    pub player_ids: Vec<PlayerId>,
    /// Size of the saved file in bytes.
    pub file_size: u64,
    /// Whether the file is gzip-compressed.
    pub compressed: bool,
}

/// The full index, keyed by journal id. Rewritten to disk after every save
/// or delete (spec §4.12).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JournalIndex {
    journals: BTreeMap<String, IndexEntry>,
}

impl JournalIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the index from `path`. A missing file is treated as an empty
    /// index (first run); a malformed file is an error.
    pub fn load(path: &Path) -> JournalResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| JournalError::MalformedJournal(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(JournalError::JournalIo(e.to_string())),
        }
    }

    /// Rewrites the index to `path`.
    pub fn save(&self, path: &Path) -> JournalResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| JournalError::MalformedJournal(e.to_string()))?;
        fs::write(path, json).map_err(|e| JournalError::JournalIo(e.to_string()))
    }

    /// Inserts or replaces the entry for `journal_id`.
    pub fn insert(&mut self, journal_id: String, entry: IndexEntry) {
        self.journals.insert(journal_id, entry);
    }

    /// Removes the entry for `journal_id`, if present.
    pub fn remove(&mut self, journal_id: &str) -> Option<IndexEntry> {
        self.journals.remove(journal_id)
    }

    /// Looks up a journal by id.
    #[must_use]
    pub fn get(&self, journal_id: &str) -> Option<&IndexEntry> {
        self.journals.get(journal_id)
    }

    /// Every indexed journal id, oldest-created first.
    #[must_use]
    pub fn ids_oldest_first(&self) -> Vec<String> {
        let mut ids: Vec<&String> = self.journals.keys().collect();
        ids.sort_by_key(|id| self.journals[*id].created_at);
        ids.into_iter().cloned().collect()
    }

    /// Number of indexed journals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.journals.len()
    }

    /// True if the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.journals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(created_at: u64) -> IndexEntry {
        IndexEntry {
            path: PathBuf::from("sessions/x.json"),
            match_id: None,
            created_at,
            duration: 0,
            event_count: 0,
            player_ids: Vec::new(),
            file_size: 0,
            compressed: false,
        }
    }

    #[test]
    fn ids_oldest_first_sorts_by_created_at() {
        let mut index = JournalIndex::new();
        index.insert("b".to_string(), entry(200));
        index.insert("a".to_string(), entry(100));
        assert_eq!(index.ids_oldest_first(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let index = JournalIndex::load(Path::new("/nonexistent/index.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = JournalIndex::new();
        index.insert("a".to_string(), entry(100));
        index.save(&path).unwrap();
        let restored = JournalIndex::load(&path).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get("a").unwrap().created_at, 100);
    }
}
