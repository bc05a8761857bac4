//! Orchestrates rotation, saving, and retention for the live journal.
//!
//! Grounded on the teacher's write-ahead log: a mutex-guarded accumulator
//! plus an explicit, separately-invoked flush step, here split further so
//! the flush itself can be handed off to a blocking-safe worker by the
//! caller (`arena_journal` has no async runtime dependency of its own).

use crate::config::JournalConfig;
use crate::format::{read_durable_journal, write_durable_journal};
use crate::index::{IndexEntry, JournalIndex};
use crate::journal::{Journal, JournalScope};
use crate::metadata::DurableJournal;
use arena_core::{ArenaError, MatchId, SimEvent};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

/// A save ready to be written to disk by the caller, typically inside
/// `tokio::task::spawn_blocking` so the simulation loop never awaits a
/// filesystem call directly.
pub struct PendingSave {
    /// Destination path, already including the `matches/`/`sessions/`
    /// prefix and `.json`/`.json.gz` suffix.
    pub path: PathBuf,
    /// The frozen snapshot to encode.
    pub durable: DurableJournal,
    /// The index row to record once the write succeeds.
    pub index_entry: IndexEntry,
    /// This journal's id, for updating the index.
    pub journal_id: String,
}

/// Coordinates a live [`Journal`], the on-disk index, and rotation rules.
///
/// All methods here are synchronous and perform no I/O except
/// [`JournalManager::load_index`]/[`JournalManager::cleanup`], which the
/// caller is expected to run once at startup off the hot path. The
/// per-tick path ([`JournalManager::record`]) only ever touches memory.
pub struct JournalManager {
    config: JournalConfig,
    current: Mutex<Journal>,
    index: Mutex<JournalIndex>,
    last_saved_len: Mutex<usize>,
}

impl JournalManager {
    /// Opens a fresh session-scoped journal and an empty index. Call
    /// [`JournalManager::load_index`] afterward to pick up any journals
    /// saved by a previous run.
    #[must_use]
    pub fn new(config: JournalConfig, now_ms: u64) -> Self {
        let journal = Journal::new(new_journal_id(now_ms), JournalScope::Session, now_ms);
        Self { config, current: Mutex::new(journal), index: Mutex::new(JournalIndex::new()), last_saved_len: Mutex::new(0) }
    }

    /// Loads the persisted index from `base_dir/index.json`, if present.
    pub fn load_index(&self) -> Result<(), ArenaError> {
        let loaded = JournalIndex::load(&self.config.index_path())?;
        *self.index.lock() = loaded;
        Ok(())
    }

    /// True if journaling is administratively disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.config.disabled
    }

    /// Records one event into the current journal, applying the exclusion
    /// filter, and returns whether the caller should now request a save —
    /// either because the buffer threshold was crossed, or because `event`
    /// is a match boundary requiring rotation.
    ///
    /// Match-boundary ordering: `match:created` rotates to a fresh
    /// match-scoped journal *before* the event is recorded, so the new
    /// match's journal contains its own creation as entry 1. `match:ended`
    /// records first, so the ending match's journal contains both its
    /// creation and its end, and rotation to a new session journal happens
    /// after.
    pub fn record(&self, event: &SimEvent, now_ms: u64) -> Option<PendingSave> {
        if self.config.disabled || self.config.excluded_events.contains(event.kind()) {
            return None;
        }
        if self.config.debug {
            tracing::debug!(event = event.kind(), "journal: recording event");
        }

        match event {
            SimEvent::MatchCreated { match_id, .. } => {
                let rotated = self.rotate(JournalScope::Match(match_id.clone()), now_ms);
                self.current.lock().record(event, now_ms);
                return rotated;
            }
            SimEvent::MatchEnded { .. } => {
                self.current.lock().record(event, now_ms);
                let save = self.snapshot_for_save(now_ms);
                self.rotate(JournalScope::Session, now_ms);
                return save;
            }
            _ => {
                self.current.lock().record(event, now_ms);
            }
        }

        let len = self.current.lock().len() as u64;
        if len >= self.config.max_journal_size {
            let save = self.snapshot_for_save(now_ms);
            let scope = self.current.lock().scope.clone();
            self.rotate(scope, now_ms);
            return save;
        }
        if len - (*self.last_saved_len.lock() as u64) >= self.config.max_buffer_size as u64 {
            return self.snapshot_for_save(now_ms);
        }
        None
    }

    /// Forces a save request for whatever has accumulated since the last
    /// save, regardless of buffer thresholds — used for the periodic
    /// auto-save timer and for graceful shutdown.
    #[must_use]
    pub fn flush(&self, now_ms: u64) -> Option<PendingSave> {
        if self.config.disabled {
            return None;
        }
        self.snapshot_for_save(now_ms)
    }

    fn snapshot_for_save(&self, now_ms: u64) -> Option<PendingSave> {
        let journal = self.current.lock();
        if journal.is_empty() {
            return None;
        }
        let durable = journal.snapshot(journal.len(), now_ms);
        let journal_id = journal.id.clone();
        let relative_path = relative_path_for(&journal.scope, &journal.id, self.config.compress);
        drop(journal);
        *self.last_saved_len.lock() = durable.entries.len();

        let index_entry = IndexEntry {
            path: relative_path.clone(),
            match_id: durable.metadata.match_id.clone(),
            created_at: durable.metadata.created_at,
            duration: durable.metadata.duration,
            event_count: durable.metadata.event_count,
            player_ids: durable.metadata.player_ids.clone(),
            file_size: 0,
            compressed: self.config.compress,
        };

        Some(PendingSave { path: self.config.base_dir.join(&relative_path), durable, index_entry, journal_id })
    }

    /// Swaps in a fresh journal of `scope`, returning a save request for
    /// whatever had accumulated in the outgoing journal (if anything).
    fn rotate(&self, scope: JournalScope, now_ms: u64) -> Option<PendingSave> {
        let save = self.snapshot_for_save(now_ms);
        let mut journal = self.current.lock();
        *journal = Journal::new(new_journal_id(now_ms), scope, now_ms);
        *self.last_saved_len.lock() = 0;
        save
    }

    /// Writes a [`PendingSave`] to disk and updates the index. Intended to
    /// run inside a blocking-safe executor context; performs synchronous
    /// filesystem I/O.
    pub fn commit_save(&self, mut save: PendingSave) -> Result<(), ArenaError> {
        if let Some(parent) = save.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ArenaError::JournalIo(e.to_string()))?;
        }
        let file = fs::File::create(&save.path).map_err(|e| ArenaError::JournalIo(e.to_string()))?;
        write_durable_journal(file, &save.durable, self.config.stream_threshold, self.config.compress)?;

        save.index_entry.file_size = fs::metadata(&save.path).map(|m| m.len()).unwrap_or(0);
        let mut index = self.index.lock();
        index.insert(save.journal_id, save.index_entry);
        index.save(&self.config.index_path())?;
        Ok(())
    }

    /// Reads a previously saved journal back from disk by its index path.
    pub fn load_journal(&self, entry: &IndexEntry) -> Result<DurableJournal, ArenaError> {
        let path = self.config.base_dir.join(&entry.path);
        let file = fs::File::open(&path).map_err(|e| ArenaError::JournalIo(e.to_string()))?;
        read_durable_journal(file, entry.compressed)
    }

    /// Deletes the oldest journals beyond `keep_journals`, removing both
    /// the file and its index row.
    pub fn cleanup(&self) -> Result<(), ArenaError> {
        let mut index = self.index.lock();
        let ids = index.ids_oldest_first();
        if ids.len() <= self.config.keep_journals {
            return Ok(());
        }
        let excess = ids.len() - self.config.keep_journals;
        for id in &ids[..excess] {
            if let Some(entry) = index.remove(id) {
                let path = self.config.base_dir.join(&entry.path);
                if let Err(e) = fs::remove_file(&path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(path = %path.display(), error = %e, "failed to remove retired journal file");
                    }
                }
            }
        }
        index.save(&self.config.index_path())
    }

    /// Read-only access to the index, for HUD/admin queries.
    #[must_use]
    pub fn index_snapshot(&self) -> JournalIndex {
        self.index.lock().clone()
    }
}

fn relative_path_for(scope: &JournalScope, id: &str, compressed: bool) -> PathBuf {
    let dir = match scope {
        JournalScope::Match(_) => "matches",
        JournalScope::Session => "sessions",
    };
    let ext = if compressed { "json.gz" } else { "json" };
    Path::new(dir).join(format!("{id}.{ext}"))
}

fn new_journal_id(now_ms: u64) -> String {
    // ISO-ish timestamp with colons swapped for dashes so the id is also a
    // safe filename stem on every platform.
    let stamp = format_timestamp(now_ms).replace(':', "-");
    format!("{stamp}-{now_ms}")
}

fn format_timestamp(now_ms: u64) -> String {
    let total_seconds = now_ms / 1000;
    let millis = now_ms % 1000;
    let days = total_seconds / 86_400;
    let secs_of_day = total_seconds % 86_400;
    let hours = secs_of_day / 3600;
    let minutes = (secs_of_day % 3600) / 60;
    let seconds = secs_of_day % 60;
    format!("d{days}t{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::{PlayerId, Vec2};

    fn config(base: &Path) -> JournalConfig {
        JournalConfig { base_dir: base.to_path_buf(), compress: false, max_buffer_size: 2, ..JournalConfig::default() }
    }

    #[test]
    fn excluded_events_are_never_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let manager = JournalManager::new(config(dir.path()), 0);
        let save = manager.record(&SimEvent::TickPre { dt: 0.033 }, 0);
        assert!(save.is_none());
        assert_eq!(manager.current.lock().len(), 0);
    }

    #[test]
    fn buffer_threshold_triggers_save_request() {
        let dir = tempfile::tempdir().unwrap();
        let manager = JournalManager::new(config(dir.path()), 0);
        let join = |name: &str| SimEvent::PlayerJoin { player_id: PlayerId::from_string(name), name: name.into(), pos: Vec2::ZERO };
        assert!(manager.record(&join("a"), 0).is_none());
        let save = manager.record(&join("b"), 1);
        assert!(save.is_some(), "second event should cross the max_buffer_size=2 threshold");
    }

    #[test]
    fn match_created_rotates_before_recording() {
        let dir = tempfile::tempdir().unwrap();
        let manager = JournalManager::new(config(dir.path()), 0);
        manager.record(&SimEvent::PlayerJoin { player_id: PlayerId::from_string("a"), name: "A".into(), pos: Vec2::ZERO }, 0);
        let match_id = MatchId::from_string("m1");
        let save = manager.record(&SimEvent::MatchCreated { match_id: match_id.clone(), mode: "ffa".into(), countdown_ms: 5000.0 }, 10);
        assert!(save.is_some(), "rotating out of the session journal should request a save of what it held");
        let current = manager.current.lock();
        assert_eq!(current.scope, JournalScope::Match(match_id));
        assert_eq!(current.len(), 1, "the new match journal should contain only its own creation event");
    }

    #[test]
    fn match_ended_records_before_rotating() {
        let dir = tempfile::tempdir().unwrap();
        let manager = JournalManager::new(config(dir.path()), 0);
        let match_id = MatchId::from_string("m1");
        manager.record(&SimEvent::MatchCreated { match_id: match_id.clone(), mode: "ffa".into(), countdown_ms: 5000.0 }, 0);
        let save = manager.record(&SimEvent::MatchEnded { match_id: match_id.clone(), at: 100 }, 100);
        let save = save.expect("match:ended should always request a save");
        assert_eq!(save.durable.entries.len(), 2, "ending match's journal keeps both its creation and its end event");
        assert_eq!(manager.current.lock().scope, JournalScope::Session);
    }

    #[test]
    fn save_and_reload_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let manager = JournalManager::new(config(dir.path()), 0);
        manager.record(&SimEvent::PlayerJoin { player_id: PlayerId::from_string("a"), name: "A".into(), pos: Vec2::ZERO }, 0);
        let save = manager.flush(50).expect("non-empty journal should flush");
        let entry = save.index_entry.clone();
        manager.commit_save(save).unwrap();

        let restored = manager.load_journal(&entry).unwrap();
        assert_eq!(restored.entries.len(), 1);
        assert_eq!(restored.metadata.player_ids, vec![PlayerId::from_string("a")]);
    }

    #[test]
    fn cleanup_retires_oldest_journals_beyond_keep_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.keep_journals = 1;
        let manager = JournalManager::new(cfg, 0);
        for i in 0..3u64 {
            manager.record(&SimEvent::PlayerJoin { player_id: PlayerId::from_string("a"), name: "A".into(), pos: Vec2::ZERO }, i * 1000);
            let save = manager.flush(i * 1000 + 1).unwrap();
            manager.commit_save(save).unwrap();
            manager.rotate(JournalScope::Session, i * 1000 + 2);
        }
        manager.cleanup().unwrap();
        assert_eq!(manager.index_snapshot().len(), 1);
    }
}
