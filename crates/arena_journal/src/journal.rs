//! The in-memory journal: the live accumulator a [`crate::manager::JournalManager`]
//! appends into between saves.

use crate::entry::JournalEntry;
use crate::metadata::{DurableJournal, JournalMetadata, JOURNAL_FORMAT_VERSION};
use arena_core::{MatchId, PlayerId, SimEvent};
use std::collections::{HashMap, HashSet};

/// What a journal is scoped to: a single match, or the inter-match gap
/// between two matches ("session" in spec §4.12).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalScope {
    /// Scoped to one match's lifetime.
    Match(MatchId),
    /// Scoped to the time between matches (or before the first one).
    Session,
}

impl JournalScope {
    /// The match id this journal is scoped to, if any.
    #[must_use]
    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            Self::Match(id) => Some(id.clone()),
            Self::Session => None,
        }
    }
}

/// A single open, growing journal. Entries are appended in memory; durable
/// persistence is a separate, explicit snapshot step (see
/// [`Journal::to_durable`] and [`crate::manager::JournalManager`]).
pub struct Journal {
    /// This journal's id, also used as its filename stem.
    pub id: String,
    /// What this journal is scoped to.
    pub scope: JournalScope,
    /// When this journal was opened, epoch milliseconds.
    pub created_at: u64,
    /// Recorded entries, in recording order.
    pub entries: Vec<JournalEntry>,
    /// Running per-event-type counts.
    pub event_type_counts: HashMap<String, u64>,
    /// Every distinct player id seen in any entry's metadata so far.
    pub player_ids: HashSet<PlayerId>,
    next_entry_id: u64,
}

impl Journal {
    /// Opens a fresh, empty journal.
    #[must_use]
    pub fn new(id: String, scope: JournalScope, now_ms: u64) -> Self {
        Self {
            id,
            scope,
            created_at: now_ms,
            entries: Vec::new(),
            event_type_counts: HashMap::new(),
            player_ids: HashSet::new(),
            next_entry_id: 1,
        }
    }

    /// Records `event`, assigning the next sequential id and computing
    /// `game_time` relative to this journal's `created_at` (spec §4.12
    /// `record(event)` steps 1-3). Returns the appended entry.
    pub fn record(&mut self, event: &SimEvent, now_ms: u64) -> &JournalEntry {
        let metadata = event.metadata();
        for id in metadata
            .player_id
            .iter()
            .chain(metadata.victim_id.iter())
            .chain(metadata.source.iter())
            .chain(metadata.assist_ids.iter())
        {
            self.player_ids.insert(id.clone());
        }

        let event_type = event.kind().to_string();
        *self.event_type_counts.entry(event_type.clone()).or_insert(0) += 1;

        let entry = JournalEntry {
            id: self.next_entry_id,
            timestamp: now_ms,
            game_time: now_ms.saturating_sub(self.created_at),
            event_type,
            event: event.clone(),
            metadata,
        };
        self.next_entry_id += 1;
        self.entries.push(entry);
        self.entries.last().expect("just pushed")
    }

    /// Total entries recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries have been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the frozen metadata header as of `now_ms` (spec §4.12: "the
    /// `eventCount` written to disk is the frozen count at save time").
    #[must_use]
    pub fn metadata(&self, now_ms: u64) -> JournalMetadata {
        JournalMetadata {
            id: self.id.clone(),
            created_at: self.created_at,
            match_id: self.scope.match_id(),
            duration: now_ms.saturating_sub(self.created_at),
            event_count: self.entries.len() as u64,
            player_ids: {
                let mut ids: Vec<PlayerId> = self.player_ids.iter().cloned().collect();
                ids.sort();
                ids
            },
            event_type_counts: self.event_type_counts.clone(),
            version: JOURNAL_FORMAT_VERSION,
        }
    }

    /// Snapshots the first `up_to` entries (an immutable prefix) into a
    /// [`DurableJournal`] ready to hand to a background save worker. The
    /// sim loop may keep appending past `up_to` while the snapshot saves
    /// (spec §5: "index of length N at save time").
    #[must_use]
    pub fn snapshot(&self, up_to: usize, now_ms: u64) -> DurableJournal {
        let up_to = up_to.min(self.entries.len());
        let mut metadata = self.metadata(now_ms);
        metadata.event_count = up_to as u64;
        DurableJournal { metadata, entries: self.entries[..up_to].to_vec() }
    }

    /// Reconstructs a [`Journal`] from a previously saved [`DurableJournal`],
    /// rebuilding the player set and per-type counts from its entries
    /// (spec §8 round-trip: "reconstructed player set").
    #[must_use]
    pub fn from_durable(durable: DurableJournal) -> Self {
        let scope = durable.metadata.match_id.clone().map_or(JournalScope::Session, JournalScope::Match);
        let mut journal = Self::new(durable.metadata.id.clone(), scope, durable.metadata.created_at);
        journal.next_entry_id = durable.entries.last().map_or(1, |e| e.id + 1);
        for entry in &durable.entries {
            for id in entry
                .metadata
                .player_id
                .iter()
                .chain(entry.metadata.victim_id.iter())
                .chain(entry.metadata.source.iter())
                .chain(entry.metadata.assist_ids.iter())
            {
                journal.player_ids.insert(id.clone());
            }
            *journal.event_type_counts.entry(entry.event_type.to_string()).or_insert(0) += 1;
        }
        journal.entries = durable.entries;
        journal
    }
}
