//! The persisted journal header and the full on-disk document shape.

use crate::entry::JournalEntry;
use arena_core::{MatchId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header persisted alongside a journal's entries (spec §3 "Journal").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalMetadata {
    /// This journal's id (also its filename stem).
    pub id: String,
    /// When this journal was opened, epoch milliseconds.
    pub created_at: u64,
    /// The match this journal is scoped to, if any (absent for
    /// inter-match "session" journals).
    pub match_id: Option<MatchId>,
    /// Wall-clock span covered by this journal, milliseconds, frozen at
    /// save time.
    pub duration: u64,
    /// Total entries recorded, frozen at save time (spec §4.12: "the
    /// `eventCount` written to disk is the frozen count at save time").
    pub event_count: u64,
    /// Every distinct player id that appears in any entry's metadata.
    pub player_ids: Vec<PlayerId>,
    /// Per-event-type counts, for quick summaries without a full scan.
    pub event_type_counts: HashMap<String, u64>,
    /// On-disk format version.
    pub version: u32,
}

/// The current on-disk format version written by this implementation.
pub const JOURNAL_FORMAT_VERSION: u32 = 1;

/// The complete on-disk document: `{"metadata": ..., "entries": [...]}`
/// (spec §4.12 "Durable format").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DurableJournal {
    /// The frozen header.
    pub metadata: JournalMetadata,
    /// Every entry recorded up to the point this snapshot was taken.
    pub entries: Vec<JournalEntry>,
}
