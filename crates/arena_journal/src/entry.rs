//! A single recorded journal entry (spec §3 "Journal entry").

use arena_core::{EventMetadata, SimEvent};
use serde::{Deserialize, Serialize};

/// One recorded event, with the sequencing and attribution metadata the
/// journal adds on top of the raw [`SimEvent`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Sequential id, scoped to the journal it was recorded into. Resets to
    /// 1 on every new journal (rotation or fresh session).
    pub id: u64,
    /// Wall-clock time the entry was recorded, epoch milliseconds.
    pub timestamp: u64,
    /// Milliseconds since the owning journal's `start_time`.
    pub game_time: u64,
    /// The event's wire/topic discriminant, duplicated here so readers can
    /// filter entries without deserializing the full event payload.
    pub event_type: String,
    /// The recorded event itself.
    pub event: SimEvent,
    /// Extracted common ids, for querying without re-parsing `event`.
    pub metadata: EventMetadata,
}
