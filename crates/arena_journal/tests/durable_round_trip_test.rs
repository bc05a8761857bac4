use arena_core::{PlayerId, SimEvent, Vec2};
use arena_journal::{read_durable_journal, write_durable_journal, Journal, JournalScope, DEFAULT_STREAM_THRESHOLD};

fn build_journal(entry_count: usize) -> Journal {
    let mut journal = Journal::new("round-trip".to_string(), JournalScope::Session, 0);
    for i in 0..entry_count {
        let event = SimEvent::PlayerMove { player_id: PlayerId::from_string("p1"), pos: Vec2::new(i as f64, i as f64) };
        journal.record(&event, i as u64);
    }
    journal
}

#[test]
fn plain_json_round_trip_reconstructs_equivalent_journal() {
    let journal = build_journal(25);
    let durable = journal.snapshot(journal.len(), 25);

    let mut buf = Vec::new();
    write_durable_journal(&mut buf, &durable, DEFAULT_STREAM_THRESHOLD, false).unwrap();
    let restored = read_durable_journal(buf.as_slice(), false).unwrap();

    let reloaded = Journal::from_durable(restored);
    assert_eq!(reloaded.len(), 25);
    assert_eq!(reloaded.player_ids.len(), 1);
    assert_eq!(reloaded.event_type_counts.get("player:move"), Some(&25));
}

#[test]
fn compressed_streaming_round_trip_preserves_ordering() {
    let journal = build_journal(2_500);
    let durable = journal.snapshot(journal.len(), 2_500);

    let mut buf = Vec::new();
    write_durable_journal(&mut buf, &durable, 1_000, true).unwrap();
    let restored = read_durable_journal(buf.as_slice(), true).unwrap();

    assert_eq!(restored.entries.len(), 2_500);
    for (i, entry) in restored.entries.iter().enumerate() {
        assert_eq!(entry.id, (i + 1) as u64);
        assert_eq!(entry.game_time, i as u64);
    }
}
