use arena_core::{PlayerId, SimEvent, Vec2};
use arena_journal::{Journal, JournalScope};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn append_events(c: &mut Criterion) {
    c.bench_function("journal_record_10k_moves", |b| {
        b.iter(|| {
            let mut journal = Journal::new("bench".to_string(), JournalScope::Session, 0);
            for i in 0..10_000u64 {
                let event = SimEvent::PlayerMove { player_id: PlayerId::from_string("p1"), pos: Vec2::new(i as f64, 0.0) };
                black_box(journal.record(&event, i));
            }
            black_box(journal.len())
        });
    });
}

fn snapshot_and_encode(c: &mut Criterion) {
    let mut journal = Journal::new("bench".to_string(), JournalScope::Session, 0);
    for i in 0..20_000u64 {
        let event = SimEvent::PlayerMove { player_id: PlayerId::from_string("p1"), pos: Vec2::new(i as f64, 0.0) };
        journal.record(&event, i);
    }

    c.bench_function("journal_snapshot_and_stream_encode_20k", |b| {
        b.iter(|| {
            let durable = journal.snapshot(journal.len(), 20_000);
            let mut buf = Vec::new();
            arena_journal::write_durable_journal(&mut buf, &durable, arena_journal::DEFAULT_STREAM_THRESHOLD, false).unwrap();
            black_box(buf.len())
        });
    });
}

criterion_group!(benches, append_events, snapshot_and_encode);
criterion_main!(benches);
