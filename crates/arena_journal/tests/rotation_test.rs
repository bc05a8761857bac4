use arena_core::{MatchId, PlayerId, SimEvent, Vec2};
use arena_journal::{JournalConfig, JournalManager};

fn config(base: &std::path::Path) -> JournalConfig {
    JournalConfig { base_dir: base.to_path_buf(), compress: false, ..JournalConfig::default() }
}

#[test]
fn match_boundary_rotation_produces_expected_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let manager = JournalManager::new(config(dir.path()), 0);

    manager.record(&SimEvent::PlayerJoin { player_id: PlayerId::from_string("p1"), name: "Ada".into(), pos: Vec2::ZERO }, 0);

    let match_id = MatchId::from_string("m1");
    let created_save = manager
        .record(&SimEvent::MatchCreated { match_id: match_id.clone(), mode: "ffa".into(), countdown_ms: 5000.0 }, 1000)
        .expect("rotating out of the session journal on match:created produces a save");
    assert_eq!(created_save.durable.entries.len(), 1, "outgoing session journal holds only the pre-match join");
    manager.commit_save(created_save).unwrap();

    manager.record(
        &SimEvent::PlayerKill {
            killer_id: PlayerId::from_string("p1"),
            victim_id: PlayerId::from_string("p2"),
            assist_ids: vec![],
            weapon: arena_core::Weapon::Bullet,
        },
        2000,
    );

    let ended_save = manager
        .record(&SimEvent::MatchEnded { match_id: match_id.clone(), at: 3000 }, 3000)
        .expect("match:ended always produces a save");
    assert_eq!(ended_save.durable.entries.len(), 3, "ending journal holds its creation, the kill, and its own end event");
    assert_eq!(ended_save.durable.metadata.match_id, Some(match_id));
    manager.commit_save(ended_save).unwrap();

    assert_eq!(manager.index_snapshot().len(), 2);
    for id in manager.index_snapshot().ids_oldest_first() {
        let entry = manager.index_snapshot().get(&id).cloned().unwrap();
        assert!(dir.path().join(&entry.path).exists());
    }
}

#[test]
fn size_based_rotation_keeps_same_scope() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.max_journal_size = 3;
    let manager = JournalManager::new(cfg, 0);

    let mut save = None;
    for i in 0..3u64 {
        save = manager.record(
            &SimEvent::PlayerMove { player_id: PlayerId::from_string("p1"), pos: Vec2::new(i as f64, 0.0) },
            i,
        );
    }
    let save = save.expect("crossing max_journal_size should trigger a rotation save on the threshold-reaching event");
    assert_eq!(save.durable.entries.len(), 3, "rotated-out journal holds exactly the events up to and including the size trigger");
}
