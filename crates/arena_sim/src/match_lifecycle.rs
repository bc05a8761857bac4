//! Match lifecycle (C9): the `idle -> countdown -> active -> ended` state
//! machine for the single current match.

use crate::bus::EventBus;
use crate::world::{MatchPhase, MatchState, World};
use arena_core::config::MatchConfig;
use arena_core::{MatchId, SimEvent};

/// Creates a new match and enters its countdown: emits `match:created`,
/// sets `current_match`, and schedules the countdown-to-active transition.
/// Replaces any existing match regardless of its phase.
pub fn create_match(world: &mut World, cfg: &MatchConfig, bus: &mut EventBus, mode: String, now: f64) -> MatchId {
    let id = MatchId::new();
    world.current_match = Some(MatchState {
        id: id.clone(),
        mode: mode.clone(),
        phase: MatchPhase::Countdown,
        starts_at: Some(now + cfg.countdown_ms),
        ends_at: None,
        players: world.players.keys().cloned().collect(),
    });
    bus.emit(SimEvent::MatchCreated { match_id: id.clone(), mode, countdown_ms: cfg.countdown_ms });
    id
}

/// Advances the current match's phase if a scheduled transition is due.
/// Called once per tick from `tick:post`.
pub fn step(world: &mut World, cfg: &MatchConfig, bus: &mut EventBus, now: f64) {
    let Some(phase) = world.current_match.as_ref().map(|m| m.phase) else { return };

    match phase {
        MatchPhase::Countdown => {
            let starts_at = world.current_match.as_ref().and_then(|m| m.starts_at);
            if starts_at.is_some_and(|t| now >= t) {
                activate(world, cfg, bus, now);
            }
        }
        MatchPhase::Active => {
            let ends_at = world.current_match.as_ref().and_then(|m| m.ends_at);
            if ends_at.is_some_and(|t| now >= t) {
                end(world, bus, now);
            }
        }
        MatchPhase::Ended => {
            let ended_at = world.current_match.as_ref().and_then(|m| m.ends_at).unwrap_or(now);
            if now >= ended_at + cfg.end_linger_ms {
                world.current_match = None;
            }
        }
        MatchPhase::Idle => {}
    }
}

fn activate(world: &mut World, cfg: &MatchConfig, bus: &mut EventBus, now: f64) {
    let Some(m) = world.current_match.as_mut() else { return };
    m.phase = MatchPhase::Active;
    m.ends_at = cfg.duration_ms.map(|d| now + d);
    let match_id = m.id.clone();

    for player in world.players.values_mut() {
        player.stats = Default::default();
        player.stats.match_start_time = now;
        bus.emit(SimEvent::ScoreUpdate { player_id: player.id.clone(), kills: 0, deaths: 0, assists: 0 });
    }

    bus.emit(SimEvent::MatchStarted { match_id });
}

fn end(world: &mut World, bus: &mut EventBus, now: f64) {
    let Some(m) = world.current_match.as_mut() else { return };
    m.phase = MatchPhase::Ended;
    m.ends_at = Some(now);
    let match_id = m.id.clone();
    bus.emit(SimEvent::MatchEnded { match_id, at: now as u64 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::SimConfig;

    #[test]
    fn create_match_emits_created_and_sets_countdown() {
        let cfg = SimConfig::default();
        let mut world = World::new(&cfg);
        let mut bus = EventBus::new();
        let id = create_match(&mut world, &cfg.game_match, &mut bus, "ffa".to_string(), 1000.0);

        let m = world.current_match.as_ref().unwrap();
        assert_eq!(m.id, id);
        assert_eq!(m.phase, MatchPhase::Countdown);
        assert_eq!(m.starts_at, Some(1000.0 + cfg.game_match.countdown_ms));
        assert_eq!(bus.drain_log().len(), 1);
    }

    #[test]
    fn countdown_activates_after_duration_and_resets_stats() {
        let cfg = SimConfig::default();
        let mut world = World::new(&cfg);
        let mut player = crate::world::Player::spawn(
            arena_core::PlayerId::from_string("p1"),
            "A".into(),
            arena_core::Vec2::ZERO,
            &cfg.player,
            Default::default(),
        );
        player.stats.kills = 5;
        world.players.insert(player.id.clone(), player);

        let mut bus = EventBus::new();
        create_match(&mut world, &cfg.game_match, &mut bus, "ffa".to_string(), 0.0);
        bus.drain_log();

        step(&mut world, &cfg.game_match, &mut bus, cfg.game_match.countdown_ms);

        assert_eq!(world.current_match.as_ref().unwrap().phase, MatchPhase::Active);
        assert_eq!(world.players[&arena_core::PlayerId::from_string("p1")].stats.kills, 0);
        let events = bus.drain_log();
        assert!(events.iter().any(|e| matches!(e, SimEvent::MatchStarted { .. })));
        assert!(events.iter().any(|e| matches!(e, SimEvent::ScoreUpdate { .. })));
    }

    #[test]
    fn active_ends_after_duration_then_clears_after_linger() {
        let mut cfg = SimConfig::default();
        cfg.game_match.duration_ms = Some(1000.0);
        cfg.game_match.end_linger_ms = 500.0;
        let mut world = World::new(&cfg);
        let mut bus = EventBus::new();

        create_match(&mut world, &cfg.game_match, &mut bus, "ffa".to_string(), 0.0);
        step(&mut world, &cfg.game_match, &mut bus, cfg.game_match.countdown_ms);
        bus.drain_log();

        let active_since = cfg.game_match.countdown_ms;
        step(&mut world, &cfg.game_match, &mut bus, active_since + 1000.0);
        assert_eq!(world.current_match.as_ref().unwrap().phase, MatchPhase::Ended);

        step(&mut world, &cfg.game_match, &mut bus, active_since + 1000.0 + 500.0);
        assert!(world.current_match.is_none());
    }
}
