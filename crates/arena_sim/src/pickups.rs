//! Pickups & buffs (C8): periodic spawning, collection, and temporary buff
//! lifecycle, driven from `tick:post`.

use crate::bus::EventBus;
use crate::spawn::find_safe_spawn_position;
use crate::world::World;
use arena_core::{IdAllocator, PickupKind, SimConfig, SimEvent};
use rand::Rng;

/// How often a new pickup spawns while below the population cap, ms.
pub const SPAWN_INTERVAL_MS: f64 = 5000.0;

/// Never more than this many pickups alive at once.
pub const MAX_PICKUPS: usize = 12;

/// Distance within which a live player collects a pickup on contact.
pub const PLAYER_PICK_RADIUS: f64 = 20.0;

/// Amount restored by a heal pickup, capped at the player's max hp.
pub const HEAL_AMOUNT: f64 = 35.0;

const PICKUP_KINDS: [PickupKind; 3] = [PickupKind::Heal, PickupKind::Haste, PickupKind::Shield];

/// Tracks elapsed time toward the next pickup spawn.
#[derive(Debug, Default)]
pub struct PickupSpawner {
    since_last_spawn_ms: f64,
}

impl PickupSpawner {
    /// A fresh spawner, timer at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the spawn timer and, if the interval has elapsed and the
    /// world is below [`MAX_PICKUPS`], spawns one pickup of a uniformly
    /// random kind at a safe position.
    pub fn step(
        &mut self,
        world: &mut World,
        cfg: &SimConfig,
        bus: &mut EventBus,
        ids: &IdAllocator,
        rng: &mut impl Rng,
        dt_ms: f64,
    ) {
        self.since_last_spawn_ms += dt_ms;
        if self.since_last_spawn_ms < SPAWN_INTERVAL_MS {
            return;
        }
        self.since_last_spawn_ms = 0.0;

        if world.pickups.len() >= MAX_PICKUPS {
            return;
        }

        let kind = PICKUP_KINDS[rng.gen_range(0..PICKUP_KINDS.len())];
        let pos = find_safe_spawn_position(world, &cfg.spawn, rng);
        let id = arena_core::PickupId(ids.next());
        world.pickups.insert(id, crate::world::Pickup { id, pos, kind });
        bus.emit(SimEvent::PickupSpawned { id, pos, kind });
    }
}

/// Collects any pickup within [`PLAYER_PICK_RADIUS`] of each live player,
/// applying its buff, then clears any buff that has since expired.
pub fn step(world: &mut World, cfg: &SimConfig, bus: &mut EventBus, now: f64) {
    collect(world, cfg, bus, now);
    expire(world, bus, now);
}

fn collect(world: &mut World, cfg: &SimConfig, bus: &mut EventBus, now: f64) {
    let mut collected = Vec::new();
    for player in world.live_players() {
        for pickup in world.pickups.values() {
            if player.pos.distance(pickup.pos) <= PLAYER_PICK_RADIUS {
                collected.push((pickup.id, player.id.clone(), pickup.kind));
                break;
            }
        }
    }

    for (pickup_id, player_id, kind) in collected {
        if world.pickups.remove(&pickup_id).is_none() {
            // Already claimed by another player processed earlier this pass.
            continue;
        }
        bus.emit(SimEvent::PickupCollected { id: pickup_id, by: player_id.clone() });

        let Some(player) = world.players.get_mut(&player_id) else { continue };
        let duration = match kind {
            PickupKind::Heal => {
                player.hp = (player.hp + HEAL_AMOUNT).min(cfg.player.hp);
                0.0
            }
            PickupKind::Haste => {
                player.haste_until = now + cfg.buffs.haste_default_duration;
                player.haste_factor = cfg.buffs.haste_multiplier;
                cfg.buffs.haste_default_duration
            }
            PickupKind::Shield => {
                player.shield_until = now + cfg.buffs.shield_default_duration;
                cfg.buffs.shield_default_duration
            }
        };
        bus.emit(SimEvent::BuffApplied { player_id, kind, duration });
    }
}

fn expire(world: &mut World, bus: &mut EventBus, now: f64) {
    let mut expired = Vec::new();
    for player in world.players.values_mut() {
        if player.haste_until > 0.0 && player.haste_until <= now {
            player.haste_until = 0.0;
            player.haste_factor = 1.0;
            expired.push((player.id.clone(), PickupKind::Haste));
        }
        if player.shield_until > 0.0 && player.shield_until <= now {
            player.shield_until = 0.0;
            expired.push((player.id.clone(), PickupKind::Shield));
        }
    }
    for (player_id, kind) in expired {
        bus.emit(SimEvent::BuffExpired { player_id, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::{PlayerId, Vec2};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world_with_player(cfg: &SimConfig, hp: f64) -> World {
        let mut world = World::new(cfg);
        let mut player = crate::world::Player::spawn(PlayerId::from_string("p1"), "A".into(), Vec2::new(100.0, 100.0), &cfg.player, Default::default());
        player.hp = hp;
        world.players.insert(player.id.clone(), player);
        world
    }

    #[test]
    fn spawner_respects_interval_and_population_cap() {
        let cfg = SimConfig::default();
        let mut world = World::new(&cfg);
        let mut bus = EventBus::new();
        let ids = IdAllocator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut spawner = PickupSpawner::new();

        spawner.step(&mut world, &cfg, &mut bus, &ids, &mut rng, 1000.0);
        assert!(world.pickups.is_empty(), "spawn interval has not elapsed yet");

        spawner.step(&mut world, &cfg, &mut bus, &ids, &mut rng, 4500.0);
        assert_eq!(world.pickups.len(), 1);
    }

    #[test]
    fn heal_pickup_restores_hp_capped_at_max() {
        let cfg = SimConfig::default();
        let mut world = world_with_player(&cfg, 90.0);
        let mut bus = EventBus::new();
        let pid = arena_core::PickupId(1);
        world.pickups.insert(pid, crate::world::Pickup { id: pid, pos: Vec2::new(100.0, 100.0), kind: PickupKind::Heal });

        step(&mut world, &cfg, &mut bus, 0.0);

        let player = &world.players[&PlayerId::from_string("p1")];
        assert!((player.hp - 100.0).abs() < 1e-9);
        assert!(world.pickups.is_empty());
    }

    #[test]
    fn haste_pickup_sets_until_and_factor() {
        let cfg = SimConfig::default();
        let mut world = world_with_player(&cfg, 100.0);
        let mut bus = EventBus::new();
        let pid = arena_core::PickupId(1);
        world.pickups.insert(pid, crate::world::Pickup { id: pid, pos: Vec2::new(100.0, 100.0), kind: PickupKind::Haste });

        step(&mut world, &cfg, &mut bus, 1000.0);

        let player = &world.players[&PlayerId::from_string("p1")];
        assert!((player.haste_until - 6000.0).abs() < 1e-9);
        assert!((player.haste_factor - cfg.buffs.haste_multiplier).abs() < 1e-9);
    }

    #[test]
    fn expired_haste_clears_factor_and_emits_event() {
        let cfg = SimConfig::default();
        let mut world = world_with_player(&cfg, 100.0);
        world.players.get_mut(&PlayerId::from_string("p1")).unwrap().haste_until = 500.0;
        world.players.get_mut(&PlayerId::from_string("p1")).unwrap().haste_factor = 1.6;
        let mut bus = EventBus::new();

        step(&mut world, &cfg, &mut bus, 1000.0);

        let player = &world.players[&PlayerId::from_string("p1")];
        assert_eq!(player.haste_until, 0.0);
        assert!((player.haste_factor - 1.0).abs() < 1e-9);
    }
}
