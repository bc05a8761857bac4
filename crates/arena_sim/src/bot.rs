//! Bot controller (C13): a simple AI that issues the same `cmd:*` events a
//! real client would, so it is indistinguishable from a player as far as
//! commands & casting (C5) is concerned.
//!
//! Behavior: on a fixed think interval, chase the nearest live enemy while
//! steering away from anyone too close (separation), aim at the target,
//! and fire when roughly lined up and in range.

use crate::bus::EventBus;
use crate::world::World;
use arena_core::{PlayerId, Skill, SimEvent, Vec2};

/// Milliseconds between decisions. Movement/aim commands are only
/// re-issued on think ticks, not every simulation tick.
pub const THINK_INTERVAL_MS: f64 = 250.0;

/// Distance below which another player contributes a repelling steering
/// component.
pub const SEPARATION_RADIUS: f64 = 40.0;

/// Weight of the separation component relative to the chase component.
pub const SEPARATION_WEIGHT: f64 = 0.8;

/// Maximum distance at which a bot will attempt to fire.
pub const FIRE_RANGE: f64 = 400.0;

/// Half-angle, radians, within which the bot considers itself lined up
/// with its target (~15 degrees).
pub const FIRE_ARC_RADIANS: f64 = 0.26;

/// Per-bot think-interval accumulator.
#[derive(Debug)]
pub struct BotController {
    /// The player record this bot drives.
    pub player_id: PlayerId,
    last_think: f64,
}

impl BotController {
    /// Creates a controller for an already-joined bot player, ready to
    /// think on the next step at or after `now`.
    #[must_use]
    pub fn new(player_id: PlayerId, now: f64) -> Self {
        Self { player_id, last_think: now - THINK_INTERVAL_MS }
    }
}

/// Advances every bot whose think interval has elapsed, emitting
/// `cmd:move`/`cmd:aim`/`cmd:cast` onto `bus` exactly as a client's
/// transport adapter would.
pub fn step(bots: &mut [BotController], world: &World, bus: &mut EventBus, now: f64) {
    for bot in bots.iter_mut() {
        if now - bot.last_think < THINK_INTERVAL_MS {
            continue;
        }
        bot.last_think = now;
        think_one(bot, world, bus, now);
    }
}

fn think_one(bot: &BotController, world: &World, bus: &mut EventBus, now: f64) {
    let Some(me) = world.players.get(&bot.player_id) else { return };
    if me.is_dead {
        return;
    }

    let Some(target) = nearest_enemy(world, &bot.player_id, me.pos) else { return };

    let chase_dir = (target.pos - me.pos).normalize_or_unit_x();
    let separation = separation_vector(world, &bot.player_id, me.pos);
    let move_dir = (chase_dir + separation * SEPARATION_WEIGHT).normalize_or_unit_x();
    bus.emit(SimEvent::CmdMove { player_id: bot.player_id.clone(), dir: move_dir });

    let aim_dir = (target.pos - me.pos).normalize_or_unit_x();
    bus.emit(SimEvent::CmdAim { player_id: bot.player_id.clone(), dir: aim_dir });

    let distance = me.pos.distance(target.pos);
    let angle_off = me.face.signed_angle_to(aim_dir).abs();
    if distance <= FIRE_RANGE && angle_off <= FIRE_ARC_RADIANS && me.cooldowns.is_free(Skill::Shoot, now) {
        bus.emit(SimEvent::CmdCast { player_id: bot.player_id.clone(), skill: Skill::Shoot });
    }
}

fn nearest_enemy<'a>(world: &'a World, self_id: &PlayerId, from: Vec2) -> Option<&'a crate::world::Player> {
    world
        .live_players()
        .filter(|p| &p.id != self_id)
        .min_by(|a, b| a.pos.distance(from).total_cmp(&b.pos.distance(from)))
}

fn separation_vector(world: &World, self_id: &PlayerId, from: Vec2) -> Vec2 {
    let mut accum = Vec2::ZERO;
    for other in world.live_players().filter(|p| &p.id != self_id) {
        let delta = from - other.pos;
        let dist = delta.length();
        if dist > 0.0 && dist < SEPARATION_RADIUS {
            accum = accum + delta.normalize_or_unit_x() * ((SEPARATION_RADIUS - dist) / SEPARATION_RADIUS);
        }
    }
    accum
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::SimConfig;

    fn spawn(world: &mut World, cfg: &SimConfig, name: &str, pos: Vec2) {
        let player = crate::world::Player::spawn(PlayerId::from_string(name), name.to_string(), pos, &cfg.player, Default::default());
        world.players.insert(player.id.clone(), player);
    }

    #[test]
    fn bot_does_nothing_before_think_interval_elapses() {
        let cfg = SimConfig::default();
        let mut world = World::new(&cfg);
        spawn(&mut world, &cfg, "bot", Vec2::new(0.0, 0.0));
        spawn(&mut world, &cfg, "enemy", Vec2::new(100.0, 0.0));
        let mut bots = vec![BotController::new(PlayerId::from_string("bot"), 0.0)];
        let mut bus = EventBus::new();

        step(&mut bots, &world, &mut bus, 10.0);
        assert!(bus.drain_log().is_empty());
    }

    #[test]
    fn bot_chases_and_aims_at_nearest_enemy() {
        let cfg = SimConfig::default();
        let mut world = World::new(&cfg);
        spawn(&mut world, &cfg, "bot", Vec2::new(0.0, 0.0));
        spawn(&mut world, &cfg, "near", Vec2::new(50.0, 0.0));
        spawn(&mut world, &cfg, "far", Vec2::new(900.0, 0.0));
        let mut bots = vec![BotController::new(PlayerId::from_string("bot"), 0.0)];
        let mut bus = EventBus::new();

        step(&mut bots, &world, &mut bus, THINK_INTERVAL_MS);
        let events = bus.drain_log();
        let aim = events.iter().find_map(|e| match e {
            SimEvent::CmdAim { dir, .. } => Some(*dir),
            _ => None,
        });
        assert!(aim.unwrap().x > 0.9, "bot should aim toward the nearer enemy at (50,0), not the farther one");
    }

    #[test]
    fn bot_fires_when_lined_up_and_in_range() {
        let cfg = SimConfig::default();
        let mut world = World::new(&cfg);
        spawn(&mut world, &cfg, "bot", Vec2::new(0.0, 0.0));
        spawn(&mut world, &cfg, "enemy", Vec2::new(100.0, 0.0));
        world.players.get_mut(&PlayerId::from_string("bot")).unwrap().face = Vec2::new(1.0, 0.0);
        let mut bots = vec![BotController::new(PlayerId::from_string("bot"), 0.0)];
        let mut bus = EventBus::new();

        step(&mut bots, &world, &mut bus, THINK_INTERVAL_MS);
        let events = bus.drain_log();
        assert!(events.iter().any(|e| matches!(e, SimEvent::CmdCast { skill: Skill::Shoot, .. })));
    }

    #[test]
    fn bot_does_not_fire_out_of_range() {
        let cfg = SimConfig::default();
        let mut world = World::new(&cfg);
        spawn(&mut world, &cfg, "bot", Vec2::new(0.0, 0.0));
        spawn(&mut world, &cfg, "enemy", Vec2::new(1000.0, 0.0));
        world.players.get_mut(&PlayerId::from_string("bot")).unwrap().face = Vec2::new(1.0, 0.0);
        let mut bots = vec![BotController::new(PlayerId::from_string("bot"), 0.0)];
        let mut bus = EventBus::new();

        step(&mut bots, &world, &mut bus, THINK_INTERVAL_MS);
        let events = bus.drain_log();
        assert!(!events.iter().any(|e| matches!(e, SimEvent::CmdCast { .. })));
    }
}
