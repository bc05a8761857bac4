//! Commands & casting (C5): translates `cmd:*` events into world state
//! changes and projectile spawns, enforcing cooldowns and liveness.
//!
//! Every handler here is a silently-dropped branch on illegal input
//! (dead player, cooldown active, respawn before the timer) rather than a
//! `Result::Err` — simulation code never throws.

use crate::bus::EventBus;
use crate::world::{Player, PlayerStats, World};
use arena_core::{IdAllocator, PlayerId, ProjectileId, ProjectileKind, Skill, SimConfig, SimEvent, Vec2};
use rand::Rng;

/// Duration of a dash's speed boost and i-frame window, milliseconds.
/// Hardcoded, not a configuration field.
const DASH_DURATION_MS: f64 = 220.0;
/// Velocity multiplier while dashing.
const DASH_FACTOR: f64 = 2.5;

/// Normalizes `dir`, leaving the zero vector as zero rather than coercing
/// it to a default unit direction — a distinct rule from the general
/// arithmetic-error coercion used elsewhere (see
/// [`arena_core::Vec2::normalize_or_unit_x`]).
fn normalize_keep_zero(dir: Vec2) -> Vec2 {
    dir.normalize().unwrap_or(Vec2::ZERO)
}

/// Dispatches a single `cmd:*` [`SimEvent`] against `world`, mutating state
/// and emitting follow-up events on `bus`. Non-command events are ignored.
pub fn handle(
    world: &mut World,
    bus: &mut EventBus,
    config: &SimConfig,
    projectile_ids: &IdAllocator,
    rng: &mut impl Rng,
    now: f64,
    event: &SimEvent,
) {
    match event {
        SimEvent::CmdJoin { player_id, name } => handle_join(world, bus, config, rng, now, player_id, name),
        SimEvent::CmdLeave { player_id } => handle_leave(world, bus, player_id),
        SimEvent::CmdMove { player_id, dir } => handle_move(world, config, player_id, *dir, now),
        SimEvent::CmdAim { player_id, dir } => handle_aim(world, bus, player_id, *dir),
        SimEvent::CmdCast { player_id, skill } => {
            handle_cast(world, bus, config, projectile_ids, player_id, *skill, now);
        }
        SimEvent::CmdRespawn { player_id } => handle_respawn(world, bus, config, rng, now, player_id),
        _ => {}
    }
}

fn handle_join(
    world: &mut World,
    bus: &mut EventBus,
    config: &SimConfig,
    rng: &mut impl Rng,
    now: f64,
    player_id: &PlayerId,
    name: &str,
) {
    let pos = crate::spawn::find_safe_spawn_position(world, &config.spawn, rng);
    let stats = PlayerStats { match_start_time: now, ..PlayerStats::default() };
    let player = Player::spawn(player_id.clone(), name.to_string(), pos, &config.player, stats);
    world.players.insert(player_id.clone(), player);
    bus.emit(SimEvent::PlayerJoin { player_id: player_id.clone(), name: name.to_string(), pos });
}

fn handle_leave(world: &mut World, bus: &mut EventBus, player_id: &PlayerId) {
    if world.players.remove(player_id).is_none() {
        return;
    }
    // A leave is a disconnect, not a death: it does not touch streaks or
    // stats. See DESIGN.md.
    bus.emit(SimEvent::PlayerLeave { player_id: player_id.clone() });
}

fn handle_move(world: &mut World, _config: &SimConfig, player_id: &PlayerId, dir: Vec2, now: f64) {
    let Some(player) = world.players.get_mut(player_id) else { return };
    if player.is_dead {
        return;
    }
    let normalized = normalize_keep_zero(dir);
    if normalized.approx_eq(player.last_move_dir, 1e-6) {
        return;
    }
    player.last_move_dir = normalized;
    let haste_active = player.is_hasted(now);
    let speed = player.speed * if haste_active { player.haste_factor } else { 1.0 };
    player.vel = normalized * speed;
}

fn handle_aim(world: &mut World, bus: &mut EventBus, player_id: &PlayerId, dir: Vec2) {
    let Some(player) = world.players.get_mut(player_id) else { return };
    if player.is_dead {
        return;
    }
    let Some(normalized) = dir.normalize() else { return };
    player.face_target = normalized;
    bus.emit(SimEvent::PlayerAimed { player_id: player_id.clone(), dir: normalized });
}

fn handle_cast(
    world: &mut World,
    bus: &mut EventBus,
    config: &SimConfig,
    projectile_ids: &IdAllocator,
    player_id: &PlayerId,
    skill: Skill,
    now: f64,
) {
    let Some(player) = world.players.get_mut(player_id) else { return };
    if player.is_dead || !player.cooldowns.is_free(skill, now) {
        return;
    }

    match skill {
        Skill::Shoot => {
            player.cooldowns.start(skill, now, config.cooldowns.shoot);
            let face = player.face;
            let owner = player.id.clone();
            let pos = player.pos;
            player.stats.shots_fired += 1;
            let id = ProjectileId(projectile_ids.next());
            spawn_projectile(world, bus, config, id, owner, ProjectileKind::Bullet, pos, face, 0.0, now);
        }
        Skill::Shotgun => {
            player.cooldowns.start(skill, now, config.cooldowns.shotgun);
            let face = player.face;
            let owner = player.id.clone();
            let pos = player.pos;
            player.stats.shots_fired += 1;
            let count = config.projectiles.pellet.count.max(1);
            let spread = config.projectiles.pellet.spread;
            for i in 0..count {
                let t = if count == 1 { 0.0 } else { (i as f64 / (count - 1) as f64) * 2.0 - 1.0 };
                let angle = t * spread;
                let id = ProjectileId(projectile_ids.next());
                spawn_projectile(world, bus, config, id, owner.clone(), ProjectileKind::Pellet, pos, face, angle, now);
            }
        }
        Skill::Rocket => {
            player.cooldowns.start(skill, now, config.cooldowns.rocket);
            let face = player.face;
            let owner = player.id.clone();
            let pos = player.pos;
            player.stats.shots_fired += 1;
            let id = ProjectileId(projectile_ids.next());
            spawn_projectile(world, bus, config, id, owner, ProjectileKind::Rocket, pos, face, 0.0, now);
        }
        Skill::Dash => {
            player.cooldowns.start(skill, now, config.cooldowns.dash);
            player.dash_until = now + DASH_DURATION_MS;
            player.iframe_until = now + DASH_DURATION_MS;
            player.dash_factor = DASH_FACTOR;
            bus.emit(SimEvent::DashStarted { player_id: player_id.clone(), duration: DASH_DURATION_MS, iframes: true });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_projectile(
    world: &mut World,
    bus: &mut EventBus,
    config: &SimConfig,
    id: ProjectileId,
    owner: PlayerId,
    kind: ProjectileKind,
    pos: Vec2,
    face: Vec2,
    angle_offset: f64,
    now: f64,
) {
    let dir = face.rotate(angle_offset);
    let (speed, hit_radius, damage, lifetime, max_bounces, damage_dropoff, velocity_retention) = match kind {
        ProjectileKind::Bullet => (
            config.projectiles.base_speed,
            config.projectiles.hit_radius,
            config.projectiles.bullet.damage,
            config.projectiles.bullet.lifetime,
            config.projectiles.bullet.max_bounces,
            config.projectiles.bullet.damage_dropoff,
            config.projectiles.bullet.velocity_retention,
        ),
        ProjectileKind::Pellet => (
            config.projectiles.base_speed,
            config.projectiles.hit_radius,
            config.projectiles.pellet.damage,
            config.projectiles.pellet.lifetime,
            config.projectiles.pellet.max_bounces,
            config.projectiles.pellet.damage_dropoff,
            config.projectiles.pellet.velocity_retention,
        ),
        ProjectileKind::Rocket => (
            config.projectiles.rocket.speed,
            config.projectiles.rocket.hit_radius,
            config.projectiles.rocket.damage,
            config.projectiles.rocket.lifetime,
            0,
            1.0,
            1.0,
        ),
    };
    let vel = dir * speed;
    let owner_for_event = owner.clone();
    let projectile = crate::world::Projectile {
        id,
        owner,
        kind,
        pos,
        vel,
        hit_radius,
        damage,
        lifetime,
        spawn_time: now,
        bounce_count: 0,
        max_bounces,
        damage_dropoff,
        velocity_retention,
    };
    world.projectiles.insert(id, projectile);
    bus.emit(SimEvent::ProjectileSpawned { id, owner: owner_for_event, kind, pos, vel });
}

fn handle_respawn(
    world: &mut World,
    bus: &mut EventBus,
    config: &SimConfig,
    rng: &mut impl Rng,
    now: f64,
    player_id: &PlayerId,
) {
    let pos = crate::spawn::find_safe_spawn_position(world, &config.spawn, rng);
    let Some(player) = world.players.get_mut(player_id) else { return };
    if !player.is_dead {
        return;
    }
    if player.dead_until.map_or(false, |until| now < until) {
        return;
    }

    player.pos = pos;
    player.vel = Vec2::ZERO;
    player.face = Vec2::UNIT_X;
    player.face_target = Vec2::UNIT_X;
    player.hp = config.player.hp;
    player.cooldowns = crate::world::Cooldowns::default();
    player.iframe_until = 0.0;
    player.dash_until = 0.0;
    player.haste_until = 0.0;
    player.shield_until = 0.0;
    player.kb = None;
    player.dash_factor = 1.0;
    player.haste_factor = 1.0;
    player.is_dead = false;
    player.died_at = None;
    player.dead_until = None;
    player.last_broadcast_pos = pos;
    player.last_heartbeat_pos = pos;

    let name = player.name.clone();
    // Respawn re-signals presence via a second `player:join` rather than
    // a dedicated `player:respawn`. See DESIGN.md.
    bus.emit(SimEvent::PlayerJoin { player_id: player_id.clone(), name, pos });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (World, EventBus, SimConfig, IdAllocator, ChaCha8Rng) {
        let config = SimConfig::default();
        let world = World::new(&config);
        (world, EventBus::new(), config, IdAllocator::new(), ChaCha8Rng::seed_from_u64(7))
    }

    #[test]
    fn join_creates_a_live_player_at_full_hp() {
        let (mut world, mut bus, config, ids, mut rng) = setup();
        let pid = PlayerId::from_string("p1");
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdJoin { player_id: pid.clone(), name: "Ada".into() });
        let player = &world.players[&pid];
        assert!(!player.is_dead);
        assert_eq!(player.hp, config.player.hp);
    }

    #[test]
    fn move_zero_after_zero_is_deduped() {
        let (mut world, mut bus, config, ids, mut rng) = setup();
        let pid = PlayerId::from_string("p1");
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdJoin { player_id: pid.clone(), name: "Ada".into() });
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdMove { player_id: pid.clone(), dir: Vec2::ZERO });
        let before = world.players[&pid].vel;
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 1.0, &SimEvent::CmdMove { player_id: pid.clone(), dir: Vec2::ZERO });
        assert_eq!(before, world.players[&pid].vel);
    }

    #[test]
    fn cast_respects_cooldown() {
        let (mut world, mut bus, config, ids, mut rng) = setup();
        let pid = PlayerId::from_string("p1");
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdJoin { player_id: pid.clone(), name: "Ada".into() });
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdCast { player_id: pid.clone(), skill: Skill::Shoot });
        assert_eq!(world.projectiles.len(), 1);
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 10.0, &SimEvent::CmdCast { player_id: pid.clone(), skill: Skill::Shoot });
        assert_eq!(world.projectiles.len(), 1, "cooldown should have blocked the second cast");
    }

    #[test]
    fn shotgun_spawns_configured_pellet_count() {
        let (mut world, mut bus, config, ids, mut rng) = setup();
        let pid = PlayerId::from_string("p1");
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdJoin { player_id: pid.clone(), name: "Ada".into() });
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdCast { player_id: pid.clone(), skill: Skill::Shotgun });
        assert_eq!(world.projectiles.len(), config.projectiles.pellet.count as usize);
    }

    #[test]
    fn leave_removes_player_and_emits_leave_not_death() {
        let (mut world, mut bus, config, ids, mut rng) = setup();
        let pid = PlayerId::from_string("p1");
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdJoin { player_id: pid.clone(), name: "Ada".into() });
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdLeave { player_id: pid.clone() });
        assert!(!world.players.contains_key(&pid));
        let log = bus.drain_log();
        assert!(log.iter().any(|e| matches!(e, SimEvent::PlayerLeave { .. })));
        assert!(!log.iter().any(|e| matches!(e, SimEvent::PlayerDie { .. })));
    }

    #[test]
    fn respawn_before_timer_is_dropped() {
        let (mut world, mut bus, config, ids, mut rng) = setup();
        let pid = PlayerId::from_string("p1");
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 0.0, &SimEvent::CmdJoin { player_id: pid.clone(), name: "Ada".into() });
        {
            let player = world.players.get_mut(&pid).unwrap();
            player.is_dead = true;
            player.dead_until = Some(5000.0);
        }
        handle(&mut world, &mut bus, &config, &ids, &mut rng, 1000.0, &SimEvent::CmdRespawn { player_id: pid.clone() });
        assert!(world.players[&pid].is_dead);
    }
}
