//! Movement & collision (C6): runs on `tick:pre`. Integrates player and
//! projectile velocities, substeps circle-vs-AABB resolution for players,
//! steps and bounces/explodes projectiles, turn-rate-limits aim, and
//! rebroadcasts position/facing with dedup plus a periodic heartbeat.

use crate::bus::EventBus;
use crate::world::{Player, World};
use arena_core::config::CombatConfig;
use arena_core::{Rect, SimConfig, SimEvent, Vec2};

/// Maximum world-unit displacement per collision substep. Bounding it
/// prevents tunneling through thin obstacles at high speed, e.g. a
/// projectile at 1000 u/s against an 80-unit-thick wall.
const MAX_SUBSTEP_DISTANCE: f64 = 6.0;

/// Integrates every live player and every projectile for one `dt` seconds,
/// emitting `player:move`/`player:aimed`/`dash:ended` and
/// `projectile:moved`/`bounced`/`despawned`/`explosion:spawned` as needed.
/// `heartbeat_accum_ms` is the caller-owned accumulator for the periodic
/// heartbeat rebroadcast; it is advanced by `dt` in place.
pub fn step(world: &mut World, bus: &mut EventBus, config: &SimConfig, now: f64, dt: f64, heartbeat_accum_ms: &mut f64) {
    step_players(world, bus, &config.combat, now, dt);
    step_projectiles(world, bus, config, now, dt);

    *heartbeat_accum_ms += dt * 1000.0;
    if *heartbeat_accum_ms >= config.combat.heartbeat_interval {
        *heartbeat_accum_ms = 0.0;
        run_heartbeat(world, bus);
    }
}

fn step_players(world: &mut World, bus: &mut EventBus, combat: &CombatConfig, now: f64, dt: f64) {
    let bounds = world.bounds;
    let obstacles: Vec<Rect> = world.obstacles.iter().map(|o| o.rect).collect();
    let mut dash_ended = Vec::new();
    let mut moved = Vec::new();
    let mut aimed = Vec::new();

    for player in world.players.values_mut() {
        if player.is_dead {
            continue;
        }

        let was_dashing = player.was_dashing;
        let now_dashing = player.is_dashing(now);
        if was_dashing && !now_dashing {
            dash_ended.push(player.id.clone());
        }
        player.was_dashing = now_dashing;

        if let Some(kb) = player.kb {
            if kb.until <= now {
                player.kb = None;
            }
        }

        let kb_vel = player.kb.filter(|kb| kb.until > now).map_or(Vec2::ZERO, |kb| Vec2::new(kb.vx, kb.vy));
        let mut eff_vel = player.vel + kb_vel;
        if now_dashing {
            eff_vel = eff_vel * player.dash_factor;
        }

        let displacement = eff_vel * dt;
        let magnitude = displacement.length();
        if magnitude > f64::EPSILON {
            let steps = (magnitude / MAX_SUBSTEP_DISTANCE).ceil().max(1.0) as u32;
            let sub_disp = displacement * (1.0 / steps as f64);
            for _ in 0..steps {
                player.pos = player.pos + sub_disp;
                player.pos = player.pos.clamp_rect(
                    Vec2::new(bounds.x + player.radius, bounds.y + player.radius),
                    Vec2::new(bounds.x + bounds.w - player.radius, bounds.y + bounds.h - player.radius),
                );
                resolve_obstacle_collisions(player, &obstacles);
            }
        }

        rotate_face_toward_target(player, dt);

        if displacement.length_squared() > 0.0 && !player.pos.approx_eq(player.last_broadcast_pos, combat.movement_threshold) {
            player.last_broadcast_pos = player.pos;
            moved.push((player.id.clone(), player.pos));
        }
        if !player.face.approx_eq(player.last_face, 1e-3) {
            player.last_face = player.face;
            aimed.push((player.id.clone(), player.face));
        }
    }

    for player_id in dash_ended {
        bus.emit(SimEvent::DashEnded { player_id });
    }
    for (player_id, pos) in moved {
        bus.emit(SimEvent::PlayerMove { player_id, pos });
    }
    for (player_id, dir) in aimed {
        bus.emit(SimEvent::PlayerAimed { player_id, dir });
    }
}

/// Pushes `player` out of any overlapping obstacle along the shortest
/// penetration vector to the closest point on that rect.
fn resolve_obstacle_collisions(player: &mut Player, obstacles: &[Rect]) {
    for rect in obstacles {
        let closest = rect.closest_point(player.pos);
        let delta = player.pos - closest;
        let dist = delta.length();
        if dist < player.radius {
            let push_dir = delta.normalize().unwrap_or(Vec2::UNIT_X);
            player.pos = closest + push_dir * player.radius;
        }
    }
}

/// Resolves the outward wall normal for a projectile found *inside* an
/// obstacle rect (point-in-rect collision, not circle-vs-rect), by picking
/// the axis with the smallest penetration depth — the edge the projectile
/// must have crossed most recently — and returns that normal along with
/// the point on that edge nearest `pos`, to push the projectile back out.
/// `Rect::closest_point` cannot be used here: for an interior point it
/// clamps to `pos` itself, giving a zero delta and a meaningless normal.
fn penetration_normal_and_edge(rect: &Rect, pos: Vec2) -> (Vec2, Vec2) {
    let left = pos.x - rect.x;
    let right = (rect.x + rect.w) - pos.x;
    let top = pos.y - rect.y;
    let bottom = (rect.y + rect.h) - pos.y;

    let min = left.min(right).min(top).min(bottom);
    if min == left {
        (Vec2::new(-1.0, 0.0), Vec2::new(rect.x, pos.y))
    } else if min == right {
        (Vec2::new(1.0, 0.0), Vec2::new(rect.x + rect.w, pos.y))
    } else if min == top {
        (Vec2::new(0.0, -1.0), Vec2::new(pos.x, rect.y))
    } else {
        (Vec2::new(0.0, 1.0), Vec2::new(pos.x, rect.y + rect.h))
    }
}

fn rotate_face_toward_target(player: &mut Player, dt: f64) {
    let max_angle = player.turn_speed * dt;
    let needed = player.face.signed_angle_to(player.face_target);
    let applied = needed.clamp(-max_angle, max_angle);
    player.face = player.face.rotate(applied);
}

fn run_heartbeat(world: &mut World, bus: &mut EventBus) {
    let mut refresh = Vec::new();
    for player in world.players.values_mut() {
        if player.is_dead {
            continue;
        }
        if player.pos.distance(player.last_heartbeat_pos) > 0.01 {
            player.last_heartbeat_pos = player.pos;
            refresh.push((player.id.clone(), player.pos));
        }
    }
    for (player_id, pos) in refresh {
        bus.emit(SimEvent::PlayerMove { player_id, pos });
    }
}

fn step_projectiles(world: &mut World, bus: &mut EventBus, config: &SimConfig, now: f64, dt: f64) {
    let bounds = world.bounds;
    let obstacles: Vec<Rect> = world.obstacles.iter().map(|o| o.rect).collect();
    let mut despawned = Vec::new();
    let mut moved = Vec::new();
    let mut bounced = Vec::new();
    let mut explosions = Vec::new();

    for projectile in world.projectiles.values_mut() {
        if projectile.is_expired(now) {
            if matches!(projectile.kind, arena_core::ProjectileKind::Rocket) {
                explosions.push(projectile.pos);
            }
            despawned.push(projectile.id);
            continue;
        }

        // Substep so a fast projectile (e.g. 1000 u/s at dt=0.1s) can't
        // tunnel clean through a thin wall between two whole-tick samples.
        let displacement = projectile.vel * dt;
        let magnitude = displacement.length();
        let steps = (magnitude / MAX_SUBSTEP_DISTANCE).ceil().max(1.0) as u32;
        let sub_disp = displacement * (1.0 / steps as f64);

        let mut despawn = false;
        let mut bounce_hit: Option<Vec2> = None;
        let mut explode_hit = false;

        for _ in 0..steps {
            projectile.pos = projectile.pos + sub_disp;

            if !bounds.contains(projectile.pos) {
                despawn = true;
                break;
            }

            if let Some(rect) = obstacles.iter().find(|r| r.contains(projectile.pos)) {
                if matches!(projectile.kind, arena_core::ProjectileKind::Rocket) {
                    explode_hit = true;
                    despawn = true;
                } else {
                    let (normal, edge) = penetration_normal_and_edge(rect, projectile.pos);
                    projectile.pos = edge + normal * (projectile.hit_radius + 0.01);
                    if projectile.bounce(normal) {
                        bounce_hit = Some(normal);
                    } else {
                        despawn = true;
                    }
                }
                break;
            }
        }

        if explode_hit {
            explosions.push(projectile.pos);
        }
        if despawn {
            despawned.push(projectile.id);
            continue;
        }
        if let Some(normal) = bounce_hit {
            bounced.push((projectile.id, normal));
            continue;
        }

        moved.push((projectile.id, projectile.pos));
    }

    for id in &despawned {
        world.projectiles.remove(id);
    }
    for pos in explosions {
        bus.emit(SimEvent::ExplosionSpawned { pos, radius: config.explosions.radius, damage: config.explosions.damage });
    }
    for (id, normal) in bounced {
        bus.emit(SimEvent::ProjectileBounced { id, normal });
    }
    for (id, pos) in moved {
        bus.emit(SimEvent::ProjectileMoved { id, pos });
    }
    for id in despawned {
        bus.emit(SimEvent::ProjectileDespawned { id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PlayerStats;
    use arena_core::{PlayerId, ProjectileId, ProjectileKind};

    fn bare_world() -> World {
        let config = SimConfig::default();
        World::new(&config)
    }

    #[test]
    fn player_clamps_to_bounds_at_a_corner() {
        let mut world = bare_world();
        let mut bus = EventBus::new();
        let config = SimConfig::default();
        let mut player = Player::spawn(
            PlayerId::from_string("p1"),
            "P1".into(),
            Vec2::new(5.0, 5.0),
            &config.player,
            PlayerStats::default(),
        );
        player.vel = Vec2::new(-1000.0, -1000.0);
        world.players.insert(player.id.clone(), player);

        let mut heartbeat = 0.0;
        step(&mut world, &mut bus, &config, 0.0, 0.1, &mut heartbeat);

        let p = &world.players[&PlayerId::from_string("p1")];
        assert!(p.pos.x >= p.radius - 1e-6);
        assert!(p.pos.y >= p.radius - 1e-6);
    }

    #[test]
    fn fast_projectile_does_not_tunnel_through_thick_wall() {
        let mut world = bare_world();
        world.obstacles.clear();
        world.obstacles.push(crate::world::Obstacle { rect: Rect::new(100.0, 0.0, 80.0, 1200.0) });
        let mut bus = EventBus::new();
        let config = SimConfig::default();

        // A whole-dt step (2000 u/s * 0.1s = 200 units) starting just
        // before the wall would land at x=295, clean past the far edge
        // (x=180) with no sample ever landing inside the rect. Substepping
        // must catch it mid-flight instead.
        let id = ProjectileId(1);
        world.projectiles.insert(
            id,
            crate::world::Projectile {
                id,
                owner: PlayerId::from_string("p1"),
                kind: ProjectileKind::Bullet,
                pos: Vec2::new(95.0, 500.0),
                vel: Vec2::new(2000.0, 0.0),
                hit_radius: 6.0,
                damage: 25.0,
                lifetime: 5000.0,
                spawn_time: 0.0,
                bounce_count: 0,
                max_bounces: 3,
                damage_dropoff: 0.8,
                velocity_retention: 0.9,
            },
        );

        let mut heartbeat = 0.0;
        step(&mut world, &mut bus, &config, 0.0, 0.1, &mut heartbeat);

        match world.projectiles.get(&id) {
            Some(p) => assert!(p.pos.x < 180.0, "projectile should not have tunneled past the wall"),
            None => {
                let log = bus.drain_log();
                assert!(log.iter().any(|e| matches!(e, SimEvent::ProjectileBounced { .. } | SimEvent::ProjectileDespawned { .. })));
            }
        }
    }

    #[test]
    fn bullet_bounces_off_a_horizontal_wall_along_the_y_axis() {
        let mut world = bare_world();
        world.obstacles.clear();
        world.obstacles.push(crate::world::Obstacle { rect: Rect::new(0.0, 100.0, 2000.0, 20.0) });
        let mut bus = EventBus::new();
        let config = SimConfig::default();

        let id = ProjectileId(1);
        world.projectiles.insert(
            id,
            crate::world::Projectile {
                id,
                owner: PlayerId::from_string("p1"),
                kind: ProjectileKind::Bullet,
                pos: Vec2::new(500.0, 90.0),
                vel: Vec2::new(0.0, 200.0),
                hit_radius: 6.0,
                damage: 25.0,
                lifetime: 5000.0,
                spawn_time: 0.0,
                bounce_count: 0,
                max_bounces: 3,
                damage_dropoff: 0.8,
                velocity_retention: 0.9,
            },
        );

        let mut heartbeat = 0.0;
        step(&mut world, &mut bus, &config, 0.0, 0.1, &mut heartbeat);

        let log = bus.drain_log();
        let normal = log.iter().find_map(|e| match e {
            SimEvent::ProjectileBounced { normal, .. } => Some(*normal),
            _ => None,
        });
        let normal = normal.expect("expected a projectile:bounced event");
        assert!(normal.x.abs() < 1e-9, "a horizontal wall must bounce along the y axis, got {normal:?}");
        assert!(normal.y < 0.0, "approaching from above should push back upward, got {normal:?}");

        let p = &world.projectiles[&id];
        assert!(p.vel.y < 0.0, "vertical velocity should have reflected, got {:?}", p.vel);
    }

    #[test]
    fn dash_end_emits_event_once_boost_expires() {
        let mut world = bare_world();
        let mut bus = EventBus::new();
        let config = SimConfig::default();
        let mut player = Player::spawn(
            PlayerId::from_string("p1"),
            "P1".into(),
            Vec2::new(500.0, 500.0),
            &config.player,
            PlayerStats::default(),
        );
        player.dash_until = 50.0;
        player.was_dashing = true;
        world.players.insert(player.id.clone(), player);

        let mut heartbeat = 0.0;
        step(&mut world, &mut bus, &config, 100.0, 0.016, &mut heartbeat);
        let log = bus.drain_log();
        assert!(log.iter().any(|e| matches!(e, SimEvent::DashEnded { .. })));
    }
}
