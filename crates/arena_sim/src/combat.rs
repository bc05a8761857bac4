//! Combat & streaks (C7): runs on `tick:post`. Resolves projectile-vs-player
//! hits, applies damage (respecting shield and i-frames), knocks back,
//! and resolves kills, assists, and streaks.
//!
//! **Design decision**: an explosion hit applies exactly one knockback
//! impulse, not two. Direct hits push the victim away from the shooter;
//! explosion hits push the victim away from the blast center. See
//! `DESIGN.md`.

use crate::bus::EventBus;
use crate::world::{DamageRecord, Knockback, World};
use arena_core::{PlayerId, SimConfig, SimEvent, Vec2, Weapon};
use std::collections::HashSet;

/// Runs one tick's combat resolution: projectile hits, damage application,
/// and kill/assist/streak bookkeeping.
pub fn step(world: &mut World, bus: &mut EventBus, config: &SimConfig, now: f64) {
    resolve_projectile_hits(world, bus, config, now);
}

fn weapon_for_kind(kind: arena_core::ProjectileKind) -> Weapon {
    match kind {
        arena_core::ProjectileKind::Bullet => Weapon::Bullet,
        arena_core::ProjectileKind::Pellet => Weapon::Pellet,
        arena_core::ProjectileKind::Rocket => Weapon::Rocket,
    }
}

fn resolve_projectile_hits(world: &mut World, bus: &mut EventBus, config: &SimConfig, now: f64) {
    let mut consumed = Vec::new();
    let mut direct_hits: Vec<(PlayerId, f64, PlayerId, Weapon)> = Vec::new();
    let mut rocket_explosions: Vec<(Vec2, f64, PlayerId)> = Vec::new();

    for projectile in world.projectiles.values() {
        for player in world.live_players() {
            if player.id == projectile.owner {
                continue;
            }
            let hit_radius = match projectile.kind {
                arena_core::ProjectileKind::Rocket => config.projectiles.rocket.hit_radius,
                _ => projectile.hit_radius,
            };
            if projectile.pos.distance(player.pos) <= hit_radius {
                consumed.push(projectile.id);
                match projectile.kind {
                    arena_core::ProjectileKind::Rocket => {
                        rocket_explosions.push((projectile.pos, projectile.damage, projectile.owner.clone()));
                    }
                    other => direct_hits.push((player.id.clone(), projectile.damage, projectile.owner.clone(), weapon_for_kind(other))),
                }
                break;
            }
        }
    }

    for id in &consumed {
        world.projectiles.remove(id);
    }

    for (pos, damage, owner) in rocket_explosions {
        bus.emit(SimEvent::ExplosionSpawned { pos, radius: config.explosions.radius, damage });
        let victims: Vec<PlayerId> = world
            .live_players()
            .filter(|p| p.pos.distance(pos) <= config.explosions.radius)
            .map(|p| p.id.clone())
            .collect();
        for victim_id in victims {
            apply_damage(world, bus, config, now, &victim_id, damage, Some(owner.clone()), Weapon::Explosion, pos);
        }
    }

    for (victim_id, damage, owner, weapon) in direct_hits {
        if let Some(shooter) = world.players.get_mut(&owner) {
            shooter.stats.shots_hit += 1;
        }
        let origin = world.players.get(&owner).map_or(victim_id_pos(world, &victim_id), |p| p.pos);
        apply_damage(world, bus, config, now, &victim_id, damage, Some(owner), weapon, origin);
    }
}

fn victim_id_pos(world: &World, victim_id: &PlayerId) -> Vec2 {
    world.players.get(victim_id).map_or(Vec2::ZERO, |p| p.pos)
}

/// Applies `amount` raw damage to `target_id`, honoring i-frames and
/// shield, records the contribution for assist resolution, applies a
/// knockback away from `knockback_origin`, and if this brings the target
/// to 0 hp, runs kill/assist/streak resolution.
#[allow(clippy::too_many_arguments)]
fn apply_damage(
    world: &mut World,
    bus: &mut EventBus,
    config: &SimConfig,
    now: f64,
    target_id: &PlayerId,
    amount: f64,
    source: Option<PlayerId>,
    weapon: Weapon,
    knockback_origin: Vec2,
) {
    let mut became_dead = false;
    let mut effective = 0.0;
    let mut assist_ids: Vec<PlayerId> = Vec::new();
    let mut knockback: Option<Knockback> = None;

    {
        let Some(player) = world.players.get_mut(target_id) else { return };
        if player.is_dead || player.has_iframes(now) {
            return;
        }

        effective = if player.is_shielded(now) { (amount * config.buffs.shield_reduction).ceil() } else { amount };
        player.hp = (player.hp - effective).max(0.0);
        player.stats.damage_taken += effective;

        player.recent_damage.retain(|r| now - r.timestamp <= config.combat.assist_time_window);
        player.recent_damage.push(DamageRecord { source: source.clone(), timestamp: now, amount: effective, weapon });

        let dir = (player.pos - knockback_origin).normalize_or_unit_x();
        let magnitude = effective * config.explosions.knockback_power;
        let kb = Knockback { vx: dir.x * magnitude, vy: dir.y * magnitude, until: now + config.combat.knockback_duration };
        player.kb = Some(kb);
        knockback = Some(kb);

        if player.hp <= 0.0 && !player.is_dead {
            became_dead = true;
            player.is_dead = true;
            player.died_at = Some(now);
            player.stats.deaths += 1;
            player.stats.current_streak = 0;
            player.stats.last_death_time = Some(now);

            let mut seen = HashSet::new();
            for record in &player.recent_damage {
                if let Some(contributor) = &record.source {
                    if Some(contributor.clone()) == source {
                        continue;
                    }
                    if seen.insert(contributor.clone()) {
                        assist_ids.push(contributor.clone());
                    }
                }
            }

            player.dead_until = Some(now + 5000.0);
            player.recent_damage.clear();
        }
    }

    if let Some(source_id) = &source {
        if let Some(shooter) = world.players.get_mut(source_id) {
            shooter.stats.damage_dealt += effective;
        }
    }

    bus.emit(SimEvent::DamageApplied { target_id: target_id.clone(), amount: effective, source: source.clone(), weapon });
    if let Some(kb) = knockback {
        bus.emit(SimEvent::KnockbackApplied { player_id: target_id.clone(), vx: kb.vx, vy: kb.vy, duration: config.combat.knockback_duration });
    }

    if became_dead {
        resolve_kill(world, bus, now, target_id, source, assist_ids, weapon);
    }
}

fn resolve_kill(
    world: &mut World,
    bus: &mut EventBus,
    now: f64,
    victim_id: &PlayerId,
    source: Option<PlayerId>,
    assist_ids: Vec<PlayerId>,
    weapon: Weapon,
) {
    let dead_until = world.players.get(victim_id).and_then(|p| p.dead_until).unwrap_or(now + 5000.0);

    let killer_id = source.filter(|id| id != victim_id);
    if let Some(killer_id) = killer_id.clone() {
        let (streak, previous_streak) = {
            let Some(killer) = world.players.get_mut(&killer_id) else {
                bus.emit(SimEvent::PlayerDie { player_id: victim_id.clone() });
                emit_score_update(world, bus, victim_id);
                bus.emit(SimEvent::PlayerDead { player_id: victim_id.clone(), until: dead_until as u64 });
                return;
            };
            killer.stats.kills += 1;
            let previous_streak = killer.stats.current_streak;
            killer.stats.current_streak += 1;
            killer.stats.best_streak = killer.stats.best_streak.max(killer.stats.current_streak);
            killer.stats.last_kill_time = Some(now);
            (killer.stats.current_streak, previous_streak)
        };
        bus.emit(SimEvent::StreakChanged { player_id: killer_id.clone(), streak, previous_streak });

        for assist_id in &assist_ids {
            if let Some(assister) = world.players.get_mut(assist_id) {
                assister.stats.assists += 1;
            }
        }

        bus.emit(SimEvent::PlayerKill { killer_id: killer_id.clone(), victim_id: victim_id.clone(), assist_ids: assist_ids.clone(), weapon });
        bus.emit(SimEvent::FeedEntry { killer: Some(killer_id.clone()), victim: victim_id.clone(), weapon, assist_ids: assist_ids.clone(), timestamp: now as u64 });

        emit_score_update(world, bus, &killer_id);
        for assist_id in &assist_ids {
            emit_score_update(world, bus, assist_id);
        }
    } else {
        bus.emit(SimEvent::FeedEntry { killer: None, victim: victim_id.clone(), weapon, assist_ids: Vec::new(), timestamp: now as u64 });
    }

    bus.emit(SimEvent::PlayerDie { player_id: victim_id.clone() });
    emit_score_update(world, bus, victim_id);
    bus.emit(SimEvent::PlayerDead { player_id: victim_id.clone(), until: dead_until as u64 });
}

fn emit_score_update(world: &World, bus: &mut EventBus, player_id: &PlayerId) {
    if let Some(player) = world.players.get(player_id) {
        bus.emit(SimEvent::ScoreUpdate {
            player_id: player_id.clone(),
            kills: player.stats.kills,
            deaths: player.stats.deaths,
            assists: player.stats.assists,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Player, PlayerStats};
    use arena_core::ProjectileId;

    fn world_with_two_players() -> World {
        let config = SimConfig::default();
        let mut world = World::new(&config);
        let p1 = Player::spawn(PlayerId::from_string("p1"), "P1".into(), Vec2::new(0.0, 0.0), &config.player, PlayerStats::default());
        let p2 = Player::spawn(PlayerId::from_string("p2"), "P2".into(), Vec2::new(10.0, 0.0), &config.player, PlayerStats::default());
        world.players.insert(p1.id.clone(), p1);
        world.players.insert(p2.id.clone(), p2);
        world
    }

    #[test]
    fn bullet_hit_applies_damage_and_knockback() {
        let mut world = world_with_two_players();
        let mut bus = EventBus::new();
        let config = SimConfig::default();
        world.projectiles.insert(
            ProjectileId(1),
            crate::world::Projectile {
                id: ProjectileId(1),
                owner: PlayerId::from_string("p1"),
                kind: arena_core::ProjectileKind::Bullet,
                pos: Vec2::new(10.0, 0.0),
                vel: Vec2::new(100.0, 0.0),
                hit_radius: 6.0,
                damage: 25.0,
                lifetime: 1500.0,
                spawn_time: 0.0,
                bounce_count: 0,
                max_bounces: 3,
                damage_dropoff: 0.8,
                velocity_retention: 0.9,
            },
        );

        step(&mut world, &mut bus, &config, 0.0);

        let victim = &world.players[&PlayerId::from_string("p2")];
        assert_eq!(victim.hp, 75.0);
        assert!(victim.kb.is_some());
        assert!(world.projectiles.is_empty());
    }

    #[test]
    fn damage_dealt_accrues_on_the_shooter() {
        let mut world = world_with_two_players();
        let mut bus = EventBus::new();
        let config = SimConfig::default();

        apply_damage(&mut world, &mut bus, &config, 0.0, &PlayerId::from_string("p2"), 25.0, Some(PlayerId::from_string("p1")), Weapon::Bullet, Vec2::ZERO);

        assert_eq!(world.players[&PlayerId::from_string("p1")].stats.damage_dealt, 25.0);
    }

    #[test]
    fn shield_rounds_damage_up() {
        let mut world = world_with_two_players();
        let mut bus = EventBus::new();
        let config = SimConfig::default();
        world.players.get_mut(&PlayerId::from_string("p2")).unwrap().shield_until = 1000.0;

        apply_damage(&mut world, &mut bus, &config, 0.0, &PlayerId::from_string("p2"), 1.0, Some(PlayerId::from_string("p1")), Weapon::Bullet, Vec2::ZERO);

        let victim = &world.players[&PlayerId::from_string("p2")];
        assert_eq!(victim.hp, 99.0);
    }

    #[test]
    fn iframes_ignore_damage() {
        let mut world = world_with_two_players();
        let mut bus = EventBus::new();
        let config = SimConfig::default();
        world.players.get_mut(&PlayerId::from_string("p2")).unwrap().iframe_until = 1000.0;

        apply_damage(&mut world, &mut bus, &config, 0.0, &PlayerId::from_string("p2"), 25.0, Some(PlayerId::from_string("p1")), Weapon::Bullet, Vec2::ZERO);

        assert_eq!(world.players[&PlayerId::from_string("p2")].hp, 100.0);
    }

    #[test]
    fn lethal_damage_resolves_kill_with_assist() {
        let mut world = world_with_two_players();
        let p3 = Player::spawn(PlayerId::from_string("p3"), "P3".into(), Vec2::new(5.0, 0.0), &SimConfig::default().player, PlayerStats::default());
        world.players.insert(p3.id.clone(), p3);
        let mut bus = EventBus::new();
        let config = SimConfig::default();
        let victim = PlayerId::from_string("p3");
        let assister = PlayerId::from_string("p1");
        let killer = PlayerId::from_string("p2");

        apply_damage(&mut world, &mut bus, &config, 0.0, &victim, 50.0, Some(assister.clone()), Weapon::Bullet, Vec2::ZERO);
        apply_damage(&mut world, &mut bus, &config, 1000.0, &victim, 50.0, Some(killer.clone()), Weapon::Bullet, Vec2::ZERO);

        let log = bus.drain_log();
        let kill = log.iter().find_map(|e| match e {
            SimEvent::PlayerKill { killer_id, victim_id, assist_ids, .. } => Some((killer_id.clone(), victim_id.clone(), assist_ids.clone())),
            _ => None,
        });
        let (killer_id, victim_id, assist_ids) = kill.expect("expected a player:kill event");
        assert_eq!(killer_id, killer);
        assert_eq!(victim_id, victim);
        assert_eq!(assist_ids, vec![assister]);
        assert!(world.players[&victim].is_dead);
        assert_eq!(world.players[&killer].stats.kills, 1);
    }
}
