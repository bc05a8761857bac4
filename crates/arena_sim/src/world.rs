//! World state (C1): the authoritative mapping from entity id to
//! player/projectile/pickup records, plus world bounds and the static
//! obstacle layout.
//!
//! `World` holds no behavior of its own — every other module in this
//! crate borrows it mutably and applies its own rules. Cross-references
//! between entities are always ids, never pointers.

use arena_core::{MatchId, PickupId, PickupKind, PlayerId, ProjectileId, ProjectileKind, Rect, SimConfig, Vec2};
use std::collections::{HashMap, HashSet};

/// A static rectangular obstacle, loaded once at map initialization.
#[derive(Clone, Copy, Debug)]
pub struct Obstacle {
    /// The obstacle's world-space rectangle.
    pub rect: Rect,
}

/// Per-skill cooldown expiry, each an absolute timestamp in ms; `0.0`
/// means the skill is free to cast.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cooldowns {
    /// `skill:shoot` expiry.
    pub shoot: f64,
    /// `skill:shotgun` expiry.
    pub shotgun: f64,
    /// `skill:rocket` expiry.
    pub rocket: f64,
    /// `skill:dash` expiry.
    pub dash: f64,
}

impl Cooldowns {
    /// True if `skill`'s cooldown has expired as of `now`.
    #[must_use]
    pub fn is_free(&self, skill: arena_core::Skill, now: f64) -> bool {
        self.expiry(skill) <= now
    }

    fn expiry(&self, skill: arena_core::Skill) -> f64 {
        match skill {
            arena_core::Skill::Shoot => self.shoot,
            arena_core::Skill::Shotgun => self.shotgun,
            arena_core::Skill::Rocket => self.rocket,
            arena_core::Skill::Dash => self.dash,
        }
    }

    fn set(&mut self, skill: arena_core::Skill, expiry: f64) {
        match skill {
            arena_core::Skill::Shoot => self.shoot = expiry,
            arena_core::Skill::Shotgun => self.shotgun = expiry,
            arena_core::Skill::Rocket => self.rocket = expiry,
            arena_core::Skill::Dash => self.dash = expiry,
        }
    }

    /// Starts `skill`'s cooldown, expiring `duration_ms` from `now`.
    pub fn start(&mut self, skill: arena_core::Skill, now: f64, duration_ms: f64) {
        self.set(skill, now + duration_ms);
    }
}

/// A time-bounded knockback impulse.
#[derive(Clone, Copy, Debug)]
pub struct Knockback {
    /// X component of the extra velocity.
    pub vx: f64,
    /// Y component of the extra velocity.
    pub vy: f64,
    /// Absolute expiry timestamp in ms.
    pub until: f64,
}

/// Per-match, resettable player statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerStats {
    /// Confirmed kills.
    pub kills: u32,
    /// Deaths.
    pub deaths: u32,
    /// Assists on kills by other players.
    pub assists: u32,
    /// Current, unbroken kill streak.
    pub current_streak: u32,
    /// Highest streak reached this match.
    pub best_streak: u32,
    /// Cumulative damage dealt.
    pub damage_dealt: f64,
    /// Cumulative damage taken.
    pub damage_taken: f64,
    /// Shots fired (each cast of a damaging skill counts once).
    pub shots_fired: u32,
    /// Shots that registered a hit.
    pub shots_hit: u32,
    /// When this player's current match participation began, in ms.
    pub match_start_time: f64,
    /// Timestamp of the last kill, if any.
    pub last_kill_time: Option<f64>,
    /// Timestamp of the last death, if any.
    pub last_death_time: Option<f64>,
}

/// A damage contribution recorded for assist resolution.
#[derive(Clone, Copy, Debug)]
pub struct DamageRecord {
    /// Who dealt the damage (absent for environmental sources).
    pub source: Option<PlayerId>,
    /// When the damage landed, in ms.
    pub timestamp: f64,
    /// How much damage landed.
    pub amount: f64,
    /// What dealt it.
    pub weapon: arena_core::Weapon,
}

/// A connected player and all of their simulation state.
#[derive(Clone, Debug)]
pub struct Player {
    /// Stable id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// World position.
    pub pos: Vec2,
    /// Current velocity (pre-effects).
    pub vel: Vec2,
    /// Current facing direction (unit vector), rotates toward `face_target`.
    pub face: Vec2,
    /// Desired facing direction (unit vector), set by `cmd:aim`.
    pub face_target: Vec2,
    /// Hit points, `0..=100`.
    pub hp: f64,
    /// Collision radius.
    pub radius: f64,
    /// Base movement speed.
    pub speed: f64,
    /// Turn rate in radians/second.
    pub turn_speed: f64,
    /// Per-skill cooldowns.
    pub cooldowns: Cooldowns,
    /// Active i-frame expiry, if any.
    pub iframe_until: f64,
    /// Active dash expiry, if any.
    pub dash_until: f64,
    /// Active haste expiry, if any.
    pub haste_until: f64,
    /// Active shield expiry, if any.
    pub shield_until: f64,
    /// Active knockback impulse, if any.
    pub kb: Option<Knockback>,
    /// Velocity multiplier while dashing.
    pub dash_factor: f64,
    /// Velocity multiplier while hasted.
    pub haste_factor: f64,
    /// Match statistics.
    pub stats: PlayerStats,
    /// Whether this player is currently dead.
    pub is_dead: bool,
    /// When this player died, if dead.
    pub died_at: Option<f64>,
    /// Respawn eligible no earlier than this timestamp.
    pub dead_until: Option<f64>,
    /// Recent damage contributions toward this player, for assist resolution.
    pub recent_damage: Vec<DamageRecord>,
    /// Last position broadcast via `player:move`.
    pub last_broadcast_pos: Vec2,
    /// Last facing broadcast via `player:aimed`.
    pub last_face: Vec2,
    /// Last move direction accepted from `cmd:move`, for input dedup.
    pub last_move_dir: Vec2,
    /// Position at the last heartbeat snapshot.
    pub last_heartbeat_pos: Vec2,
    /// Whether this player was dashing as of the previous tick (for
    /// `dash:ended` edge detection).
    pub was_dashing: bool,
}

impl Player {
    /// Creates a freshly (re)spawned player: full hp, no cooldowns, no
    /// effects, preserving `stats` (callers reset stats separately when a
    /// true join rather than a respawn is intended).
    #[must_use]
    pub fn spawn(id: PlayerId, name: String, pos: Vec2, cfg: &arena_core::config::PlayerConfig, stats: PlayerStats) -> Self {
        Self {
            id,
            name,
            pos,
            vel: Vec2::ZERO,
            face: Vec2::UNIT_X,
            face_target: Vec2::UNIT_X,
            hp: cfg.hp,
            radius: cfg.radius,
            speed: cfg.speed,
            turn_speed: cfg.turn_speed,
            cooldowns: Cooldowns::default(),
            iframe_until: 0.0,
            dash_until: 0.0,
            haste_until: 0.0,
            shield_until: 0.0,
            kb: None,
            dash_factor: 1.0,
            haste_factor: 1.0,
            stats,
            is_dead: false,
            died_at: None,
            dead_until: None,
            recent_damage: Vec::new(),
            last_broadcast_pos: pos,
            last_face: Vec2::UNIT_X,
            last_move_dir: Vec2::ZERO,
            last_heartbeat_pos: pos,
            was_dashing: false,
        }
    }

    /// True if haste is currently active.
    #[must_use]
    pub fn is_hasted(&self, now: f64) -> bool {
        self.haste_until > now
    }

    /// True if shield is currently active.
    #[must_use]
    pub fn is_shielded(&self, now: f64) -> bool {
        self.shield_until > now
    }

    /// True if i-frames are currently active.
    #[must_use]
    pub fn has_iframes(&self, now: f64) -> bool {
        self.iframe_until > now
    }

    /// True if currently dashing.
    #[must_use]
    pub fn is_dashing(&self, now: f64) -> bool {
        self.dash_until > now
    }
}

/// A live projectile.
#[derive(Clone, Debug)]
pub struct Projectile {
    /// Id.
    pub id: ProjectileId,
    /// The player who fired it.
    pub owner: PlayerId,
    /// Ballistic family.
    pub kind: ProjectileKind,
    /// World position.
    pub pos: Vec2,
    /// Velocity.
    pub vel: Vec2,
    /// Hit radius against players and (for rockets) walls.
    pub hit_radius: f64,
    /// Current damage, reduced by `damage_dropoff` on each bounce.
    pub damage: f64,
    /// Fixed lifetime in ms.
    pub lifetime: f64,
    /// Spawn timestamp in ms.
    pub spawn_time: f64,
    /// Bounces used so far.
    pub bounce_count: u32,
    /// Maximum bounces before despawning instead of bouncing.
    pub max_bounces: u32,
    /// Damage multiplier applied on each bounce.
    pub damage_dropoff: f64,
    /// Velocity multiplier applied on each bounce.
    pub velocity_retention: f64,
}

impl Projectile {
    /// Age in ms as of `now`.
    #[must_use]
    pub fn age(&self, now: f64) -> f64 {
        now - self.spawn_time
    }

    /// True once past `lifetime`.
    #[must_use]
    pub fn is_expired(&self, now: f64) -> bool {
        self.age(now) >= self.lifetime
    }

    /// Reflects `vel` across `normal`, applies velocity retention and damage
    /// dropoff, and increments the bounce counter. Returns `false` if the
    /// projectile has exhausted its bounce budget (caller should despawn
    /// instead of continuing).
    #[must_use]
    pub fn bounce(&mut self, normal: Vec2) -> bool {
        if self.bounce_count >= self.max_bounces {
            return false;
        }
        let d = self.vel.dot(normal);
        self.vel = (self.vel - normal * (2.0 * d)) * self.velocity_retention;
        self.damage *= self.damage_dropoff;
        self.bounce_count += 1;
        true
    }
}

/// A collectible pickup.
#[derive(Clone, Copy, Debug)]
pub struct Pickup {
    /// Id.
    pub id: PickupId,
    /// World position.
    pub pos: Vec2,
    /// Kind, determines the buff applied on collection.
    pub kind: PickupKind,
}

/// Match lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    /// No match running.
    Idle,
    /// Countdown before going active.
    Countdown,
    /// Match is live.
    Active,
    /// Match has ended, lingering before cleanup.
    Ended,
}

/// The single current match, if any.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Id.
    pub id: MatchId,
    /// Game mode label.
    pub mode: String,
    /// Current phase.
    pub phase: MatchPhase,
    /// When the match goes active, if in countdown.
    pub starts_at: Option<f64>,
    /// When the match ends, if a fixed duration was configured.
    pub ends_at: Option<f64>,
    /// Players who have participated in this match.
    pub players: HashSet<PlayerId>,
}

/// The authoritative world: every entity, the bounds, and the static map.
pub struct World {
    /// World bounds rectangle.
    pub bounds: Rect,
    /// Static obstacles.
    pub obstacles: Vec<Obstacle>,
    /// Connected players, keyed by id.
    pub players: HashMap<PlayerId, Player>,
    /// Live projectiles, keyed by id.
    pub projectiles: HashMap<ProjectileId, Projectile>,
    /// Live pickups, keyed by id.
    pub pickups: HashMap<PickupId, Pickup>,
    /// The single current match, if one has been created.
    pub current_match: Option<MatchState>,
}

impl World {
    /// Builds a fresh world from configuration, with a default obstacle
    /// layout (four walls framing the inner play area).
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        let bounds = Rect::new(0.0, 0.0, config.world.width, config.world.height);
        Self {
            obstacles: default_obstacles(&bounds),
            bounds,
            players: HashMap::new(),
            projectiles: HashMap::new(),
            pickups: HashMap::new(),
            current_match: None,
        }
    }

    /// Live (non-dead) players.
    pub fn live_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| !p.is_dead)
    }

    /// Live (non-dead) players, mutable.
    pub fn live_players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut().filter(|p| !p.is_dead)
    }
}

/// A small default layout: four rectangular pillars inset from the
/// bounds, used when no map data is otherwise supplied.
fn default_obstacles(bounds: &Rect) -> Vec<Obstacle> {
    let w = bounds.w * 0.08;
    let h = bounds.h * 0.08;
    let positions = [
        (bounds.w * 0.25, bounds.h * 0.25),
        (bounds.w * 0.75 - w, bounds.h * 0.25),
        (bounds.w * 0.25, bounds.h * 0.75 - h),
        (bounds.w * 0.75 - w, bounds.h * 0.75 - h),
    ];
    positions
        .into_iter()
        .map(|(x, y)| Obstacle { rect: Rect::new(x, y, w, h) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldowns_start_and_free() {
        let mut cd = Cooldowns::default();
        assert!(cd.is_free(arena_core::Skill::Shoot, 0.0));
        cd.start(arena_core::Skill::Shoot, 100.0, 250.0);
        assert!(!cd.is_free(arena_core::Skill::Shoot, 200.0));
        assert!(cd.is_free(arena_core::Skill::Shoot, 350.0));
    }

    #[test]
    fn projectile_bounce_applies_dropoff_and_retention() {
        let mut p = Projectile {
            id: ProjectileId(1),
            owner: PlayerId::from_string("p1"),
            kind: ProjectileKind::Bullet,
            pos: Vec2::ZERO,
            vel: Vec2::new(10.0, 0.0),
            hit_radius: 6.0,
            damage: 25.0,
            lifetime: 1500.0,
            spawn_time: 0.0,
            bounce_count: 0,
            max_bounces: 3,
            damage_dropoff: 0.8,
            velocity_retention: 0.9,
        };
        assert!(p.bounce(Vec2::new(-1.0, 0.0)));
        assert!((p.damage - 20.0).abs() < 1e-9);
        assert!((p.vel.x - (-9.0)).abs() < 1e-9);
        assert_eq!(p.bounce_count, 1);
    }

    #[test]
    fn bounce_fails_past_max_bounces() {
        let mut p = Projectile {
            id: ProjectileId(1),
            owner: PlayerId::from_string("p1"),
            kind: ProjectileKind::Rocket,
            pos: Vec2::ZERO,
            vel: Vec2::new(10.0, 0.0),
            hit_radius: 18.0,
            damage: 60.0,
            lifetime: 2500.0,
            spawn_time: 0.0,
            bounce_count: 0,
            max_bounces: 0,
            damage_dropoff: 1.0,
            velocity_retention: 1.0,
        };
        assert!(!p.bounce(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn world_default_obstacles_are_inside_bounds() {
        let cfg = SimConfig::default();
        let world = World::new(&cfg);
        for obstacle in &world.obstacles {
            assert!(obstacle.rect.x >= 0.0 && obstacle.rect.x + obstacle.rect.w <= world.bounds.w);
        }
    }
}
