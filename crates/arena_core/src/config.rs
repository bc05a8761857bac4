//! Simulation configuration.
//!
//! Every field here is named in spec §6 "Configuration". Values are loaded
//! from an optional TOML file and layered with defaults; [`SimConfig::validate`]
//! is run once at startup and fails fast with every violated constraint
//! listed, per spec §7.

use crate::error::ArenaError;
use serde::{Deserialize, Serialize};

/// World bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World width in world units.
    pub width: f64,
    /// World height in world units.
    pub height: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { width: 2000.0, height: 1200.0 }
    }
}

/// Player movement and combat baseline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Maximum hit points.
    pub hp: f64,
    /// Base movement speed, world units/sec.
    pub speed: f64,
    /// Collision radius.
    pub radius: f64,
    /// Maximum facing turn rate, radians/sec.
    pub turn_speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { hp: 100.0, speed: 220.0, radius: 16.0, turn_speed: 10.0 }
    }
}

/// Bullet-specific projectile tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    /// Damage per hit before bounce dropoff.
    pub damage: f64,
    /// Lifetime in milliseconds.
    pub lifetime: f64,
    /// Maximum number of wall bounces before despawn.
    pub max_bounces: u32,
    /// Damage multiplier applied per bounce.
    pub damage_dropoff: f64,
    /// Velocity multiplier applied per bounce.
    pub velocity_retention: f64,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self { damage: 25.0, lifetime: 1500.0, max_bounces: 3, damage_dropoff: 0.8, velocity_retention: 0.9 }
    }
}

/// Shotgun-pellet-specific projectile tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PelletConfig {
    /// Damage per hit before bounce dropoff.
    pub damage: f64,
    /// Lifetime in milliseconds.
    pub lifetime: f64,
    /// Maximum number of wall bounces before despawn.
    pub max_bounces: u32,
    /// Damage multiplier applied per bounce.
    pub damage_dropoff: f64,
    /// Velocity multiplier applied per bounce.
    pub velocity_retention: f64,
    /// Number of pellets fired per shotgun cast.
    pub count: u32,
    /// Half-angle (radians) of the pellet spread cone.
    pub spread: f64,
}

impl Default for PelletConfig {
    fn default() -> Self {
        Self {
            damage: 17.0,
            lifetime: 500.0,
            max_bounces: 2,
            damage_dropoff: 0.7,
            velocity_retention: 0.85,
            count: 8,
            spread: 0.35,
        }
    }
}

/// Rocket-specific projectile tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocketConfig {
    /// Direct-impact damage; also feeds explosion damage unless overridden.
    pub damage: f64,
    /// Travel speed, world units/sec.
    pub speed: f64,
    /// Lifetime in milliseconds.
    pub lifetime: f64,
    /// Hit radius against players and walls.
    pub hit_radius: f64,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self { damage: 60.0, speed: 420.0, lifetime: 2500.0, hit_radius: 18.0 }
    }
}

/// Projectile tuning shared across all weapon kinds plus per-kind overrides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectilesConfig {
    /// Default hit radius for bullets/pellets.
    pub hit_radius: f64,
    /// Base travel speed shared by bullets and pellets, world units/sec.
    pub base_speed: f64,
    /// Bullet tuning.
    pub bullet: BulletConfig,
    /// Pellet tuning.
    pub pellet: PelletConfig,
    /// Rocket tuning.
    pub rocket: RocketConfig,
}

impl Default for ProjectilesConfig {
    fn default() -> Self {
        Self {
            hit_radius: 6.0,
            base_speed: 640.0,
            bullet: BulletConfig::default(),
            pellet: PelletConfig::default(),
            rocket: RocketConfig::default(),
        }
    }
}

/// Explosion (rocket splash) tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionsConfig {
    /// Splash radius.
    pub radius: f64,
    /// Splash damage dealt to everyone caught inside the radius.
    pub damage: f64,
    /// Knockback scalar: knockback magnitude = damage * knockback_power.
    pub knockback_power: f64,
}

impl Default for ExplosionsConfig {
    fn default() -> Self {
        Self { radius: 110.0, damage: 60.0, knockback_power: 4.0 }
    }
}

/// Per-skill cast cooldowns, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownsConfig {
    /// `skill:shoot` cooldown.
    pub shoot: f64,
    /// `skill:shotgun` cooldown.
    pub shotgun: f64,
    /// `skill:rocket` cooldown.
    pub rocket: f64,
    /// `skill:dash` cooldown.
    pub dash: f64,
}

impl Default for CooldownsConfig {
    fn default() -> Self {
        Self { shoot: 250.0, shotgun: 900.0, rocket: 1400.0, dash: 2500.0 }
    }
}

/// Pickup buff tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffsConfig {
    /// Speed multiplier while haste is active.
    pub haste_multiplier: f64,
    /// Fraction of incoming damage retained while shielded (rounded up).
    pub shield_reduction: f64,
    /// Default haste duration, milliseconds.
    pub haste_default_duration: f64,
    /// Default shield duration, milliseconds.
    pub shield_default_duration: f64,
}

impl Default for BuffsConfig {
    fn default() -> Self {
        Self {
            haste_multiplier: 1.6,
            shield_reduction: 0.5,
            haste_default_duration: 5000.0,
            shield_default_duration: 5000.0,
        }
    }
}

/// Combat pacing shared across components.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Duration of a generic knockback impulse, milliseconds.
    pub knockback_duration: f64,
    /// Window during which non-killing damage counts as an assist, ms.
    pub assist_time_window: f64,
    /// Interval between forced position-rebroadcast heartbeats, ms.
    pub heartbeat_interval: f64,
    /// Minimum position delta (per axis) that triggers a `player:move`.
    pub movement_threshold: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            knockback_duration: 220.0,
            assist_time_window: 5000.0,
            heartbeat_interval: 1000.0,
            movement_threshold: 0.5,
        }
    }
}

/// Spawn-point selection tuning (spec §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Inset from the left edge excluded from spawn candidates.
    pub margin_left: f64,
    /// Inset from the right edge excluded from spawn candidates.
    pub margin_right: f64,
    /// Inset from the top edge excluded from spawn candidates.
    pub margin_top: f64,
    /// Inset from the bottom edge excluded from spawn candidates.
    pub margin_bottom: f64,
    /// Minimum allowed distance from any live player.
    pub min_distance_from_players: f64,
    /// Rejection-sampling attempt budget before falling back.
    pub max_attempts: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            margin_left: 60.0,
            margin_right: 60.0,
            margin_top: 60.0,
            margin_bottom: 60.0,
            min_distance_from_players: 220.0,
            max_attempts: 20,
        }
    }
}

/// Match lifecycle pacing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Countdown duration before a match goes active, ms.
    pub countdown_ms: f64,
    /// Match duration once active, ms. `None` means no automatic end.
    pub duration_ms: Option<f64>,
    /// Delay after `ended` before the match slot clears, ms.
    pub end_linger_ms: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { countdown_ms: 5000.0, duration_ms: Some(5 * 60 * 1000.0), end_linger_ms: 10_000.0 }
    }
}

/// The complete, validated simulation configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World bounds.
    pub world: WorldConfig,
    /// Player baseline stats.
    pub player: PlayerConfig,
    /// Projectile tuning.
    pub projectiles: ProjectilesConfig,
    /// Explosion tuning.
    pub explosions: ExplosionsConfig,
    /// Skill cooldowns.
    pub cooldowns: CooldownsConfig,
    /// Pickup buff tuning.
    pub buffs: BuffsConfig,
    /// Combat pacing.
    pub combat: CombatConfig,
    /// Spawn point selection.
    pub spawn: SpawnConfig,
    /// Match lifecycle pacing.
    pub game_match: MatchConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            player: PlayerConfig::default(),
            projectiles: ProjectilesConfig::default(),
            explosions: ExplosionsConfig::default(),
            cooldowns: CooldownsConfig::default(),
            buffs: BuffsConfig::default(),
            combat: CombatConfig::default(),
            spawn: SpawnConfig::default(),
            game_match: MatchConfig::default(),
        }
    }
}

impl SimConfig {
    /// Validates every numeric constraint named in spec §7, collecting
    /// *all* violations rather than failing on the first one.
    pub fn validate(&self) -> Result<(), ArenaError> {
        let mut violations = Vec::new();

        let positive = |name: &str, value: f64, violations: &mut Vec<String>| {
            if !(value > 0.0) {
                violations.push(format!("{name} must be positive, got {value}"));
            }
        };
        let unit_interval = |name: &str, value: f64, violations: &mut Vec<String>| {
            if !(0.0..=1.0).contains(&value) {
                violations.push(format!("{name} must be in [0, 1], got {value}"));
            }
        };

        positive("world.width", self.world.width, &mut violations);
        positive("world.height", self.world.height, &mut violations);
        positive("player.hp", self.player.hp, &mut violations);
        positive("player.speed", self.player.speed, &mut violations);
        positive("player.radius", self.player.radius, &mut violations);
        positive("player.turn_speed", self.player.turn_speed, &mut violations);

        positive("projectiles.hit_radius", self.projectiles.hit_radius, &mut violations);
        positive("projectiles.base_speed", self.projectiles.base_speed, &mut violations);
        unit_interval("projectiles.bullet.damage_dropoff", self.projectiles.bullet.damage_dropoff, &mut violations);
        unit_interval("projectiles.bullet.velocity_retention", self.projectiles.bullet.velocity_retention, &mut violations);
        unit_interval("projectiles.pellet.damage_dropoff", self.projectiles.pellet.damage_dropoff, &mut violations);
        unit_interval("projectiles.pellet.velocity_retention", self.projectiles.pellet.velocity_retention, &mut violations);
        positive("projectiles.rocket.speed", self.projectiles.rocket.speed, &mut violations);
        positive("projectiles.rocket.hit_radius", self.projectiles.rocket.hit_radius, &mut violations);

        positive("explosions.radius", self.explosions.radius, &mut violations);

        positive("cooldowns.shoot", self.cooldowns.shoot, &mut violations);
        positive("cooldowns.shotgun", self.cooldowns.shotgun, &mut violations);
        positive("cooldowns.rocket", self.cooldowns.rocket, &mut violations);
        positive("cooldowns.dash", self.cooldowns.dash, &mut violations);

        unit_interval("buffs.shield_reduction", self.buffs.shield_reduction, &mut violations);
        positive("buffs.haste_multiplier", self.buffs.haste_multiplier, &mut violations);

        positive("combat.heartbeat_interval", self.combat.heartbeat_interval, &mut violations);
        positive("combat.assist_time_window", self.combat.assist_time_window, &mut violations);

        if self.spawn.margin_left + self.spawn.margin_right >= self.world.width {
            violations.push("spawn margins (left+right) must leave room inside world.width".to_string());
        }
        if self.spawn.margin_top + self.spawn.margin_bottom >= self.world.height {
            violations.push("spawn margins (top+bottom) must leave room inside world.height".to_string());
        }
        if self.spawn.max_attempts == 0 {
            violations.push("spawn.max_attempts must be positive".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ArenaError::InvalidConfiguration { violations })
        }
    }
}
