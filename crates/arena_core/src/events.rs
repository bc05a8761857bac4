//! The simulation's event vocabulary.
//!
//! [`SimEvent`] is a single discriminated union covering both inbound
//! commands (`cmd:*`) and simulation-produced events (`player:*`,
//! `projectile:*`, ...). Every component in the simulation communicates
//! exclusively through this type and the ids in [`crate::ids`] — never a
//! shared reference — per spec §9's "cyclic references" note.
//!
//! `kind()` returns the wire `type` string used both on outbound JSON
//! frames and as the event bus's topic key.

use crate::ids::{MatchId, PickupId, PlayerId, ProjectileId};
use crate::math::Vec2;
use serde::{Deserialize, Serialize};

/// Which skill a `cmd:cast` invokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// `skill:shoot` — single bullet along facing.
    Shoot,
    /// `skill:shotgun` — spread of pellets.
    Shotgun,
    /// `skill:rocket` — single rocket with splash damage.
    Rocket,
    /// `skill:dash` — burst of speed with i-frames.
    Dash,
}

/// Projectile kind, determines ballistics and bounce behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Fast, low damage, bounces up to 3 times.
    Bullet,
    /// Shotgun pellet, bounces up to 2 times.
    Pellet,
    /// Slow, high damage, explodes on any wall contact.
    Rocket,
}

/// What dealt a hit, for damage attribution and the kill feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    /// A bullet projectile.
    Bullet,
    /// A shotgun pellet.
    Pellet,
    /// A rocket direct hit.
    Rocket,
    /// A rocket's splash.
    Explosion,
}

/// Pickup kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    /// Restores HP.
    Heal,
    /// Grants a temporary speed multiplier.
    Haste,
    /// Grants temporary damage reduction.
    Shield,
}

/// HUD widget keys a connection may subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKey {
    /// Per-player kill/death/assist/hp table.
    Scoreboard,
    /// Current match phase.
    Match,
    /// Recent kill-feed entries.
    Feed,
    /// Per-player current kill streak.
    Streaks,
    /// Streak-milestone announcements.
    Announcements,
}

impl WidgetKey {
    /// All widget keys, in a stable order. Used to validate
    /// `cmd:hud:subscribe` payloads against the allowlist.
    pub const ALL: [WidgetKey; 5] = [
        WidgetKey::Scoreboard,
        WidgetKey::Match,
        WidgetKey::Feed,
        WidgetKey::Streaks,
        WidgetKey::Announcements,
    ];
}

/// The full simulation event vocabulary.
///
/// Variant names map 1:1 to the wire `type` strings returned by
/// [`SimEvent::kind`] (e.g. `PlayerJoin` <-> `"player:join"`).
///
/// `rename_all_fields` keeps every struct-variant's field names camelCase
/// (`player_id` -> `playerId`) so the flattened wire frame built by
/// `arena::transport::wire::encode_event` matches the documented
/// `{"type":"player:move","playerId":...}` shape, and so this shape is
/// consistent with the journal's own camelCase envelope (`JournalEntry`,
/// `JournalMetadata`). Variant tags themselves are left alone — they are
/// discarded at the transport boundary in favor of `kind()` — so this does
/// not affect `kind()`'s hardcoded wire strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum SimEvent {
    // ---- inbound commands, emitted onto the bus by the transport adapter
    /// A new player has joined (id already allocated by the adapter).
    CmdJoin { player_id: PlayerId, name: String },
    /// Movement input.
    CmdMove { player_id: PlayerId, dir: Vec2 },
    /// Aim input.
    CmdAim { player_id: PlayerId, dir: Vec2 },
    /// A skill cast request.
    CmdCast { player_id: PlayerId, skill: Skill },
    /// A respawn request.
    CmdRespawn { player_id: PlayerId },
    /// The player disconnected or explicitly left.
    CmdLeave { player_id: PlayerId },

    // ---- tick boundaries
    /// Start-of-tick: movement and projectile integration run here.
    TickPre { dt: f64 },
    /// End-of-tick: combat, pickups, match scheduling, HUD dirty pass.
    TickPost { dt: f64 },

    // ---- player lifecycle / movement
    /// A player (re)joined or respawned.
    PlayerJoin { player_id: PlayerId, name: String, pos: Vec2 },
    /// A player's position changed enough to rebroadcast.
    PlayerMove { player_id: PlayerId, pos: Vec2 },
    /// A player's facing direction changed enough to rebroadcast.
    PlayerAimed { player_id: PlayerId, dir: Vec2 },
    /// A player died.
    PlayerDie { player_id: PlayerId },
    /// A player scored a kill.
    PlayerKill {
        killer_id: PlayerId,
        victim_id: PlayerId,
        assist_ids: Vec<PlayerId>,
        weapon: Weapon,
    },
    /// A player disconnected. Per spec §9 this is a pure disconnect and
    /// does not affect stats or streaks.
    PlayerLeave { player_id: PlayerId },
    /// Private notification to the dying player of their respawn timer.
    PlayerDead { player_id: PlayerId, until: u64 },

    // ---- projectiles
    /// A projectile was spawned.
    ProjectileSpawned {
        id: ProjectileId,
        owner: PlayerId,
        kind: ProjectileKind,
        pos: Vec2,
        vel: Vec2,
    },
    /// A projectile's position changed.
    ProjectileMoved { id: ProjectileId, pos: Vec2 },
    /// A projectile despawned (expired, hit, or left the world).
    ProjectileDespawned { id: ProjectileId },
    /// A projectile bounced off an obstacle.
    ProjectileBounced { id: ProjectileId, normal: Vec2 },

    // ---- combat
    /// Damage was applied to a player.
    DamageApplied {
        target_id: PlayerId,
        amount: f64,
        source: Option<PlayerId>,
        weapon: Weapon,
    },
    /// A rocket exploded.
    ExplosionSpawned { pos: Vec2, radius: f64, damage: f64 },
    /// A player was knocked back.
    KnockbackApplied { player_id: PlayerId, vx: f64, vy: f64, duration: f64 },
    /// A dash began (with i-frames).
    DashStarted { player_id: PlayerId, duration: f64, iframes: bool },
    /// A dash ended.
    DashEnded { player_id: PlayerId },

    // ---- pickups / buffs
    /// A pickup spawned.
    PickupSpawned { id: PickupId, pos: Vec2, kind: PickupKind },
    /// A pickup was collected.
    PickupCollected { id: PickupId, by: PlayerId },
    /// A buff was applied.
    BuffApplied { player_id: PlayerId, kind: PickupKind, duration: f64 },
    /// A buff expired.
    BuffExpired { player_id: PlayerId, kind: PickupKind },

    // ---- match lifecycle
    /// A match was created and entered its countdown.
    MatchCreated { match_id: MatchId, mode: String, countdown_ms: f64 },
    /// A match went active.
    MatchStarted { match_id: MatchId },
    /// A match ended.
    MatchEnded { match_id: MatchId, at: u64 },
    /// A player's score line changed.
    ScoreUpdate { player_id: PlayerId, kills: u32, deaths: u32, assists: u32 },

    // ---- kill feed / streaks
    /// A kill-feed entry.
    FeedEntry {
        killer: Option<PlayerId>,
        victim: PlayerId,
        weapon: Weapon,
        assist_ids: Vec<PlayerId>,
        timestamp: u64,
    },
    /// A player's kill streak changed.
    StreakChanged { player_id: PlayerId, streak: u32, previous_streak: u32 },
}

impl SimEvent {
    /// The wire/topic discriminant string, e.g. `"player:move"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CmdJoin { .. } => "cmd:join",
            Self::CmdMove { .. } => "cmd:move",
            Self::CmdAim { .. } => "cmd:aim",
            Self::CmdCast { .. } => "cmd:cast",
            Self::CmdRespawn { .. } => "cmd:respawn",
            Self::CmdLeave { .. } => "cmd:leave",
            Self::TickPre { .. } => "tick:pre",
            Self::TickPost { .. } => "tick:post",
            Self::PlayerJoin { .. } => "player:join",
            Self::PlayerMove { .. } => "player:move",
            Self::PlayerAimed { .. } => "player:aimed",
            Self::PlayerDie { .. } => "player:die",
            Self::PlayerKill { .. } => "player:kill",
            Self::PlayerLeave { .. } => "player:leave",
            Self::PlayerDead { .. } => "player:dead",
            Self::ProjectileSpawned { .. } => "projectile:spawned",
            Self::ProjectileMoved { .. } => "projectile:moved",
            Self::ProjectileDespawned { .. } => "projectile:despawned",
            Self::ProjectileBounced { .. } => "projectile:bounced",
            Self::DamageApplied { .. } => "damage:applied",
            Self::ExplosionSpawned { .. } => "explosion:spawned",
            Self::KnockbackApplied { .. } => "knockback:applied",
            Self::DashStarted { .. } => "dash:started",
            Self::DashEnded { .. } => "dash:ended",
            Self::PickupSpawned { .. } => "pickup:spawned",
            Self::PickupCollected { .. } => "pickup:collected",
            Self::BuffApplied { .. } => "buff:applied",
            Self::BuffExpired { .. } => "buff:expired",
            Self::MatchCreated { .. } => "match:created",
            Self::MatchStarted { .. } => "match:started",
            Self::MatchEnded { .. } => "match:ended",
            Self::ScoreUpdate { .. } => "score:update",
            Self::FeedEntry { .. } => "feed:entry",
            Self::StreakChanged { .. } => "streak:changed",
        }
    }

    /// Common ids extracted for journal metadata (spec §3 "Journal entry").
    #[must_use]
    pub fn metadata(&self) -> EventMetadata {
        match self {
            Self::CmdJoin { player_id, .. }
            | Self::CmdMove { player_id, .. }
            | Self::CmdAim { player_id, .. }
            | Self::CmdCast { player_id, .. }
            | Self::CmdRespawn { player_id }
            | Self::CmdLeave { player_id }
            | Self::PlayerMove { player_id, .. }
            | Self::PlayerAimed { player_id, .. }
            | Self::PlayerDead { player_id, .. }
            | Self::KnockbackApplied { player_id, .. }
            | Self::DashStarted { player_id, .. }
            | Self::DashEnded { player_id }
            | Self::BuffApplied { player_id, .. }
            | Self::BuffExpired { player_id, .. }
            | Self::ScoreUpdate { player_id, .. } => {
                EventMetadata { player_id: Some(player_id.clone()), ..Default::default() }
            }
            Self::PlayerJoin { player_id, .. } | Self::PlayerLeave { player_id } => {
                EventMetadata { player_id: Some(player_id.clone()), ..Default::default() }
            }
            Self::PlayerDie { player_id } => {
                EventMetadata { victim_id: Some(player_id.clone()), ..Default::default() }
            }
            Self::PlayerKill { killer_id, victim_id, assist_ids, .. } => EventMetadata {
                player_id: Some(killer_id.clone()),
                victim_id: Some(victim_id.clone()),
                assist_ids: assist_ids.clone(),
                source: Some(killer_id.clone()),
                ..Default::default()
            },
            Self::ProjectileSpawned { owner, .. } => {
                EventMetadata { source: Some(owner.clone()), ..Default::default() }
            }
            Self::DamageApplied { target_id, source, .. } => EventMetadata {
                victim_id: Some(target_id.clone()),
                source: source.clone(),
                ..Default::default()
            },
            Self::PickupCollected { by, .. } => {
                EventMetadata { player_id: Some(by.clone()), ..Default::default() }
            }
            Self::MatchCreated { match_id, .. }
            | Self::MatchStarted { match_id }
            | Self::MatchEnded { match_id, .. } => {
                EventMetadata { match_id: Some(match_id.clone()), ..Default::default() }
            }
            Self::FeedEntry { killer, victim, assist_ids, .. } => EventMetadata {
                player_id: killer.clone(),
                victim_id: Some(victim.clone()),
                assist_ids: assist_ids.clone(),
                source: killer.clone(),
                ..Default::default()
            },
            Self::StreakChanged { player_id, .. } => {
                EventMetadata { player_id: Some(player_id.clone()), source: Some(player_id.clone()), ..Default::default() }
            }
            Self::TickPre { .. }
            | Self::TickPost { .. }
            | Self::ProjectileMoved { .. }
            | Self::ProjectileDespawned { .. }
            | Self::ProjectileBounced { .. }
            | Self::ExplosionSpawned { .. }
            | Self::PickupSpawned { .. } => EventMetadata::default(),
        }
    }
}

/// Common ids extracted from an event, used by the journal to index
/// entries without re-parsing the payload (spec §3 "Journal entry").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// The primary actor, when applicable.
    pub player_id: Option<PlayerId>,
    /// The victim of a damage/kill/death event.
    pub victim_id: Option<PlayerId>,
    /// Players credited with an assist.
    #[serde(default)]
    pub assist_ids: Vec<PlayerId>,
    /// The ultimate source of a damage chain (shooter, not projectile).
    pub source: Option<PlayerId>,
    /// The match this event belongs to, if any.
    pub match_id: Option<MatchId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_wire_string() {
        let e = SimEvent::PlayerMove { player_id: PlayerId::from_string("p1"), pos: Vec2::ZERO };
        assert_eq!(e.kind(), "player:move");
    }

    #[test]
    fn kill_metadata_includes_assists() {
        let e = SimEvent::PlayerKill {
            killer_id: PlayerId::from_string("k"),
            victim_id: PlayerId::from_string("v"),
            assist_ids: vec![PlayerId::from_string("a1")],
            weapon: Weapon::Bullet,
        };
        let meta = e.metadata();
        assert_eq!(meta.player_id, Some(PlayerId::from_string("k")));
        assert_eq!(meta.victim_id, Some(PlayerId::from_string("v")));
        assert_eq!(meta.assist_ids, vec![PlayerId::from_string("a1")]);
    }

    #[test]
    fn tick_events_have_empty_metadata() {
        let e = SimEvent::TickPre { dt: 0.033 };
        let meta = e.metadata();
        assert!(meta.player_id.is_none() && meta.match_id.is_none());
    }

    #[test]
    fn widget_key_roundtrips_through_json() {
        let json = serde_json::to_string(&WidgetKey::Scoreboard).unwrap();
        assert_eq!(json, "\"scoreboard\"");
        let back: WidgetKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WidgetKey::Scoreboard);
    }
}
