//! Translation between [`SimEvent`] / widget snapshots and the wire JSON
//! shape named in spec §6: every frame is a flat object with a `type`
//! field (e.g. `{"type":"player:move","playerId":"...","pos":{...}}`).
//!
//! [`SimEvent`] keeps a plain, internally-tagged `derive(Serialize)` shape
//! because it is also the journal's on-disk representation (spec §4.12)
//! and the bus's in-memory payload — reshaping it here, once, at the
//! transport boundary, avoids coupling the simulation crate to the wire
//! contract. See DESIGN.md.

use arena_core::{PlayerId, Skill, SimEvent, Vec2, WidgetKey};
use arena_sim::hud::WidgetSnapshot;
use arena_sim::world::{MatchPhase, World};
use serde_json::{json, Map, Value};

/// Encodes any [`SimEvent`] into `{"type": "<kind>", ...fields}`, flattening
/// serde's default externally-tagged enum representation
/// (`{"Variant": {...}}`) into the spec's flat shape.
#[must_use]
pub fn encode_event(event: &SimEvent) -> Value {
    let raw = serde_json::to_value(event).expect("SimEvent always serializes");
    let mut fields = match raw {
        Value::Object(map) => match map.into_iter().next() {
            Some((_, Value::Object(inner))) => inner,
            Some((_, Value::Null)) | None => Map::new(),
            Some((_, other)) => {
                let mut m = Map::new();
                m.insert("value".to_string(), other);
                m
            }
        },
        _ => Map::new(),
    };
    fields.insert("type".to_string(), Value::String(event.kind().to_string()));
    Value::Object(fields)
}

/// The fixed allowlist of event kinds fanned out to every connection
/// (spec §4.10 "Broadcast policy"). Commands (`cmd:*`) and tick boundaries
/// never go out over the wire, and `player:dead` is routed privately to
/// the dying player instead (see [`SimEvent::PlayerDead`] handling at the
/// call site) so it is excluded here too.
#[must_use]
pub fn is_broadcastable(kind: &str) -> bool {
    !(kind.starts_with("cmd:") || kind == "tick:pre" || kind == "tick:post" || kind == "player:dead")
}

/// The welcome frame sent immediately on connect.
#[must_use]
pub fn connected_frame(now_ms: u64) -> Value {
    json!({ "type": "connected", "ts": now_ms })
}

/// The static map frame sent immediately on connect.
#[must_use]
pub fn map_loaded_frame(world: &World) -> Value {
    let obstacles: Vec<Value> = world
        .obstacles
        .iter()
        .map(|o| json!({ "x": o.rect.x, "y": o.rect.y, "w": o.rect.w, "h": o.rect.h }))
        .collect();
    json!({ "type": "map:loaded", "obstacles": obstacles })
}

/// The private `session:started` frame sent only to the joining
/// connection (spec §4.10).
#[must_use]
pub fn session_started_frame(world: &World, joining: &PlayerId, name: &str) -> Value {
    let players: Vec<Value> = world
        .players
        .values()
        .filter(|p| &p.id != joining)
        .map(|p| json!({ "id": p.id, "name": p.name, "pos": p.pos }))
        .collect();
    let game_match = world.current_match.as_ref().map(|m| {
        json!({
            "id": m.id,
            "mode": m.mode,
            "phase": phase_str(m.phase),
            "startsAt": m.starts_at,
            "endsAt": m.ends_at,
        })
    });
    json!({
        "type": "session:started",
        "playerId": joining,
        "name": name,
        "players": players,
        "match": game_match,
    })
}

fn phase_str(phase: MatchPhase) -> &'static str {
    match phase {
        MatchPhase::Idle => "idle",
        MatchPhase::Countdown => "countdown",
        MatchPhase::Active => "active",
        MatchPhase::Ended => "ended",
    }
}

/// Encodes one HUD widget snapshot as its `hud:<widget>:update` frame
/// (spec §6: `hud:scoreboard:update`, `hud:match:update`, `hud:feed:update`,
/// `hud:streaks:update`, `hud:announce:update`).
#[must_use]
pub fn encode_widget_snapshot(key: WidgetKey, snapshot: &WidgetSnapshot) -> Value {
    let (wire_key, payload) = match snapshot {
        WidgetSnapshot::Scoreboard(rows) => (
            "scoreboard",
            json!(rows
                .iter()
                .map(|r| json!({
                    "playerId": r.player_id,
                    "name": r.name,
                    "kills": r.kills,
                    "deaths": r.deaths,
                    "assists": r.assists,
                    "hp": r.hp,
                    "isDead": r.is_dead,
                }))
                .collect::<Vec<_>>()),
        ),
        WidgetSnapshot::Match(m) => (
            "match",
            json!({
                "id": m.id,
                "mode": m.mode,
                "phase": m.phase.map(phase_str),
                "startsAt": m.starts_at,
                "endsAt": m.ends_at,
            }),
        ),
        WidgetSnapshot::Feed(items) => (
            "feed",
            json!(items
                .iter()
                .map(|i| json!({ "killer": i.killer, "victim": i.victim, "weapon": i.weapon, "at": i.at }))
                .collect::<Vec<_>>()),
        ),
        WidgetSnapshot::Streaks(map) => ("streaks", json!(map)),
        WidgetSnapshot::Announcements(items) => (
            "announce",
            json!(items.iter().map(|i| json!({ "playerId": i.player_id, "streak": i.streak, "at": i.at })).collect::<Vec<_>>()),
        ),
    };
    debug_assert_eq!(wire_key, widget_wire_key(key));
    json!({ "type": format!("hud:{wire_key}:update"), "data": payload })
}

fn widget_wire_key(key: WidgetKey) -> &'static str {
    match key {
        WidgetKey::Scoreboard => "scoreboard",
        WidgetKey::Match => "match",
        WidgetKey::Feed => "feed",
        WidgetKey::Streaks => "streaks",
        WidgetKey::Announcements => "announce",
    }
}

/// A decoded inbound frame, player id already stripped: the adapter binds
/// every command to the connection's own bound id rather than trusting
/// any id a client supplies (spec §4.10 "overriding any client-supplied
/// id").
#[derive(Debug, Clone)]
pub enum Inbound {
    /// `cmd:join {name}`.
    Join { name: String },
    /// `cmd:move {dir}`.
    Move { dir: Vec2 },
    /// `cmd:aim {dir}`.
    Aim { dir: Vec2 },
    /// `cmd:cast {skill}`.
    Cast { skill: Skill },
    /// `cmd:respawn {}`.
    Respawn,
    /// `cmd:leave {}`.
    Leave,
    /// `cmd:hud:subscribe {widgets}`.
    HudSubscribe { widgets: Vec<WidgetKey> },
    /// `cmd:hud:unsubscribe {widgets}`.
    HudUnsubscribe { widgets: Vec<WidgetKey> },
}

/// Parses one inbound text frame. Unknown `type`s and malformed payloads
/// are reported as `Err` for the caller to log and drop (spec §4.10
/// "Unknown `cmd:*` are logged").
pub fn decode_inbound(text: &str) -> Result<Inbound, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let kind = value.get("type").and_then(Value::as_str).ok_or("missing \"type\" field")?;

    match kind {
        "cmd:join" => {
            let name = field_str(&value, "name")?;
            Ok(Inbound::Join { name })
        }
        "cmd:move" => Ok(Inbound::Move { dir: field_vec2(&value, "dir")? }),
        "cmd:aim" => Ok(Inbound::Aim { dir: field_vec2(&value, "dir")? }),
        "cmd:cast" => Ok(Inbound::Cast { skill: parse_skill(field_str(&value, "skill")?.as_str())? }),
        "cmd:respawn" => Ok(Inbound::Respawn),
        "cmd:leave" => Ok(Inbound::Leave),
        "cmd:hud:subscribe" => Ok(Inbound::HudSubscribe { widgets: parse_widgets(&value)? }),
        "cmd:hud:unsubscribe" => Ok(Inbound::HudUnsubscribe { widgets: parse_widgets(&value)? }),
        other => Err(format!("unrecognized cmd type {other:?}")),
    }
}

fn field_str(value: &Value, field: &str) -> Result<String, String> {
    value.get(field).and_then(Value::as_str).map(str::to_string).ok_or_else(|| format!("missing \"{field}\" field"))
}

fn field_vec2(value: &Value, field: &str) -> Result<Vec2, String> {
    let raw = value.get(field).ok_or_else(|| format!("missing \"{field}\" field"))?;
    serde_json::from_value(raw.clone()).map_err(|e| e.to_string())
}

fn parse_skill(raw: &str) -> Result<Skill, String> {
    match raw {
        "skill:shoot" => Ok(Skill::Shoot),
        "skill:shotgun" => Ok(Skill::Shotgun),
        "skill:rocket" => Ok(Skill::Rocket),
        "skill:dash" => Ok(Skill::Dash),
        other => Err(format!("unknown skill {other:?}")),
    }
}

fn parse_widgets(value: &Value) -> Result<Vec<WidgetKey>, String> {
    let raw = value.get("widgets").and_then(Value::as_array).ok_or("missing \"widgets\" array")?;
    Ok(raw
        .iter()
        .filter_map(|v| v.as_str().and_then(|s| WidgetKey::ALL.into_iter().find(|k| widget_wire_key(*k) == s || matches_key_name(*k, s))))
        .collect())
}

fn matches_key_name(key: WidgetKey, s: &str) -> bool {
    serde_json::to_value(key).ok().and_then(|v| v.as_str().map(str::to_string)) == Some(s.to_string())
}
