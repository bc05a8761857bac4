//! HUD projection (C11): five widgets derive a change-detected snapshot
//! from the event stream and world state, for push delivery to subscribed
//! connections.
//!
//! Widgets are pure with respect to I/O — `on_event`/`snapshot` only read
//! `World` and their own small buffers. The dispatcher decides *when* a
//! flush happens (30 ms after the first dirtying event, or immediately for
//! `feed:entry`/`streak:changed`); actually waiting out that delay is the
//! transport layer's job (see `arena::transport`), driven by a timer this
//! crate does not own.

use crate::world::{MatchPhase, World};
use arena_core::{MatchId, PlayerId, SimEvent, Weapon, WidgetKey};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// One row of the scoreboard widget.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRow {
    /// Row subject.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Confirmed kills.
    pub kills: u32,
    /// Deaths.
    pub deaths: u32,
    /// Assists.
    pub assists: u32,
    /// Current hp.
    pub hp: f64,
    /// Whether currently dead.
    pub is_dead: bool,
}

/// The match widget's projection.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSnapshot {
    /// Current match id, if any.
    pub id: Option<MatchId>,
    /// Game mode label.
    pub mode: Option<String>,
    /// Current phase.
    pub phase: Option<MatchPhase>,
    /// When the match goes/went active.
    pub starts_at: Option<f64>,
    /// When the match ends/ended.
    pub ends_at: Option<f64>,
}

/// One kill-feed line.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedItem {
    /// Credited killer, absent for environmental deaths.
    pub killer: Option<PlayerId>,
    /// The player who died.
    pub victim: PlayerId,
    /// What dealt the killing blow.
    pub weapon: Weapon,
    /// When this entry was recorded, ms.
    pub at: f64,
}

/// One streak-milestone announcement.
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    /// Who reached the milestone.
    pub player_id: PlayerId,
    /// The streak value reached.
    pub streak: u32,
    /// When this entry was recorded, ms.
    pub at: f64,
}

/// A widget's computed output, ready to serialize onto a connection.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetSnapshot {
    /// Scoreboard rows, sorted by kills desc, deaths asc, name asc.
    Scoreboard(Vec<ScoreRow>),
    /// Current match projection.
    Match(MatchSnapshot),
    /// Recent, non-expired kill-feed entries, newest last.
    Feed(Vec<FeedItem>),
    /// Per-player current streak.
    Streaks(BTreeMap<PlayerId, u32>),
    /// Recent, non-expired streak-milestone announcements.
    Announcements(Vec<Announcement>),
}

/// Milestones that produce an announcement, highest first so the single
/// highest newly-crossed category wins.
const STREAK_THRESHOLDS: [u32; 5] = [10, 7, 5, 3, 2];

const FEED_CAPACITY: usize = 8;
const FEED_TTL_MS: f64 = 10_000.0;
const ANNOUNCEMENTS_CAPACITY: usize = 5;
const ANNOUNCEMENTS_TTL_MS: f64 = 3_000.0;
const MATCH_THROTTLE_MS: f64 = 300.0;

/// Behavior shared by every widget.
pub trait Widget {
    /// This widget's key.
    fn key(&self) -> WidgetKey;
    /// Updates internal buffers for `event`; returns true if the next
    /// `snapshot()` may differ from the previous one.
    fn on_event(&mut self, event: &SimEvent, now: f64) -> bool;
    /// Computes the current projection.
    fn snapshot(&self, world: &World, now: f64) -> WidgetSnapshot;
}

/// Per-player kill/death/assist/hp table.
#[derive(Default)]
pub struct ScoreboardWidget;

impl Widget for ScoreboardWidget {
    fn key(&self) -> WidgetKey {
        WidgetKey::Scoreboard
    }

    fn on_event(&mut self, event: &SimEvent, _now: f64) -> bool {
        matches!(
            event,
            SimEvent::ScoreUpdate { .. }
                | SimEvent::PlayerJoin { .. }
                | SimEvent::PlayerLeave { .. }
                | SimEvent::PlayerDie { .. }
        )
    }

    fn snapshot(&self, world: &World, _now: f64) -> WidgetSnapshot {
        let mut rows: Vec<ScoreRow> = world
            .players
            .values()
            .map(|p| ScoreRow {
                player_id: p.id.clone(),
                name: p.name.clone(),
                kills: p.stats.kills,
                deaths: p.stats.deaths,
                assists: p.stats.assists,
                hp: p.hp,
                is_dead: p.is_dead,
            })
            .collect();
        rows.sort_by(|a, b| b.kills.cmp(&a.kills).then(a.deaths.cmp(&b.deaths)).then(a.name.cmp(&b.name)));
        WidgetSnapshot::Scoreboard(rows)
    }
}

/// Current match phase, with `tick:post` throttled to at most once per
/// [`MATCH_THROTTLE_MS`].
#[derive(Default)]
pub struct MatchWidget {
    last_tick_flush: f64,
}

impl Widget for MatchWidget {
    fn key(&self) -> WidgetKey {
        WidgetKey::Match
    }

    fn on_event(&mut self, event: &SimEvent, now: f64) -> bool {
        match event {
            SimEvent::MatchCreated { .. } | SimEvent::MatchStarted { .. } | SimEvent::MatchEnded { .. } => true,
            SimEvent::TickPost { .. } => {
                if now - self.last_tick_flush >= MATCH_THROTTLE_MS {
                    self.last_tick_flush = now;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn snapshot(&self, world: &World, _now: f64) -> WidgetSnapshot {
        let m = world.current_match.as_ref();
        WidgetSnapshot::Match(MatchSnapshot {
            id: m.map(|m| m.id.clone()),
            mode: m.map(|m| m.mode.clone()),
            phase: m.map(|m| m.phase),
            starts_at: m.and_then(|m| m.starts_at),
            ends_at: m.and_then(|m| m.ends_at),
        })
    }
}

/// Ring buffer of recent kill-feed items.
#[derive(Default)]
pub struct FeedWidget {
    items: VecDeque<FeedItem>,
}

impl Widget for FeedWidget {
    fn key(&self) -> WidgetKey {
        WidgetKey::Feed
    }

    fn on_event(&mut self, event: &SimEvent, now: f64) -> bool {
        match event {
            SimEvent::FeedEntry { killer, victim, weapon, .. } => {
                if self.items.len() >= FEED_CAPACITY {
                    self.items.pop_front();
                }
                self.items.push_back(FeedItem { killer: killer.clone(), victim: victim.clone(), weapon: *weapon, at: now });
                true
            }
            SimEvent::TickPost { .. } => self.expire(now),
            _ => false,
        }
    }

    fn snapshot(&self, _world: &World, now: f64) -> WidgetSnapshot {
        WidgetSnapshot::Feed(self.items.iter().filter(|i| now - i.at < FEED_TTL_MS).cloned().collect())
    }
}

impl FeedWidget {
    fn expire(&mut self, now: f64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| now - i.at < FEED_TTL_MS);
        self.items.len() != before
    }
}

/// Per-player current kill streak.
#[derive(Default)]
pub struct StreaksWidget;

impl Widget for StreaksWidget {
    fn key(&self) -> WidgetKey {
        WidgetKey::Streaks
    }

    fn on_event(&mut self, event: &SimEvent, _now: f64) -> bool {
        matches!(event, SimEvent::StreakChanged { .. })
    }

    fn snapshot(&self, world: &World, _now: f64) -> WidgetSnapshot {
        WidgetSnapshot::Streaks(world.players.values().map(|p| (p.id.clone(), p.stats.current_streak)).collect())
    }
}

/// Streak-milestone announcements only, highest newly-crossed threshold
/// per `streak:changed`.
#[derive(Default)]
pub struct AnnouncementsWidget {
    items: VecDeque<Announcement>,
}

impl Widget for AnnouncementsWidget {
    fn key(&self) -> WidgetKey {
        WidgetKey::Announcements
    }

    fn on_event(&mut self, event: &SimEvent, now: f64) -> bool {
        match event {
            SimEvent::StreakChanged { player_id, streak, previous_streak } => {
                let Some(&threshold) = STREAK_THRESHOLDS.iter().find(|&&t| *previous_streak < t && t <= *streak) else {
                    return false;
                };
                if self.items.len() >= ANNOUNCEMENTS_CAPACITY {
                    self.items.pop_front();
                }
                self.items.push_back(Announcement { player_id: player_id.clone(), streak: threshold, at: now });
                true
            }
            SimEvent::TickPost { .. } => {
                let before = self.items.len();
                self.items.retain(|i| now - i.at < ANNOUNCEMENTS_TTL_MS);
                self.items.len() != before
            }
            _ => false,
        }
    }

    fn snapshot(&self, _world: &World, now: f64) -> WidgetSnapshot {
        WidgetSnapshot::Announcements(self.items.iter().filter(|i| now - i.at < ANNOUNCEMENTS_TTL_MS).cloned().collect())
    }
}

/// What the caller should do after feeding an event into the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushDelay {
    /// Flush now.
    Immediate,
    /// Flush 30 ms from now, coalescing with any other dirtying events in
    /// that window.
    Delayed,
}

/// Owns all five widgets and tracks which ones need re-snapshotting.
pub struct Dispatcher {
    scoreboard: ScoreboardWidget,
    game_match: MatchWidget,
    feed: FeedWidget,
    streaks: StreaksWidget,
    announcements: AnnouncementsWidget,
    dirty: HashMap<WidgetKey, ()>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            scoreboard: ScoreboardWidget,
            game_match: MatchWidget::default(),
            feed: FeedWidget::default(),
            streaks: StreaksWidget,
            announcements: AnnouncementsWidget::default(),
            dirty: HashMap::new(),
        }
    }
}

impl Dispatcher {
    /// A fresh dispatcher with nothing dirty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `event` to every widget, marking dirty keys. Returns the
    /// flush delay to schedule if anything became dirty: immediate for
    /// `feed:entry`/`streak:changed`, otherwise delayed 30 ms.
    pub fn handle_event(&mut self, event: &SimEvent, now: f64) -> Option<FlushDelay> {
        let mut any_dirty = false;
        if self.scoreboard.on_event(event, now) {
            self.dirty.insert(WidgetKey::Scoreboard, ());
            any_dirty = true;
        }
        if self.game_match.on_event(event, now) {
            self.dirty.insert(WidgetKey::Match, ());
            any_dirty = true;
        }
        if self.feed.on_event(event, now) {
            self.dirty.insert(WidgetKey::Feed, ());
            any_dirty = true;
        }
        if self.streaks.on_event(event, now) {
            self.dirty.insert(WidgetKey::Streaks, ());
            any_dirty = true;
        }
        if self.announcements.on_event(event, now) {
            self.dirty.insert(WidgetKey::Announcements, ());
            any_dirty = true;
        }

        if !any_dirty {
            return None;
        }
        if matches!(event, SimEvent::FeedEntry { .. } | SimEvent::StreakChanged { .. }) {
            Some(FlushDelay::Immediate)
        } else {
            Some(FlushDelay::Delayed)
        }
    }

    /// Snapshots every currently dirty widget and clears the dirty set.
    pub fn flush(&mut self, world: &World, now: f64) -> Vec<(WidgetKey, WidgetSnapshot)> {
        let keys: Vec<WidgetKey> = self.dirty.keys().copied().collect();
        self.dirty.clear();
        keys.into_iter().map(|key| (key, self.snapshot_one(key, world, now))).collect()
    }

    /// Computes one widget's snapshot on demand, for an initial-subscribe
    /// push that should not wait for the next dirty flush.
    #[must_use]
    pub fn snapshot_one(&self, key: WidgetKey, world: &World, now: f64) -> WidgetSnapshot {
        match key {
            WidgetKey::Scoreboard => self.scoreboard.snapshot(world, now),
            WidgetKey::Match => self.game_match.snapshot(world, now),
            WidgetKey::Feed => self.feed.snapshot(world, now),
            WidgetKey::Streaks => self.streaks.snapshot(world, now),
            WidgetKey::Announcements => self.announcements.snapshot(world, now),
        }
    }
}
