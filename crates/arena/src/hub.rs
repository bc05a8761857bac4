//! Connection registry shared between the sim task and every per-connection
//! adapter task (spec §4.10/§5: "Per-connection HUD subscription sets are
//! mutated only while handling that connection's messages (in the
//! adapter)... if running concurrently, use a read-mostly guarded map").
//!
//! A `parking_lot::Mutex` is fine here: every access is a short, non-async
//! critical section (insert/remove/clone a small set, try_send a frame),
//! so the sim task never holds it across an `.await`.

use arena_core::{PlayerId, WidgetKey};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Outbound frames queued per connection beyond this capacity are dropped
/// rather than buffered, approximating the spec's `bufferedAmount >
/// 1_000_000` backpressure check for a JSON-over-WebSocket transport
/// (spec §4.10 "never buffer unboundedly").
const CONNECTION_QUEUE_CAPACITY: usize = 512;

struct ConnEntry {
    sender: mpsc::Sender<Message>,
    player_id: Option<PlayerId>,
    hud_subs: HashSet<WidgetKey>,
}

/// The shared connection table.
#[derive(Default)]
pub struct Hub {
    conns: Mutex<HashMap<u64, ConnEntry>>,
    next_id: AtomicU64,
}

impl Hub {
    /// A fresh, empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection, returning its id and the receiver its
    /// write task should drain.
    pub fn register(&self) -> (u64, mpsc::Receiver<Message>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(CONNECTION_QUEUE_CAPACITY);
        self.conns.lock().insert(id, ConnEntry { sender, player_id: None, hud_subs: HashSet::new() });
        (id, receiver)
    }

    /// Drops a connection's entry, e.g. once its tasks have exited.
    pub fn remove(&self, conn_id: u64) -> Option<PlayerId> {
        self.conns.lock().remove(&conn_id).and_then(|e| e.player_id)
    }

    /// Binds `conn_id` to the player id allocated for its `cmd:join`.
    pub fn bind_player(&self, conn_id: u64, player_id: PlayerId) {
        if let Some(entry) = self.conns.lock().get_mut(&conn_id) {
            entry.player_id = Some(player_id);
        }
    }

    /// The player id bound to `conn_id`, if it has joined.
    #[must_use]
    pub fn player_of(&self, conn_id: u64) -> Option<PlayerId> {
        self.conns.lock().get(&conn_id).and_then(|e| e.player_id.clone())
    }

    /// Finds the connection bound to `player_id`, if still connected.
    #[must_use]
    pub fn conn_of_player(&self, player_id: &PlayerId) -> Option<u64> {
        self.conns.lock().iter().find(|(_, e)| e.player_id.as_ref() == Some(player_id)).map(|(id, _)| *id)
    }

    /// Adds `widgets` to `conn_id`'s subscription set, filtered to the
    /// valid [`WidgetKey::ALL`] allowlist, returning only the keys that
    /// were newly added (spec §4.10 "push an immediate widget snapshot
    /// per newly-subscribed widget").
    pub fn subscribe(&self, conn_id: u64, widgets: &[WidgetKey]) -> Vec<WidgetKey> {
        let mut conns = self.conns.lock();
        let Some(entry) = conns.get_mut(&conn_id) else { return Vec::new() };
        widgets.iter().filter(|w| entry.hud_subs.insert(**w)).copied().collect()
    }

    /// Removes `widgets` from `conn_id`'s subscription set.
    pub fn unsubscribe(&self, conn_id: u64, widgets: &[WidgetKey]) {
        if let Some(entry) = self.conns.lock().get_mut(&conn_id) {
            for w in widgets {
                entry.hud_subs.remove(w);
            }
        }
    }

    /// Sends one JSON value to a single connection, dropping it silently
    /// if the connection is gone or its queue is full.
    pub fn send_to(&self, conn_id: u64, value: &serde_json::Value) {
        let sender = self.conns.lock().get(&conn_id).map(|e| e.sender.clone());
        let Some(sender) = sender else { return };
        send_on(&sender, value);
    }

    /// Sends one JSON value to whichever connection `player_id` is bound
    /// to, if any (private frames like `session:started`, `player:dead`).
    pub fn send_to_player(&self, player_id: &PlayerId, value: &serde_json::Value) {
        let sender = self.conns.lock().iter().find(|(_, e)| e.player_id.as_ref() == Some(player_id)).map(|(_, e)| e.sender.clone());
        let Some(sender) = sender else { return };
        send_on(&sender, value);
    }

    /// Sends one JSON value to every connected client.
    pub fn broadcast(&self, value: &serde_json::Value) {
        let senders: Vec<mpsc::Sender<Message>> = self.conns.lock().values().map(|e| e.sender.clone()).collect();
        for sender in &senders {
            send_on(sender, value);
        }
    }

    /// Sends one JSON value to every connection subscribed to `key`.
    pub fn broadcast_to_hud_subscribers(&self, key: WidgetKey, value: &serde_json::Value) {
        let senders: Vec<mpsc::Sender<Message>> =
            self.conns.lock().values().filter(|e| e.hud_subs.contains(&key)).map(|e| e.sender.clone()).collect();
        for sender in &senders {
            send_on(sender, value);
        }
    }
}

fn send_on(sender: &mpsc::Sender<Message>, value: &serde_json::Value) {
    let text = value.to_string();
    if let Err(e) = sender.try_send(Message::Text(text)) {
        tracing::debug!(error = %e, "dropping outbound frame for a slow or closed connection");
    }
}
