//! Event bus (C2): an in-process typed publish/subscribe hub keyed by
//! event-type string.
//!
//! Grounded on the teacher's `SharedEvent`/listener-registry pattern: a
//! single-threaded dispatcher where listeners for a topic run in
//! registration order and a failing listener never blocks its siblings.
//! Unlike the teacher (which ran under `panic = "abort"` and could not use
//! `catch_unwind`), listeners here return `Result<(), ArenaError>` — a
//! listener error is logged via `tracing::error!` and dispatch continues.

use arena_core::{ArenaError, SimEvent};
use std::collections::HashMap;

/// A single registered listener.
type Listener = Box<dyn FnMut(&SimEvent) -> Result<(), ArenaError>>;

/// The maximum number of listeners the bus guarantees per topic.
/// Registering beyond this only logs a warning — it is not a hard cap.
pub const MAX_LISTENERS: usize = 20;

/// Typed pub/sub hub. `emit` dispatches synchronously; there is no queue
/// and no cross-thread hop — the whole bus lives on the sim task.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<&'static str, Vec<Listener>>,
    /// Every event emitted this tick, in emission order, drained by the
    /// caller between dispatch passes (e.g. the transport adapter's
    /// broadcast allowlist and the journal both read this).
    log: Vec<SimEvent>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for `topic`. Listeners are invoked in
    /// registration order.
    pub fn on(&mut self, topic: &'static str, listener: Listener) {
        let bucket = self.listeners.entry(topic).or_default();
        if bucket.len() >= MAX_LISTENERS {
            tracing::warn!(topic, count = bucket.len(), "event bus topic exceeds the documented listener budget");
        }
        bucket.push(listener);
    }

    /// Removes all listeners registered for `topic`. The bus does not
    /// track listener identity, so selective removal by reference is not
    /// supported — callers that need to unsubscribe a single listener
    /// should gate it with interior state instead.
    pub fn off(&mut self, topic: &'static str) {
        self.listeners.remove(topic);
    }

    /// Delivers `event` synchronously to every listener registered for
    /// `event.kind()`, then appends it to the emission log.
    pub fn emit(&mut self, event: SimEvent) {
        let kind = event.kind();
        if let Some(bucket) = self.listeners.get_mut(kind) {
            for listener in bucket.iter_mut() {
                if let Err(err) = listener(&event) {
                    tracing::error!(topic = kind, error = %err, "event bus listener failed");
                }
            }
        }
        self.log.push(event);
    }

    /// Drains and returns every event emitted since the last drain, in
    /// emission order.
    pub fn drain_log(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_run_in_registration_order() {
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = order.clone();
        bus.on("player:move", Box::new(move |_| {
            o1.borrow_mut().push(1);
            Ok(())
        }));
        let o2 = order.clone();
        bus.on("player:move", Box::new(move |_| {
            o2.borrow_mut().push(2);
            Ok(())
        }));

        bus.emit(SimEvent::PlayerMove {
            player_id: arena_core::PlayerId::from_string("p1"),
            pos: arena_core::Vec2::ZERO,
        });

        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn a_failing_listener_does_not_block_the_next() {
        let mut bus = EventBus::new();
        let ran = Rc::new(RefCell::new(false));

        bus.on(
            "player:die",
            Box::new(|_| Err(ArenaError::JournalIo("boom".to_string()))),
        );
        let ran2 = ran.clone();
        bus.on("player:die", Box::new(move |_| {
            *ran2.borrow_mut() = true;
            Ok(())
        }));

        bus.emit(SimEvent::PlayerDie { player_id: arena_core::PlayerId::from_string("p1") });

        assert!(*ran.borrow());
    }

    #[test]
    fn drain_log_returns_emission_order_and_empties() {
        let mut bus = EventBus::new();
        bus.emit(SimEvent::TickPre { dt: 0.033 });
        bus.emit(SimEvent::TickPost { dt: 0.033 });
        let drained = bus.drain_log();
        assert_eq!(drained.len(), 2);
        assert!(bus.drain_log().is_empty());
    }
}
