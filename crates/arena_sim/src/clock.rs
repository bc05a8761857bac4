//! Clock (C3): fixed-rate tick driver.
//!
//! Clamp, don't catch up: after a stall, exactly one tick with a clamped
//! `dt` resumes normal cadence rather than running a burst of makeup ticks.

use std::time::{Duration, Instant};

/// Target tick rate, ticks/second: a fixed 33.33 ms simulation step.
pub const TICK_HZ: f64 = 30.0;

/// Wall-clock interval between ticks.
pub const TICK_PERIOD: Duration = Duration::from_nanos((1_000_000_000.0 / TICK_HZ) as u64);

/// Maximum `dt` fed to a single tick, seconds. Bounds catch-up after a
/// stall.
pub const MAX_DT_SECONDS: f64 = 0.1;

/// A fixed-rate tick driver. Does not own a thread or task — callers
/// `await` [`Clock::wait_for_next_tick`] in their own loop and call
/// [`Clock::tick`] to compute the clamped `dt`.
pub struct Clock {
    prev: Instant,
    running: bool,
}

impl Clock {
    /// Creates a stopped clock.
    #[must_use]
    pub fn new() -> Self {
        Self { prev: Instant::now(), running: false }
    }

    /// Starts the clock. Idempotent: calling `start` while already running
    /// only resets `prev` to now, it does not double-arm anything.
    pub fn start(&mut self) {
        self.prev = Instant::now();
        self.running = true;
    }

    /// Stops the clock; future calls to [`Clock::tick`] return `None`.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// True if the clock has been started and not yet stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances the clock to `now`, returning the clamped `dt` in seconds,
    /// or `None` if the clock is stopped. Never performs catch-up: even if
    /// `now - prev` is far larger than [`MAX_DT_SECONDS`], exactly one `dt`
    /// of [`MAX_DT_SECONDS`] is returned and `prev` jumps to `now`.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        if !self.running {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.prev).as_secs_f64();
        self.prev = now;
        Some(elapsed.min(MAX_DT_SECONDS))
    }

    /// The instant the next tick is due, given the last recorded `prev`.
    #[must_use]
    pub fn next_deadline(&self) -> Instant {
        self.prev + TICK_PERIOD
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
