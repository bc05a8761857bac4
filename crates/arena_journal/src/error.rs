//! Errors surfaced by the journal subsystem.
//!
//! Failures here are logged and swallowed by the caller — the simulation
//! loop never stalls on disk errors; this type exists so the background
//! save worker and the index have something concrete to report to
//! `tracing`.

pub use arena_core::ArenaError as JournalError;

/// Result type for journal operations.
pub type JournalResult<T> = Result<T, JournalError>;
