//! Error types shared across the workspace.
//!
//! Per spec §7/§9, simulation code never throws — illegal commands, dead
//! players, and cooldowns are silently-dropped branches, not `Result::Err`.
//! [`ArenaError`] exists for the two places that genuinely fail: startup
//! configuration validation and journal I/O.

use thiserror::Error;

/// Errors surfaced by configuration loading and the journal subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// One or more configuration fields violated their documented
    /// constraints. Startup fails fast with every violation listed.
    #[error("invalid configuration:\n{}", .violations.join("\n"))]
    InvalidConfiguration {
        /// Every violated constraint, one per line.
        violations: Vec<String>,
    },

    /// A journal file could not be read or written. Logged and swallowed —
    /// the simulation loop must never stall on disk errors.
    #[error("journal I/O error: {0}")]
    JournalIo(String),

    /// A journal file on disk did not match the expected format.
    #[error("malformed journal: {0}")]
    MalformedJournal(String),
}
