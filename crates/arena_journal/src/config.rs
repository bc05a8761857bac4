//! Journal subsystem configuration, including the environment overrides
//! named in spec §6.

use std::collections::HashSet;
use std::path::PathBuf;

/// Event types excluded from recording by default — the high-frequency
/// tick boundaries (spec §4.12: "accepts every event except the excluded
/// set (default excludes high-frequency `tick:pre`/`tick:post`)").
pub fn default_excluded_events() -> HashSet<String> {
    ["tick:pre", "tick:post"].iter().map(|s| s.to_string()).collect()
}

/// Tunable knobs for [`crate::manager::JournalManager`].
#[derive(Clone, Debug)]
pub struct JournalConfig {
    /// Root directory; journals live under `matches/` and `sessions/`
    /// beneath it, with `index.json` at its top.
    pub base_dir: PathBuf,
    /// If true, recording is a no-op (env `DISABLE_JOURNAL`).
    pub disabled: bool,
    /// If true, emit verbose `tracing::debug!` around save/rotate (env
    /// `DEBUG_JOURNAL`).
    pub debug: bool,
    /// Event types never recorded.
    pub excluded_events: HashSet<String>,
    /// Advisory flush-request threshold: once a journal holds this many
    /// entries, the hot path requests (but does not force) a save.
    pub max_buffer_size: usize,
    /// Rotate to a fresh journal of the same scope once `eventCounter`
    /// reaches this many entries.
    pub max_journal_size: u64,
    /// Auto-save interval, milliseconds, when there are unsaved events.
    pub auto_save_interval_ms: u64,
    /// Below this many entries, a save encodes in one shot; at or above
    /// it, entries stream out in batches (env `JOURNAL_STREAM_THRESHOLD`).
    pub stream_threshold: usize,
    /// Whether saved files are gzip-compressed.
    pub compress: bool,
    /// How many most-recent journals to retain on startup cleanup.
    pub keep_journals: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("journals"),
            disabled: false,
            debug: false,
            excluded_events: default_excluded_events(),
            max_buffer_size: 5_000,
            max_journal_size: 100_000,
            auto_save_interval_ms: 30_000,
            stream_threshold: crate::format::DEFAULT_STREAM_THRESHOLD,
            compress: true,
            keep_journals: 50,
        }
    }
}

impl JournalConfig {
    /// Builds configuration from defaults, applying the environment
    /// overrides named in spec §6 on top. `EVENT_ARENA_ARTIFACTS_DIR` sets
    /// the base directory if `JOURNALS_DIR` is unset; `JOURNALS_DIR` takes
    /// precedence when both are present.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = std::env::var_os("JOURNALS_DIR") {
            config.base_dir = PathBuf::from(dir);
        } else if let Some(dir) = std::env::var_os("EVENT_ARENA_ARTIFACTS_DIR") {
            config.base_dir = PathBuf::from(dir).join("journals");
        }

        if is_env_truthy("DISABLE_JOURNAL") {
            config.disabled = true;
        }
        if is_env_truthy("DEBUG_JOURNAL") {
            config.debug = true;
        }
        if let Ok(raw) = std::env::var("JOURNAL_STREAM_THRESHOLD") {
            if let Ok(parsed) = raw.parse::<usize>() {
                config.stream_threshold = parsed;
            } else {
                tracing::warn!(value = %raw, "JOURNAL_STREAM_THRESHOLD is not a valid integer, ignoring");
            }
        }

        config
    }

    /// The `matches/` subdirectory.
    #[must_use]
    pub fn matches_dir(&self) -> PathBuf {
        self.base_dir.join("matches")
    }

    /// The `sessions/` subdirectory.
    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.base_dir.join("sessions")
    }

    /// The `index.json` path.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.base_dir.join("index.json")
    }
}

fn is_env_truthy(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_tick_events() {
        let cfg = JournalConfig::default();
        assert!(cfg.excluded_events.contains("tick:pre"));
        assert!(cfg.excluded_events.contains("tick:post"));
        assert!(!cfg.excluded_events.contains("player:move"));
    }

    #[test]
    fn subdirectories_nest_under_base_dir() {
        let cfg = JournalConfig { base_dir: PathBuf::from("/tmp/journals"), ..JournalConfig::default() };
        assert_eq!(cfg.matches_dir(), PathBuf::from("/tmp/journals/matches"));
        assert_eq!(cfg.sessions_dir(), PathBuf::from("/tmp/journals/sessions"));
        assert_eq!(cfg.index_path(), PathBuf::from("/tmp/journals/index.json"));
    }
}
