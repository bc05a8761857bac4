//! CLI parsing and configuration loading.
//!
//! Layers, lowest to highest precedence: [`arena_core::SimConfig::default`],
//! an optional TOML file, then the journal subsystem's own environment
//! overrides, then `--port`/`--journals-dir` CLI flags.

use arena_core::SimConfig;
use arena_journal::JournalConfig;
use clap::Parser;
use std::path::PathBuf;

/// Event Arena game server.
#[derive(Parser, Debug)]
#[command(name = "arena-server", about = "Event Arena real-time multiplayer server")]
pub struct CliArgs {
    /// Path to a TOML file overriding the simulation defaults (spec §6
    /// "Configuration"). Parsing is limited to the fields spec §6
    /// enumerates.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// TCP port the WebSocket listener binds to.
    #[arg(long, default_value_t = 7777)]
    pub port: u16,

    /// Overrides `JOURNALS_DIR`/`EVENT_ARENA_ARTIFACTS_DIR` for this run.
    #[arg(long)]
    pub journals_dir: Option<PathBuf>,

    /// Number of AI-controlled players to spawn into the demo match at
    /// startup. The bot controller (C13) is ambient, not a named wire
    /// interface, so this has no server-pushed equivalent.
    #[arg(long, default_value_t = 0)]
    pub bots: u32,
}

/// The fully resolved configuration for one server run.
pub struct AppConfig {
    /// Simulation tuning.
    pub sim: SimConfig,
    /// Journal subsystem tuning.
    pub journal: JournalConfig,
    /// Listener port.
    pub port: u16,
}

/// A TOML document mirroring the subset of [`SimConfig`] the spec names as
/// recognized configuration (spec §6). Every field is optional so a file
/// may override only what it cares about; the rest fall back to
/// [`SimConfig::default`].
#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    sim: Option<SimConfig>,
}

impl AppConfig {
    /// Resolves configuration from CLI args, an optional TOML file, and
    /// the journal subsystem's environment overrides.
    pub fn load(args: &CliArgs) -> Result<Self, arena_core::ArenaError> {
        let sim = match &args.config {
            Some(path) => read_sim_config(path)?,
            None => SimConfig::default(),
        };
        sim.validate()?;

        let mut journal = JournalConfig::from_env();
        if let Some(dir) = &args.journals_dir {
            journal.base_dir = dir.clone();
        }

        Ok(Self { sim, journal, port: args.port })
    }
}

fn read_sim_config(path: &std::path::Path) -> Result<SimConfig, arena_core::ArenaError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        arena_core::ArenaError::InvalidConfiguration {
            violations: vec![format!("could not read config file {}: {e}", path.display())],
        }
    })?;
    let file: ConfigFile = toml::from_str(&contents).map_err(|e| arena_core::ArenaError::InvalidConfiguration {
        violations: vec![format!("could not parse config file {}: {e}", path.display())],
    })?;
    Ok(file.sim.unwrap_or_default())
}
