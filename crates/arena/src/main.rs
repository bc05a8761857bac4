//! Event Arena server binary: wires together configuration, the journal,
//! the sim task, and the WebSocket transport adapter under one Tokio
//! multi-threaded runtime (spec §5).

mod config;
mod hub;
mod sim;
mod transport;

use clap::Parser;
use config::{AppConfig, CliArgs};
use hub::Hub;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;

fn init_tracing() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = CliArgs::parse();
    let cfg = match AppConfig::load(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let journal = Arc::new(arena_journal::JournalManager::new(cfg.journal, now_ms()));
    if let Err(e) = journal.load_index() {
        tracing::warn!(error = %e, "could not load journal index, starting with an empty one");
    }

    let hub = Arc::new(Hub::new());
    let (sim_tx, sim_rx) = mpsc::unbounded_channel();

    let sim_handle = {
        let hub = hub.clone();
        let journal = journal.clone();
        tokio::spawn(sim::run(sim_rx, hub, journal, cfg.sim, args.bots))
    };

    let port = cfg.port;
    tokio::select! {
        result = transport::accept_loop(port, hub, sim_tx) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "listener failed");
                return ExitCode::FAILURE;
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal, flushing journal");
            if let Some(save) = journal.flush(now_ms()) {
                let journal = journal.clone();
                let _ = tokio::task::spawn_blocking(move || journal.commit_save(save)).await;
            }
        }
    }

    drop(sim_handle);
    ExitCode::SUCCESS
}

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
