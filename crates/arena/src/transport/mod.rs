//! WebSocket transport adapter (C10): the TCP accept loop plus the
//! per-connection read/write tasks and the wire-format translation layer.

pub mod connection;
pub mod wire;

use crate::hub::Hub;
use crate::sim::SimCommand;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Binds `port` and accepts connections forever, spawning one task per
/// connection. Returns only on a listener bind failure.
pub async fn accept_loop(port: u16, hub: Arc<Hub>, sim_tx: mpsc::UnboundedSender<SimCommand>) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "listening for connections");

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        tracing::debug!(%addr, "accepted connection");

        let hub = hub.clone();
        let sim_tx = sim_tx.clone();
        tokio::spawn(async move {
            connection::handle_connection(stream, hub, sim_tx).await;
        });
    }
}
