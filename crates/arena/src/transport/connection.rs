//! Per-connection adapter (C10): one read task and one write task per
//! accepted WebSocket, bridged to the sim task through [`SimCommand`] and
//! to the hub's outbound queue through [`crate::hub::Hub`].

use arena_core::SimEvent;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::hub::Hub;
use crate::sim::SimCommand;
use crate::transport::wire::{self, Inbound};
use std::sync::Arc;

/// Accepts one TCP connection, upgrades it to a WebSocket, registers it
/// with the hub, and runs its read/write tasks until either side closes.
pub async fn handle_connection(stream: TcpStream, hub: Arc<Hub>, sim_tx: mpsc::UnboundedSender<SimCommand>) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(error = %e, "websocket handshake failed");
            return;
        }
    };

    let (conn_id, mut outbound_rx) = hub.register();
    let (mut ws_write, mut ws_read) = ws.split();

    let write_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if ws_write.send(message).await.is_err() {
                break;
            }
        }
    });

    if sim_tx.send(SimCommand::Connected { conn_id }).is_err() {
        write_task.abort();
        hub.remove(conn_id);
        return;
    }

    while let Some(frame) = ws_read.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(conn_id, error = %e, "websocket read error");
                break;
            }
        };

        match message {
            Message::Text(text) => handle_text(&text, conn_id, &hub, &sim_tx),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
        }
    }

    let player_id = hub.remove(conn_id);
    let _ = sim_tx.send(SimCommand::Disconnect { player_id });
    write_task.abort();
}

/// This connection's read half only ever needs to decode inbound frames,
/// bind its own player id onto the ones that need one, and hand hud
/// subscribe/unsubscribe off to the hub directly — the sim task still
/// pushes the initial snapshot for any newly-subscribed widget (spec
/// §4.10 "push an immediate widget snapshot per newly-subscribed widget").
fn handle_text(text: &str, conn_id: u64, hub: &Arc<Hub>, sim_tx: &mpsc::UnboundedSender<SimCommand>) {
    let inbound = match wire::decode_inbound(text) {
        Ok(inbound) => inbound,
        Err(reason) => {
            tracing::debug!(conn_id, reason, "dropping unrecognized cmd:* frame");
            return;
        }
    };

    match inbound {
        Inbound::Join { name } => {
            let _ = sim_tx.send(SimCommand::Join { conn_id, name });
        }
        Inbound::HudSubscribe { widgets } => {
            let added = hub.subscribe(conn_id, &widgets);
            if !added.is_empty() {
                let _ = sim_tx.send(SimCommand::HudSnapshotRequest { conn_id, widgets: added });
            }
        }
        Inbound::HudUnsubscribe { widgets } => {
            hub.unsubscribe(conn_id, &widgets);
        }
        Inbound::Leave => {
            // spec §4.10 lists `cmd:leave {}` and connection close as two
            // independent triggers for the same cleanup; a client may ask
            // to leave the match without hanging up its socket.
            if let Some(player_id) = hub.player_of(conn_id) {
                let _ = sim_tx.send(SimCommand::Disconnect { player_id: Some(player_id) });
            }
        }
        other => {
            let Some(player_id) = hub.player_of(conn_id) else {
                tracing::debug!(conn_id, "cmd:* before cmd:join, dropping");
                return;
            };
            let event = to_sim_event(player_id, other);
            let _ = sim_tx.send(SimCommand::Command(event));
        }
    }
}

fn to_sim_event(player_id: arena_core::PlayerId, inbound: Inbound) -> SimEvent {
    match inbound {
        Inbound::Move { dir } => SimEvent::CmdMove { player_id, dir },
        Inbound::Aim { dir } => SimEvent::CmdAim { player_id, dir },
        Inbound::Cast { skill } => SimEvent::CmdCast { player_id, skill },
        Inbound::Respawn => SimEvent::CmdRespawn { player_id },
        Inbound::Join { .. } | Inbound::Leave | Inbound::HudSubscribe { .. } | Inbound::HudUnsubscribe { .. } => {
            unreachable!("handled before to_sim_event is called")
        }
    }
}

