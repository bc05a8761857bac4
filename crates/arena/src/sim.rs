//! The sim task (spec §5): the single logical thread that owns `World`,
//! `EventBus`, the journal, the HUD dispatcher, and the bot roster. Every
//! other task in this binary only ever reaches the simulation through
//! [`SimCommand`]s sent over an unbounded channel — nothing here ever
//! `.await`s while holding `World`.

use arena_core::{IdAllocator, PlayerId, SimConfig, SimEvent, WidgetKey};
use arena_journal::JournalManager;
use arena_sim::hud::FlushDelay;
use arena_sim::{bot, combat, commands, match_lifecycle, movement, pickups, Clock, EventBus, HudDispatcher, PickupSpawner, World};
use rand::rngs::ThreadRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant as TokioInstant};

use crate::hub::Hub;
use crate::transport::wire;

/// A request handed from a connection task to the sim task.
pub enum SimCommand {
    /// A fresh connection has completed its WebSocket handshake; send it
    /// `connected`/`map:loaded`/the current pickups.
    Connected {
        /// The connection's hub id.
        conn_id: u64,
    },
    /// `cmd:join {name}` from `conn_id`, not yet bound to a player.
    Join {
        /// The requesting connection.
        conn_id: u64,
        /// The chosen display name.
        name: String,
    },
    /// Any other `cmd:*` already bound to its player id by the adapter.
    Command(SimEvent),
    /// `cmd:hud:subscribe`/`cmd:hud:unsubscribe`, already filtered to the
    /// newly-added keys that need an immediate snapshot push.
    HudSnapshotRequest {
        /// The requesting connection.
        conn_id: u64,
        /// Newly-subscribed widget keys (already registered in the hub).
        widgets: Vec<WidgetKey>,
    },
    /// A connection closed; clean up its player if it had joined.
    Disconnect {
        /// The player it was bound to, if it had joined.
        player_id: Option<PlayerId>,
    },
}

/// Runs the sim task to completion. Only returns on channel close (the
/// process is shutting down), after flushing the journal one last time.
pub async fn run(mut rx: mpsc::UnboundedReceiver<SimCommand>, hub: Arc<Hub>, journal: Arc<JournalManager>, sim_cfg: SimConfig, bot_count: u32) {
    let mut world = World::new(&sim_cfg);
    let mut bus = EventBus::new();
    let mut hud = HudDispatcher::new();
    let mut pickup_spawner = PickupSpawner::new();
    let projectile_ids = IdAllocator::new();
    let pickup_ids = IdAllocator::new();
    let mut rng = rand::thread_rng();
    let mut clock = Clock::new();
    let mut heartbeat_accum_ms = 0.0;
    let mut hud_pending = false;
    let mut hud_deadline = TokioInstant::now();

    let started_at = now_ms();
    let match_id = match_lifecycle::create_match(&mut world, &sim_cfg.game_match, &mut bus, "ffa".to_string(), started_at as f64);
    tracing::info!(%match_id, "started demo match");

    let mut bots = Vec::new();
    for i in 0..bot_count {
        let id = PlayerId::new();
        let name = format!("bot-{i}");
        let now = started_at as f64;
        let event = SimEvent::CmdJoin { player_id: id.clone(), name: name.clone() };
        bus.emit(event.clone());
        commands::handle(&mut world, &mut bus, &sim_cfg, &projectile_ids, &mut rng, now, &event);
        bots.push(bot::BotController::new(id, now));
    }
    let initial = bus.drain_log();
    dispatch_drained(initial, &world, now_ms(), &journal, &mut hud, &hub, &mut hud_pending, &mut hud_deadline);

    clock.start();
    let mut tick_interval = interval(arena_sim::clock::TICK_PERIOD);
    let mut auto_save = interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            biased;

            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                handle_command(cmd, &mut world, &mut bus, &sim_cfg, &projectile_ids, &mut rng, &hub, &hud);
                let drained = bus.drain_log();
                dispatch_drained(drained, &world, now_ms(), &journal, &mut hud, &hub, &mut hud_pending, &mut hud_deadline);
            }

            _ = tick_interval.tick() => {
                let Some(dt) = clock.tick(Instant::now()) else { continue };
                let now = now_ms() as f64;

                bus.emit(SimEvent::TickPre { dt });
                movement::step(&mut world, &mut bus, &sim_cfg, now, dt, &mut heartbeat_accum_ms);
                let pre = bus.drain_log();
                dispatch_drained(pre, &world, now_ms(), &journal, &mut hud, &hub, &mut hud_pending, &mut hud_deadline);

                bus.emit(SimEvent::TickPost { dt });
                combat::step(&mut world, &mut bus, &sim_cfg, now);
                pickups::step(&mut world, &sim_cfg, &mut bus, now);
                pickup_spawner.step(&mut world, &sim_cfg, &mut bus, &pickup_ids, &mut rng, dt * 1000.0);

                let was_running = world.current_match.is_some();
                match_lifecycle::step(&mut world, &sim_cfg.game_match, &mut bus, now);
                if was_running && world.current_match.is_none() {
                    let id = match_lifecycle::create_match(&mut world, &sim_cfg.game_match, &mut bus, "ffa".to_string(), now);
                    tracing::info!(%id, "started next demo match");
                }

                bot::step(&mut bots, &world, &mut bus, now);

                // bot::step only emits cmd:* intents onto the bus; apply
                // their effects the same way a network command would be,
                // then dispatch the cmd events themselves followed by
                // whatever applying them produced.
                let post_batch = bus.drain_log();
                for event in &post_batch {
                    if is_command_event(event) {
                        commands::handle(&mut world, &mut bus, &sim_cfg, &projectile_ids, &mut rng, now, event);
                    }
                }
                dispatch_drained(post_batch, &world, now_ms(), &journal, &mut hud, &hub, &mut hud_pending, &mut hud_deadline);
                let followups = bus.drain_log();
                dispatch_drained(followups, &world, now_ms(), &journal, &mut hud, &hub, &mut hud_pending, &mut hud_deadline);
            }

            _ = sleep_until(hud_deadline), if hud_pending => {
                hud_pending = false;
                flush_hud(&mut hud, &world, now_ms() as f64, &hub);
            }

            _ = auto_save.tick() => {
                if let Some(save) = journal.flush(now_ms()) {
                    commit_save_blocking(journal.clone(), save).await;
                }
            }
        }
    }

    if let Some(save) = journal.flush(now_ms()) {
        commit_save_blocking(journal, save).await;
    }
}

fn is_command_event(event: &SimEvent) -> bool {
    matches!(
        event,
        SimEvent::CmdJoin { .. }
            | SimEvent::CmdMove { .. }
            | SimEvent::CmdAim { .. }
            | SimEvent::CmdCast { .. }
            | SimEvent::CmdRespawn { .. }
            | SimEvent::CmdLeave { .. }
    )
}

#[allow(clippy::too_many_arguments)]
fn handle_command(
    cmd: SimCommand,
    world: &mut World,
    bus: &mut EventBus,
    sim_cfg: &SimConfig,
    projectile_ids: &IdAllocator,
    rng: &mut ThreadRng,
    hub: &Arc<Hub>,
    hud: &HudDispatcher,
) {
    match cmd {
        SimCommand::Connected { conn_id } => {
            hub.send_to(conn_id, &wire::connected_frame(now_ms()));
            hub.send_to(conn_id, &wire::map_loaded_frame(world));
            for pickup in world.pickups.values() {
                hub.send_to(conn_id, &wire::encode_event(&SimEvent::PickupSpawned { id: pickup.id, pos: pickup.pos, kind: pickup.kind }));
            }
        }
        SimCommand::Join { conn_id, name } => {
            let player_id = PlayerId::new();
            let now = now_ms() as f64;
            let event = SimEvent::CmdJoin { player_id: player_id.clone(), name: name.clone() };
            bus.emit(event.clone());
            commands::handle(world, bus, sim_cfg, projectile_ids, rng, now, &event);
            hub.bind_player(conn_id, player_id.clone());
            hub.send_to(conn_id, &wire::session_started_frame(world, &player_id, &name));
        }
        SimCommand::Command(event) => {
            let now = now_ms() as f64;
            bus.emit(event.clone());
            commands::handle(world, bus, sim_cfg, projectile_ids, rng, now, &event);
        }
        SimCommand::HudSnapshotRequest { conn_id, widgets } => {
            let now = now_ms() as f64;
            for key in widgets {
                let snapshot = hud.snapshot_one(key, world, now);
                hub.send_to(conn_id, &wire::encode_widget_snapshot(key, &snapshot));
            }
        }
        SimCommand::Disconnect { player_id } => {
            if let Some(player_id) = player_id {
                let now = now_ms() as f64;
                let event = SimEvent::CmdLeave { player_id: player_id.clone() };
                bus.emit(event.clone());
                commands::handle(world, bus, sim_cfg, projectile_ids, rng, now, &event);
            }
        }
    }
}

/// Journals, HUD-dirties, and (for broadcastable kinds) fans out one
/// drained batch of events, in emission order. Flushes the HUD inline for
/// `FlushDelay::Immediate`; schedules [`sleep_until`] for `Delayed`.
fn dispatch_drained(
    events: Vec<SimEvent>,
    world: &World,
    now: u64,
    journal: &Arc<JournalManager>,
    hud: &mut HudDispatcher,
    hub: &Arc<Hub>,
    hud_pending: &mut bool,
    hud_deadline: &mut TokioInstant,
) {
    for event in &events {
        if let Some(save) = journal.record(event, now) {
            let journal = journal.clone();
            tokio::spawn(async move { commit_save_blocking(journal, save).await });
        }

        if let SimEvent::PlayerDead { player_id, .. } = event {
            hub.send_to_player(player_id, &wire::encode_event(event));
        } else if wire::is_broadcastable(event.kind()) {
            hub.broadcast(&wire::encode_event(event));
        }

        match hud.handle_event(event, now as f64) {
            Some(FlushDelay::Immediate) => {
                flush_hud(hud, world, now as f64, hub);
                *hud_pending = false;
            }
            Some(FlushDelay::Delayed) => {
                if !*hud_pending {
                    *hud_pending = true;
                    *hud_deadline = TokioInstant::now() + Duration::from_millis(30);
                }
            }
            None => {}
        }
    }
}

fn flush_hud(hud: &mut HudDispatcher, world: &World, now: f64, hub: &Arc<Hub>) {
    for (key, snapshot) in hud.flush(world, now) {
        hub.broadcast_to_hud_subscribers(key, &wire::encode_widget_snapshot(key, &snapshot));
    }
}

async fn commit_save_blocking(journal: Arc<JournalManager>, save: arena_journal::PendingSave) {
    let result = tokio::task::spawn_blocking(move || journal.commit_save(save)).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "journal save failed"),
        Err(e) => tracing::warn!(error = %e, "journal save task panicked"),
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
