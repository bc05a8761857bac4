//! # arena_sim
//!
//! The authoritative tick simulation: event bus, world state, spawn
//! manager, movement/collision, combat, pickups, match lifecycle, HUD
//! projection, and the bot controller (C1-C4, C6-C9, C11, C13).
//!
//! This crate has no networking and no disk I/O. The server binary in
//! `arena` owns the async runtime, drives [`clock::Clock`] and the
//! per-module `step` functions each tick, and reacts to the events
//! [`bus::EventBus`] produces by forwarding them to the transport adapter
//! and the journal.
//!
//! Everything here runs on a single logical thread: no module in this
//! crate performs blocking I/O or holds a lock across an `.await`, because
//! there is no `.await` anywhere in this crate.

#![deny(unsafe_code)]

pub mod bot;
pub mod bus;
pub mod clock;
pub mod combat;
pub mod commands;
pub mod hud;
pub mod match_lifecycle;
pub mod movement;
pub mod pickups;
pub mod spawn;
pub mod world;

pub use bot::BotController;
pub use bus::EventBus;
pub use clock::Clock;
pub use hud::Dispatcher as HudDispatcher;
pub use pickups::PickupSpawner;
pub use world::{MatchPhase, MatchState, Obstacle, Pickup, Player, Projectile, World};
