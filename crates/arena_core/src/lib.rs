//! # arena_core
//!
//! Types shared between the simulation crate and the server binary: vector
//! math, entity ids, configuration, error types, and the event vocabulary.
//!
//! This crate has no async runtime, no I/O, and no transport dependency —
//! it is pure data and pure functions so that `arena_sim` can stay
//! deterministic and unit-testable without a network in the loop.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod math;

pub use config::SimConfig;
pub use error::ArenaError;
pub use events::{EventMetadata, PickupKind, ProjectileKind, Skill, SimEvent, Weapon, WidgetKey};
pub use ids::{IdAllocator, MatchId, PickupId, PlayerId, ProjectileId};
pub use math::{Rect, Vec2};
