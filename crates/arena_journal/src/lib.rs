//! Durable event journal for an authoritative real-time arena server.
//!
//! Every non-excluded event the simulation produces is appended to a live,
//! in-memory [`Journal`] and periodically snapshotted to disk through a
//! [`JournalManager`], either as a plain JSON document or, above a size
//! threshold, a streamed batch encoding — optionally gzip-compressed. A
//! [`JournalIndex`] tracks every journal ever saved so past matches and
//! sessions can be located without scanning the filesystem.
//!
//! This crate performs no async I/O itself: [`JournalManager::record`]
//! only ever touches memory, and [`JournalManager::commit_save`] is plain
//! blocking filesystem access the caller is expected to run off its own
//! hot path (e.g. inside `tokio::task::spawn_blocking`).

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod entry;
pub mod error;
pub mod format;
pub mod index;
pub mod journal;
pub mod manager;
pub mod metadata;

pub use config::JournalConfig;
pub use entry::JournalEntry;
pub use error::{JournalError, JournalResult};
pub use format::{compress_bytes, decompress_bytes, read_durable_journal, write_durable_journal, DEFAULT_STREAM_THRESHOLD};
pub use index::{IndexEntry, JournalIndex};
pub use journal::{Journal, JournalScope};
pub use manager::{JournalManager, PendingSave};
pub use metadata::{DurableJournal, JournalMetadata, JOURNAL_FORMAT_VERSION};
