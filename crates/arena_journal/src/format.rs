//! On-disk encoding: plain or streaming JSON, optionally gzip-compressed
//! (spec §4.12 "Durable format").

use crate::error::{JournalError, JournalResult};
use crate::metadata::DurableJournal;
use flate2::write::GzEncoder;
use flate2::read::GzDecoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// Below this many entries a journal is encoded in one shot
/// (`serde_json::to_writer`); at or above it, entries are streamed out in
/// batches to bound peak memory (spec §4.12 default `10_000`).
pub const DEFAULT_STREAM_THRESHOLD: usize = 10_000;

/// Entries per batch when streaming (spec §4.12: "batches of 1000").
const STREAM_BATCH_SIZE: usize = 1000;

/// Serializes `durable` to `writer`, choosing the encode-then-write or
/// streaming strategy based on `stream_threshold`, then gzip-compressing
/// if `compress` is set.
pub fn write_durable_journal<W: Write>(
    writer: W,
    durable: &DurableJournal,
    stream_threshold: usize,
    compress: bool,
) -> JournalResult<()> {
    if compress {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        write_body(&mut encoder, durable, stream_threshold).map_err(io_err)?;
        encoder.finish().map_err(io_err)?;
    } else {
        let mut buffered = io::BufWriter::new(writer);
        write_body(&mut buffered, durable, stream_threshold).map_err(io_err)?;
        buffered.flush().map_err(io_err)?;
    }
    Ok(())
}

fn write_body<W: Write>(writer: &mut W, durable: &DurableJournal, stream_threshold: usize) -> io::Result<()> {
    if durable.entries.len() < stream_threshold {
        serde_json::to_writer(writer, durable)?;
        return Ok(());
    }

    write!(writer, "{{\"metadata\":")?;
    serde_json::to_writer(&mut *writer, &durable.metadata)?;
    write!(writer, ",\"entries\":[")?;
    for (batch_index, batch) in durable.entries.chunks(STREAM_BATCH_SIZE).enumerate() {
        if batch_index > 0 {
            write!(writer, ",")?;
        }
        for (i, entry) in batch.iter().enumerate() {
            if i > 0 {
                write!(writer, ",")?;
            }
            serde_json::to_writer(&mut *writer, entry)?;
        }
        // Flush once per batch so a slow downstream writer applies
        // backpressure between batches rather than buffering everything.
        writer.flush()?;
    }
    write!(writer, "]}}")?;
    Ok(())
}

/// Deserializes a [`DurableJournal`] previously written by
/// [`write_durable_journal`]. `compressed` must match how it was written —
/// callers track this via the filename suffix (`.json.gz` vs `.json`) or
/// the index.
pub fn read_durable_journal<R: Read>(reader: R, compressed: bool) -> JournalResult<DurableJournal> {
    if compressed {
        let mut decoder = GzDecoder::new(reader);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf).map_err(io_err)?;
        serde_json::from_slice(&buf).map_err(json_err)
    } else {
        serde_json::from_reader(reader).map_err(json_err)
    }
}

/// Gzip-compresses `data`.
pub fn compress_bytes(data: &[u8]) -> JournalResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(io_err)?;
    encoder.finish().map_err(io_err)
}

/// Decompresses gzip-compressed `data`.
pub fn decompress_bytes(data: &[u8]) -> JournalResult<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(io_err)?;
    Ok(out)
}

fn io_err(e: io::Error) -> JournalError {
    JournalError::JournalIo(e.to_string())
}

fn json_err(e: serde_json::Error) -> JournalError {
    JournalError::MalformedJournal(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{Journal, JournalScope};
    use arena_core::{PlayerId, SimEvent, Vec2};

    fn sample_journal(entry_count: usize) -> DurableJournal {
        let mut journal = Journal::new("j1".to_string(), JournalScope::Session, 0);
        for i in 0..entry_count {
            journal.record(&SimEvent::PlayerMove { player_id: PlayerId::from_string("p1"), pos: Vec2::new(i as f64, 0.0) }, i as u64);
        }
        journal.snapshot(entry_count, entry_count as u64)
    }

    #[test]
    fn compress_then_decompress_round_trips() {
        let data = b"hello journal world".to_vec();
        let compressed = compress_bytes(&data).unwrap();
        let restored = decompress_bytes(&compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn plain_encoding_round_trips_below_threshold() {
        let durable = sample_journal(5);
        let mut buf = Vec::new();
        write_durable_journal(&mut buf, &durable, DEFAULT_STREAM_THRESHOLD, false).unwrap();
        let restored = read_durable_journal(buf.as_slice(), false).unwrap();
        assert_eq!(restored.entries.len(), 5);
        assert_eq!(restored.metadata.event_count, 5);
    }

    #[test]
    fn streaming_encoding_round_trips_above_threshold() {
        let durable = sample_journal(50);
        let mut buf = Vec::new();
        write_durable_journal(&mut buf, &durable, 10, false).unwrap();
        let restored = read_durable_journal(buf.as_slice(), false).unwrap();
        assert_eq!(restored.entries.len(), 50);
        assert_eq!(restored.entries[49].game_time, 49);
    }

    #[test]
    fn compressed_round_trip_preserves_entries() {
        let durable = sample_journal(20);
        let mut buf = Vec::new();
        write_durable_journal(&mut buf, &durable, DEFAULT_STREAM_THRESHOLD, true).unwrap();
        let restored = read_durable_journal(buf.as_slice(), true).unwrap();
        assert_eq!(restored.entries.len(), 20);
    }
}
