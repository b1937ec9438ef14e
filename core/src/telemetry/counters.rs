//! telemetry/counters.rs
//! Mutable counters collected during compress/decompress calls.
//!
//! Summary: block counts and byte counts per call, merged from per-worker
//! copies and converted into an immutable `TelemetrySnapshot` at the end.
use std::ops::AddAssign;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub chunks: u64,
    pub chunks_literal: u64,
    pub blocks_total: u64,
    pub blocks_literal: u64,
    pub bytes_uncompressed: u64,
    pub bytes_compressed: u64,
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record the fixed header and block table of one chunk as overhead.
    pub fn add_chunk(&mut self, overhead_len: usize) {
        self.chunks += 1;
        self.bytes_overhead += overhead_len as u64;
    }

    /// Record a chunk stored whole as literal bytes.
    pub fn add_literal_chunk(&mut self, header_len: usize, raw_len: usize) {
        self.chunks += 1;
        self.chunks_literal += 1;
        self.bytes_overhead += header_len as u64;
        self.bytes_uncompressed += raw_len as u64;
        self.bytes_compressed += raw_len as u64;
    }

    /// Record one block.
    ///
    /// - `raw_len`: uncompressed block length
    /// - `stored_len`: bytes the block occupies in the chunk
    pub fn add_block(&mut self, raw_len: usize, stored_len: usize) {
        self.blocks_total += 1;
        if stored_len == raw_len {
            self.blocks_literal += 1;
        }
        self.bytes_uncompressed += raw_len as u64;
        self.bytes_compressed += stored_len as u64;
    }

    /// Total bytes a chunk occupies on the wire.
    pub fn output_bytes(&self) -> u64 {
        self.bytes_compressed + self.bytes_overhead
    }

    // Workers keep private counters and the collector merges them.
    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks += other.chunks;
        self.chunks_literal += other.chunks_literal;
        self.blocks_total += other.blocks_total;
        self.blocks_literal += other.blocks_literal;
        self.bytes_uncompressed += other.bytes_uncompressed;
        self.bytes_compressed += other.bytes_compressed;
        self.bytes_overhead += other.bytes_overhead;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
