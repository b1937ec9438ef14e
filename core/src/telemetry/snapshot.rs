//! telemetry/snapshot.rs
//! Immutable per-call telemetry.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

/// Direction of the call a snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Compress,
    Decompress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub operation: Operation,
    pub threads: usize,
    pub counters: TelemetryCounters,
    /// Wire bytes over uncompressed bytes (may exceed 1.0 for literal chunks).
    pub compression_ratio: f64,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(operation: Operation, threads: usize, counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let compression_ratio = if counters.bytes_uncompressed > 0 {
            counters.output_bytes() as f64 / counters.bytes_uncompressed as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_uncompressed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            operation,
            threads,
            counters: counters.clone(),
            compression_ratio,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn output_bytes(&self) -> u64 {
        self.counters.output_bytes()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
