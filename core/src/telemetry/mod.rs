//! telemetry/mod.rs
//! Counters, stage timers and immutable per-call snapshots.
//!
//! Notes:
//! - Workers record into private counters; the collector merges them, so
//!   no locks or atomics sit on the hot path.
//! - Snapshots are serde-serializable for logs and benchmarks.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
