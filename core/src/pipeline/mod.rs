//! pipeline/mod.rs
//! Block-parallel compress and decompress passes over a persistent pool.
//!
//! Notes:
//! - Blocks are independent, so any worker can take any block.
//! - Output is byte-identical for every thread count.

pub mod pool;
pub mod compress;
pub mod decompress;

pub use pool::{partition_runs, WorkerPool};
pub use compress::{compress_chunk, max_compressed_len, CompressParams};
pub use decompress::{decompress_chunk, decompress_items};
