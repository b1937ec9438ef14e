//! shufflepack-core
//!
//! Blocked, multi-threaded shuffle + compress for typed binary buffers.
//! Pure Rust; unsafe code is confined to the x86 shuffle kernels.

#![deny(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;

// Building blocks
pub mod shuffle;
pub mod compression;
pub mod headers;
pub mod chunk;
pub mod telemetry;

// Execution
pub mod pipeline;
pub mod context;
pub mod api;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::api::{chunk_info, chunk_sizes, compress, decompress, list_codecs, max_compressed_len};
    pub use crate::chunk::{ChunkInfo, ChunkView};
    pub use crate::compression::Codec;
    pub use crate::config::ContextConfig;
    pub use crate::context::Context;
    pub use crate::shuffle::{ShuffleImpl, ShuffleMode};
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::ChunkError;
}
