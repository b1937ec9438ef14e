//! api.rs
//!
//! One-shot free functions. Each call builds a temporary `Context` and
//! releases its workers before returning.

use crate::chunk::{ChunkInfo, ChunkView};
use crate::config::ContextConfig;
use crate::context::Context;
use crate::headers::decode_header_le;
use crate::shuffle::ShuffleMode;
use crate::types::ChunkError;

pub use crate::compression::list_codecs;
pub use crate::pipeline::max_compressed_len;

/// Compress `src` into `dst` with the default backend.
pub fn compress(
    level: u8,
    shuffle: ShuffleMode,
    elem_size: usize,
    thread_count: usize,
    src: &[u8],
    dst: &mut [u8],
) -> Result<usize, ChunkError> {
    let ctx = Context::new(ContextConfig {
        threads: thread_count,
        shuffle,
        level,
        ..ContextConfig::default()
    })?;
    let result = ctx.compress(level, elem_size, src, dst);
    ctx.release_resources();
    result
}

/// Decompress `src` into `dst` on the calling thread.
pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize, ChunkError> {
    let ctx = Context::default();
    let result = ctx.decompress(src, dst);
    ctx.release_resources();
    result
}

/// `(uncompressed, compressed, block_size)` from the header alone.
pub fn chunk_sizes(src: &[u8]) -> Result<(usize, usize, usize), ChunkError> {
    let h = decode_header_le(src)?;
    Ok((h.uncompressed_len as usize, h.compressed_len as usize, h.block_size as usize))
}

/// Header facts of a chunk, after validating header and block table.
pub fn chunk_info(src: &[u8]) -> Result<ChunkInfo, ChunkError> {
    Ok(ChunkView::parse(src)?.info())
}
