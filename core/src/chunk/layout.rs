//! chunk/layout.rs
//!
//! Block sizing policy.
//!
//! Design notes:
//! - The target block size shrinks as the level rises: higher levels spend
//!   more CPU per byte and keep a smaller shuffle+compress working set hot.
//!   levels 0-3 -> 256 KiB, 4-6 -> 128 KiB, 7-8 -> 64 KiB, 9 -> 32 KiB.
//! - Block sizes are multiples of the element size unless the whole buffer
//!   fits one block, so a transposition never straddles a block boundary.
//! - Block count is capped at `MAX_BLOCK_COUNT` by growing the block size.
//! - The final block absorbs the remainder and may be shorter.

use std::ops::Range;

use crate::constants::{L1_CACHE, L2_CACHE, MAX_BLOCK_COUNT, MAX_LEVEL, MAX_TYPESIZE};
use crate::headers::ChunkHeader;
use crate::types::ChunkError;
use crate::utils::div_ceil;

/// Cache-derived block size target for a compression level.
pub fn target_block_size(level: u8) -> usize {
    match level {
        0..=3 => L2_CACHE,
        4..=6 => L2_CACHE / 2,
        7..=8 => L2_CACHE / 4,
        _ => L1_CACHE,
    }
}

/// How a buffer is cut into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub nbytes: usize,
    pub elem_size: usize,
    pub block_size: usize,
    pub nblocks: usize,
    pub last_block_len: usize,
}

impl BlockLayout {
    /// Choose a layout for `nbytes` of `elem_size`-byte elements at `level`.
    ///
    /// `forced` overrides the level target but is still aligned and bounded.
    pub fn compute(
        nbytes: usize,
        elem_size: usize,
        level: u8,
        forced: Option<usize>,
    ) -> Result<Self, ChunkError> {
        if elem_size == 0 || elem_size > MAX_TYPESIZE {
            return Err(ChunkError::invalid(format!(
                "elem_size {} outside 1..={}", elem_size, MAX_TYPESIZE
            )));
        }
        if level > MAX_LEVEL {
            return Err(ChunkError::invalid(format!("level {} outside 0..={}", level, MAX_LEVEL)));
        }
        if forced == Some(0) {
            return Err(ChunkError::invalid("forced block size must be non-zero"));
        }

        let target = forced.unwrap_or_else(|| target_block_size(level));
        let mut block_size = if nbytes == 0 {
            elem_size
        } else if target >= nbytes {
            nbytes
        } else {
            (target / elem_size * elem_size).max(elem_size).min(nbytes)
        };

        if div_ceil(nbytes, block_size) > MAX_BLOCK_COUNT {
            let min_size = div_ceil(nbytes, MAX_BLOCK_COUNT);
            block_size = div_ceil(min_size, elem_size) * elem_size;
            if block_size >= nbytes {
                block_size = nbytes;
            }
        }

        if block_size > u32::MAX as usize {
            return Err(ChunkError::invalid(format!(
                "buffer of {} bytes needs blocks larger than the format allows", nbytes
            )));
        }

        Ok(Self::with_block_size(nbytes, elem_size, block_size))
    }

    /// Layout recorded in an already validated header.
    pub fn from_header(h: &ChunkHeader) -> Self {
        Self::with_block_size(h.uncompressed_len as usize, h.elem_size as usize, h.block_size as usize)
    }

    fn with_block_size(nbytes: usize, elem_size: usize, block_size: usize) -> Self {
        let nblocks = div_ceil(nbytes, block_size);
        let last_block_len = if nblocks == 0 {
            0
        } else {
            nbytes - (nblocks - 1) * block_size
        };
        Self { nbytes, elem_size, block_size, nblocks, last_block_len }
    }

    /// Raw (uncompressed) length of block `index`.
    #[inline]
    pub fn block_len(&self, index: usize) -> usize {
        if index + 1 == self.nblocks {
            self.last_block_len
        } else {
            self.block_size
        }
    }

    /// Byte range of block `index` in the uncompressed buffer.
    #[inline]
    pub fn block_range(&self, index: usize) -> Range<usize> {
        let start = index * self.block_size;
        start..start + self.block_len(index)
    }

    /// Blocks covering the byte range `bytes` (which must be non-empty and in bounds).
    pub fn blocks_covering(&self, bytes: Range<usize>) -> Range<usize> {
        if bytes.is_empty() || self.block_size == 0 {
            return 0..0;
        }
        let first = bytes.start / self.block_size;
        let last = (bytes.end - 1) / self.block_size;
        first..(last + 1).min(self.nblocks)
    }
}
