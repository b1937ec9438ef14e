//! chunk/encode.rs
//!
//! Chunk assembly: header, block-length table, payloads.
//!
//! Layout:
//!
//! ```text
//! [ header            (40)          ]
//! [ block lengths     (4 * nblocks) ]   u32 LE, one per block
//! [ block payloads    (sum)         ]   source order
//! ```
//!
//! A literal chunk (MEMCPYED) is `[ header ][ raw source ]`.

use byteorder::{ByteOrder, LittleEndian};

use crate::chunk::layout::BlockLayout;
use crate::compression::Codec;
use crate::constants::{BLOCK_ENTRY_LEN, HEADER_LEN};
use crate::headers::{encode_header_le, ChunkFlags, ChunkHeader};
use crate::shuffle::ShuffleMode;

/// One block's stored bytes after the compress pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlock {
    pub index: usize,
    /// Compressed bytes, or the filtered raw bytes when `literal`.
    pub payload: Vec<u8>,
    pub literal: bool,
}

/// Header for a chunk with the given layout and stored length.
pub fn build_header(
    layout: &BlockLayout,
    mode: ShuffleMode,
    codec: Codec,
    level: u8,
    memcpyed: bool,
    compressed_len: usize,
) -> ChunkHeader {
    let mut chunk_flags = ChunkFlags::from_bits_truncate(mode.header_bits());
    if memcpyed {
        chunk_flags |= ChunkFlags::MEMCPYED;
    }
    ChunkHeader {
        flags: chunk_flags.bits(),
        codec: codec as u8,
        level,
        elem_size: layout.elem_size as u32,
        block_size: layout.block_size as u32,
        uncompressed_len: layout.nbytes as u64,
        compressed_len: compressed_len as u64,
        ..Default::default()
    }
}

/// Total size of a blocked chunk holding `blocks`.
pub fn blocked_len(blocks: &[EncodedBlock]) -> usize {
    HEADER_LEN + blocks.len() * BLOCK_ENTRY_LEN + blocks.iter().map(|b| b.payload.len()).sum::<usize>()
}

/// Write a blocked chunk into `dst`; `blocks` must be sorted by index.
///
/// Returns the number of bytes written. `dst` must hold `header.compressed_len` bytes.
pub fn write_blocked_chunk(header: &ChunkHeader, blocks: &[EncodedBlock], dst: &mut [u8]) -> usize {
    let total = header.compressed_len as usize;
    debug_assert_eq!(total, blocked_len(blocks));

    dst[..HEADER_LEN].copy_from_slice(&encode_header_le(header));

    let mut table_pos = HEADER_LEN;
    let mut data_pos = HEADER_LEN + blocks.len() * BLOCK_ENTRY_LEN;
    for (expected, block) in blocks.iter().enumerate() {
        debug_assert_eq!(block.index, expected, "blocks out of order");
        LittleEndian::write_u32(&mut dst[table_pos..table_pos + BLOCK_ENTRY_LEN], block.payload.len() as u32);
        table_pos += BLOCK_ENTRY_LEN;

        dst[data_pos..data_pos + block.payload.len()].copy_from_slice(&block.payload);
        data_pos += block.payload.len();
    }

    debug_assert_eq!(data_pos, total);
    data_pos
}

/// Write a whole-chunk literal: header followed by the unfiltered source.
pub fn write_memcpyed_chunk(header: &ChunkHeader, src: &[u8], dst: &mut [u8]) -> usize {
    let total = HEADER_LEN + src.len();
    debug_assert_eq!(total as u64, header.compressed_len);

    dst[..HEADER_LEN].copy_from_slice(&encode_header_le(header));
    dst[HEADER_LEN..total].copy_from_slice(src);
    total
}
