//! chunk/view.rs
//!
//! Validated, zero-copy view over an encoded chunk.
//!
//! Design notes:
//! - `parse` checks every declared length against the real buffer and the
//!   block table before handing out a single payload slice.
//! - Block offsets are prefix sums of the table, so any block is reachable
//!   in O(1) without touching its predecessors.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::chunk::layout::BlockLayout;
use crate::compression::Codec;
use crate::constants::{BLOCK_ENTRY_LEN, HEADER_LEN};
use crate::headers::{decode_header_le, ChunkHeader, HeaderError};
use crate::shuffle::ShuffleMode;

#[derive(Debug, Clone)]
pub struct ChunkView<'a> {
    header: ChunkHeader,
    layout: BlockLayout,
    buf: &'a [u8],
    /// Payload start offsets; `offsets[i + 1] - offsets[i]` is block `i`'s stored length.
    offsets: Vec<usize>,
}

impl<'a> ChunkView<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<Self, HeaderError> {
        let header = decode_header_le(buf)?;

        if header.compressed_len != buf.len() as u64 {
            return Err(HeaderError::LengthMismatch {
                field: "compressed_len",
                have: header.compressed_len,
                need: buf.len() as u64,
            });
        }

        let layout = BlockLayout::from_header(&header);
        if header.is_memcpyed() {
            return Ok(Self { header, layout, buf, offsets: Vec::new() });
        }

        let nblocks = layout.nblocks;
        let table_end = HEADER_LEN + nblocks * BLOCK_ENTRY_LEN;
        let table = buf.get(HEADER_LEN..table_end)
            .ok_or(HeaderError::BlockTableOutOfBounds { table_end, have: buf.len() })?;

        let mut offsets = Vec::with_capacity(nblocks + 1);
        let mut pos = table_end;
        offsets.push(pos);
        for (index, entry) in table.chunks_exact(BLOCK_ENTRY_LEN).enumerate() {
            let stored = LittleEndian::read_u32(entry);
            let raw = layout.block_len(index);
            if stored == 0 || stored as usize > raw {
                return Err(HeaderError::InvalidBlockLength { index, have: stored, max: raw });
            }
            pos += stored as usize;
            if pos > buf.len() {
                return Err(HeaderError::LengthMismatch {
                    field: "block lengths",
                    have: pos as u64,
                    need: buf.len() as u64,
                });
            }
            offsets.push(pos);
        }

        if pos != buf.len() {
            return Err(HeaderError::LengthMismatch {
                field: "block lengths",
                have: pos as u64,
                need: buf.len() as u64,
            });
        }

        Ok(Self { header, layout, buf, offsets })
    }

    pub fn header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn is_memcpyed(&self) -> bool {
        self.header.is_memcpyed()
    }

    pub fn uncompressed_len(&self) -> usize {
        self.layout.nbytes
    }

    pub fn nblocks(&self) -> usize {
        if self.is_memcpyed() { 0 } else { self.layout.nblocks }
    }

    pub fn block_raw_len(&self, index: usize) -> usize {
        self.layout.block_len(index)
    }

    pub fn block_stored_len(&self, index: usize) -> usize {
        self.offsets[index + 1] - self.offsets[index]
    }

    pub fn block_payload(&self, index: usize) -> &'a [u8] {
        &self.buf[self.offsets[index]..self.offsets[index + 1]]
    }

    /// A block stored at exactly its raw length holds filtered bytes, not backend output.
    pub fn is_block_literal(&self, index: usize) -> bool {
        self.block_stored_len(index) == self.block_raw_len(index)
    }

    /// Raw source bytes of a MEMCPYED chunk.
    pub fn literal_payload(&self) -> &'a [u8] {
        &self.buf[HEADER_LEN..]
    }

    pub fn info(&self) -> ChunkInfo {
        ChunkInfo::from_header(&self.header)
    }
}

/// Header facts a caller can inspect without decompressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    pub version: u8,
    pub memcpyed: bool,
    pub shuffle: ShuffleMode,
    pub codec: Codec,
    pub level: u8,
    pub elem_size: usize,
    pub block_size: usize,
    pub uncompressed_len: usize,
    pub compressed_len: usize,
    pub nblocks: usize,
}

impl ChunkInfo {
    pub fn from_header(h: &ChunkHeader) -> Self {
        Self {
            version: h.version,
            memcpyed: h.is_memcpyed(),
            shuffle: h.shuffle_mode(),
            codec: h.codec(),
            level: h.level,
            elem_size: h.elem_size as usize,
            block_size: h.block_size as usize,
            uncompressed_len: h.uncompressed_len as usize,
            compressed_len: h.compressed_len as usize,
            nblocks: h.nblocks(),
        }
    }
}
