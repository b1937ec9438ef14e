//! headers/types.rs
//! Chunk header struct, flag set, and header validation errors.
//!
//! Notes:
//! - Fixed 40-byte little-endian layout; field order is the wire order.
//! - The trailing CRC32 covers bytes 0..36, so any single corrupted byte in
//!   the header is caught before length fields are trusted.
//! - Reserved bytes allow future fields without changing size; always zero them.

use std::fmt;

use crate::compression::{Codec, CodecError};
use crate::constants::{flags, BLOCK_ENTRY_LEN, FORMAT_VERSION, HEADER_LEN, MAGIC, MAX_BLOCK_COUNT, MAX_LEVEL, MAX_TYPESIZE};
use crate::shuffle::ShuffleMode;
use crate::utils::{div_ceil, enum_name_or_hex, fmt_bytes};

/// Byte range covered by the header checksum.
pub const CRC_COVERED_LEN: usize = 36;

bitflags::bitflags! {
    /// Chunk-level flags (byte 5 of the header).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChunkFlags: u8 {
        /// Blocks were byte-shuffled before compression.
        const BYTE_SHUFFLE = flags::BYTE_SHUFFLE;

        /// Whole chunk is the raw, unfiltered source after the header.
        const MEMCPYED = flags::MEMCPYED;

        /// Blocks were bit-shuffled before compression.
        const BIT_SHUFFLE = flags::BIT_SHUFFLE;
    }
}

impl ChunkFlags {
    pub fn shuffle_mode(self) -> ShuffleMode {
        ShuffleMode::from_header_bits(self.bits()).unwrap_or(ShuffleMode::None)
    }
}

#[repr(C)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub magic: [u8; 4],          // "SHPK"
    pub version: u8,             // format version
    pub flags: u8,               // ChunkFlags bits
    pub codec: u8,               // backend id (Codec)
    pub level: u8,               // 0..=9
    pub elem_size: u32,          // 1..=255
    pub block_size: u32,         // > 0
    pub uncompressed_len: u64,   // original byte length
    pub compressed_len: u64,     // whole chunk, header included
    pub reserved: [u8; 4],       // must be zero
    pub crc32: u32,              // CRC32 of bytes 0..36
}

impl Default for ChunkHeader {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            codec: Codec::default() as u8,
            level: 0,
            elem_size: 1,
            block_size: 1,
            uncompressed_len: 0,
            compressed_len: HEADER_LEN as u64,
            reserved: [0u8; 4],
            crc32: 0,
        }
    }
}

impl ChunkHeader {
    pub const LEN: usize = HEADER_LEN;

    /// Canonical header for tests: a literal chunk of 256 bytes.
    pub fn test_header() -> Self {
        Self {
            flags: flags::MEMCPYED,
            level: 5,
            elem_size: 4,
            block_size: 256,
            uncompressed_len: 256,
            compressed_len: (HEADER_LEN + 256) as u64,
            ..Default::default()
        }
    }

    pub fn chunk_flags(&self) -> ChunkFlags {
        ChunkFlags::from_bits_truncate(self.flags)
    }

    pub fn is_memcpyed(&self) -> bool {
        self.chunk_flags().contains(ChunkFlags::MEMCPYED)
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.chunk_flags().shuffle_mode()
    }

    /// Backend recorded in the header. Only meaningful after `validate`.
    pub fn codec(&self) -> Codec {
        Codec::try_from(self.codec).unwrap_or_default()
    }

    /// Number of blocks implied by the declared lengths (0 for literal chunks).
    pub fn nblocks(&self) -> usize {
        if self.is_memcpyed() {
            0
        } else {
            div_ceil(self.uncompressed_len as usize, self.block_size as usize)
        }
    }

    /// Field-level validation; does not look at anything after the header.
    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.magic != MAGIC {
            return Err(HeaderError::InvalidMagic { have: self.magic, need: MAGIC });
        }
        if self.version != FORMAT_VERSION {
            return Err(HeaderError::InvalidVersion { have: self.version });
        }

        let chunk_flags = ChunkFlags::from_bits(self.flags)
            .ok_or(HeaderError::UnknownFlags { raw: self.flags })?;
        if chunk_flags.contains(ChunkFlags::BYTE_SHUFFLE | ChunkFlags::BIT_SHUFFLE) {
            return Err(HeaderError::ConflictingShuffleFlags);
        }

        Codec::verify(self.codec)?;

        if self.level > MAX_LEVEL {
            return Err(HeaderError::InvalidLevel { have: self.level });
        }
        if self.elem_size == 0 || self.elem_size as usize > MAX_TYPESIZE {
            return Err(HeaderError::InvalidElemSize { have: self.elem_size });
        }
        if self.block_size == 0 {
            return Err(HeaderError::InvalidBlockSizeZero);
        }
        if self.reserved.iter().any(|&b| b != 0) {
            return Err(HeaderError::ReservedBytesNonZero { reserved: self.reserved });
        }
        if self.uncompressed_len > usize::MAX as u64 || self.compressed_len > usize::MAX as u64 {
            return Err(HeaderError::Validation("declared length exceeds address space".into()));
        }

        if chunk_flags.contains(ChunkFlags::MEMCPYED) {
            let need = (HEADER_LEN as u64).checked_add(self.uncompressed_len);
            if need != Some(self.compressed_len) {
                return Err(HeaderError::LengthMismatch {
                    field: "compressed_len",
                    have: self.compressed_len,
                    need: need.unwrap_or(u64::MAX),
                });
            }
        } else {
            let nblocks = self.nblocks();
            if nblocks > MAX_BLOCK_COUNT {
                return Err(HeaderError::TooManyBlocks { have: nblocks, max: MAX_BLOCK_COUNT });
            }
            let table_end = (HEADER_LEN + nblocks * BLOCK_ENTRY_LEN) as u64;
            if self.compressed_len < table_end {
                return Err(HeaderError::BlockTableOutOfBounds {
                    table_end: table_end as usize,
                    have: self.compressed_len as usize,
                });
            }
        }
        Ok(())
    }

    /// Produce a concise debug summary of the header.
    pub fn summary(&self) -> String {
        format!(
            "ChunkHeader {{ version: {}, flags: {:?}, codec: {}, level: {}, elem_size: {}, \
             block_size: {}, uncompressed_len: {}, compressed_len: {} }}",
            self.version,
            self.chunk_flags(),
            enum_name_or_hex::<Codec>(self.codec),
            self.level,
            self.elem_size,
            self.block_size,
            self.uncompressed_len,
            self.compressed_len,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// Buffer too short to contain a header (or its block table).
    BufferTooShort { have: usize, need: usize },

    /// Invalid magic marker (expected "SHPK").
    InvalidMagic { have: [u8; 4], need: [u8; 4] },

    /// Unknown format version.
    InvalidVersion { have: u8 },

    /// Header checksum does not match its contents.
    InvalidCrc32 { have: u32, need: u32 },

    /// Flag bits outside the known set.
    UnknownFlags { raw: u8 },

    /// Byte shuffle and bit shuffle flags both set.
    ConflictingShuffleFlags,

    /// Unknown backend id.
    UnknownCodec { raw: u8 },

    /// Level outside 0..=9.
    InvalidLevel { have: u8 },

    /// Element size outside 1..=255.
    InvalidElemSize { have: u32 },

    /// Block size of zero.
    InvalidBlockSizeZero,

    /// Reserved bytes must be zero.
    ReservedBytesNonZero { reserved: [u8; 4] },

    /// A declared length disagrees with what the rest of the chunk implies.
    LengthMismatch { field: &'static str, have: u64, need: u64 },

    /// Declared block count above the format limit.
    TooManyBlocks { have: usize, max: usize },

    /// Block-length table extends past the declared chunk end.
    BlockTableOutOfBounds { table_end: usize, have: usize },

    /// A table entry is zero or larger than its block's raw length.
    InvalidBlockLength { index: usize, have: u32, max: usize },

    /// Generic validation error with context.
    Validation(String),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HeaderError::*;
        match self {
            BufferTooShort { have, need } =>
                write!(f, "chunk buffer too short: {} < {}", have, need),
            InvalidMagic { have, need } =>
                write!(f, "invalid magic: expected {}, got {}", fmt_bytes(need), fmt_bytes(have)),
            InvalidVersion { have } =>
                write!(f, "unsupported format version: {}", have),
            InvalidCrc32 { have, need } =>
                write!(f, "header crc32 mismatch: stored 0x{:08x}, computed 0x{:08x}", have, need),
            UnknownFlags { raw } =>
                write!(f, "unknown flag bits: 0x{:02x}", raw),
            ConflictingShuffleFlags =>
                write!(f, "byte shuffle and bit shuffle flags are both set"),
            UnknownCodec { raw } =>
                write!(f, "unknown codec: {}", enum_name_or_hex::<Codec>(*raw)),
            InvalidLevel { have } =>
                write!(f, "invalid level: {}", have),
            InvalidElemSize { have } =>
                write!(f, "invalid elem_size: {}", have),
            InvalidBlockSizeZero =>
                write!(f, "invalid block_size: zero"),
            ReservedBytesNonZero { reserved } =>
                write!(f, "reserved bytes must be zero, got {}", fmt_bytes(reserved)),
            LengthMismatch { field, have, need } =>
                write!(f, "{} mismatch: declared {}, expected {}", field, have, need),
            TooManyBlocks { have, max } =>
                write!(f, "too many blocks: {} > {}", have, max),
            BlockTableOutOfBounds { table_end, have } =>
                write!(f, "block table ends at {} but chunk is {} bytes", table_end, have),
            InvalidBlockLength { index, have, max } =>
                write!(f, "block {} length {} outside 1..={}", index, have, max),
            Validation(msg) =>
                write!(f, "header validation error: {}", msg),
        }
    }
}

impl std::error::Error for HeaderError {}

impl From<CodecError> for HeaderError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::UnknownCodec { raw } => HeaderError::UnknownCodec { raw },
        }
    }
}
