//! compression/constants.rs
//! Stable backend ids as written into the chunk header.
//!
//! Ids follow the Blosc compressor numbering so chunks stay recognizable
//! to tooling that already knows those codes.

/// Stable codec IDs (u8) for headers and wire format.
pub mod codec_ids {
    pub const LZ4: u8  = 0x01;
    pub const ZLIB: u8 = 0x04;
    pub const ZSTD: u8 = 0x05;
}

/// Level a configuration takes when it names a backend but no level.
/// zlib 6 and zstd 2 (native 3) line up with each library's own default.
pub const DEFAULT_LEVEL_LZ4: u8 = 5;
pub const DEFAULT_LEVEL_ZLIB: u8 = 6;
pub const DEFAULT_LEVEL_ZSTD: u8 = 2;

/// zstd level used for the maximum effort setting (level 9).
pub const ZSTD_MAX_LEVEL: i32 = 22;
