//! constants.rs
//! Wire-format constants and sizing bounds shared across modules.

/// Magic marker opening every chunk.
/// "SHPK" = shufflepack chunk
pub const MAGIC: [u8; 4] = *b"SHPK";

/// Current (and only) chunk format version.
pub const FORMAT_VERSION: u8 = 1;

/// Fixed chunk header size in bytes.
pub const HEADER_LEN: usize = 40;

/// Worst-case bytes a chunk may add on top of its uncompressed payload.
///
/// A chunk whose blocked layout would exceed this is rewritten as a
/// whole-chunk literal (header + raw bytes), so the bound is exactly the header.
pub const MAX_OVERHEAD: usize = HEADER_LEN;

/// Largest supported element size (stored in the header as u32, capped here).
pub const MAX_TYPESIZE: usize = 255;

/// Highest compression level. Level 0 stores literally.
pub const MAX_LEVEL: u8 = 9;

/// Default compression level for a fresh context.
pub const DEFAULT_LEVEL: u8 = 5;

/// Inputs shorter than this are never handed to a backend.
pub const MIN_BUFFERSIZE: usize = 128;

/// Upper bound on the number of blocks in one chunk.
pub const MAX_BLOCK_COUNT: usize = 65_536;

/// Typical L1 data cache working set.
pub const L1_CACHE: usize = 32 * 1024;

/// Typical L2 cache working set.
pub const L2_CACHE: usize = 256 * 1024;

/// Size in bytes of one block-length table entry.
pub const BLOCK_ENTRY_LEN: usize = 4;

/// Header flag bits.
pub mod flags {
    pub const BYTE_SHUFFLE: u8 = 0x01;
    pub const MEMCPYED: u8     = 0x02;
    pub const BIT_SHUFFLE: u8  = 0x04;
}

/// Environment variables read by `ContextConfig::from_env`.
pub mod env_vars {
    pub const NTHREADS: &str   = "SHUFFLEPACK_NTHREADS";
    pub const COMPRESSOR: &str = "SHUFFLEPACK_COMPRESSOR";
    pub const SHUFFLE: &str    = "SHUFFLEPACK_SHUFFLE";
    pub const CLEVEL: &str     = "SHUFFLEPACK_CLEVEL";
    pub const BLOCKSIZE: &str  = "SHUFFLEPACK_BLOCKSIZE";
}
