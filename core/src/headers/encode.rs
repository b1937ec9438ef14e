//! headers/encode.rs
//!
//! Header encoding.
//!
//! Design notes:
//! - Serializes `ChunkHeader` into a fixed 40-byte little-endian buffer.
//! - Field order must match `decode.rs` exactly.
//! - The CRC32 is computed here over bytes 0..36; `h.crc32` is ignored.

use crate::headers::types::{ChunkHeader, CRC_COVERED_LEN};
use crate::utils::compute_crc32;

/// Serialize a `ChunkHeader` into its 40-byte wire form.
#[inline]
pub fn encode_header_le(h: &ChunkHeader) -> [u8; ChunkHeader::LEN] {
    let mut out = [0u8; ChunkHeader::LEN];
    let mut i = 0usize;

    fn put_u8(out: &mut [u8], i: &mut usize, v: u8) {
        out[*i] = v;
        *i += 1;
    }
    fn put_u32(out: &mut [u8], i: &mut usize, v: u32) {
        out[*i..*i + 4].copy_from_slice(&v.to_le_bytes());
        *i += 4;
    }
    fn put_u64(out: &mut [u8], i: &mut usize, v: u64) {
        out[*i..*i + 8].copy_from_slice(&v.to_le_bytes());
        *i += 8;
    }
    fn put_bytes(out: &mut [u8], i: &mut usize, b: &[u8]) {
        out[*i..*i + b.len()].copy_from_slice(b);
        *i += b.len();
    }

    put_bytes(&mut out, &mut i, &h.magic);        // 0..4   magic
    put_u8(&mut out, &mut i, h.version);          // 4      version
    put_u8(&mut out, &mut i, h.flags);            // 5      flags
    put_u8(&mut out, &mut i, h.codec);            // 6      codec id
    put_u8(&mut out, &mut i, h.level);            // 7      level
    put_u32(&mut out, &mut i, h.elem_size);       // 8..12  elem_size
    put_u32(&mut out, &mut i, h.block_size);      // 12..16 block_size
    put_u64(&mut out, &mut i, h.uncompressed_len); // 16..24 uncompressed_len
    put_u64(&mut out, &mut i, h.compressed_len);  // 24..32 compressed_len
    put_bytes(&mut out, &mut i, &h.reserved);     // 32..36 reserved

    debug_assert_eq!(i, CRC_COVERED_LEN);
    let crc = compute_crc32(&out[..CRC_COVERED_LEN]);
    put_u32(&mut out, &mut i, crc);               // 36..40 crc32

    debug_assert_eq!(i, ChunkHeader::LEN, "encoding wrote incorrect length");
    out
}
