//! headers/decode.rs
//!
//! Header decoding.
//!
//! Design notes:
//! - Reads the fixed 40-byte prefix of a chunk into `ChunkHeader`.
//! - The checksum is verified before any field is interpreted.
//! - Field validation runs last; cross-checks against the actual buffer
//!   length and block table live in `chunk::ChunkView::parse`.

use byteorder::{ByteOrder, LittleEndian};

use crate::headers::types::{ChunkHeader, HeaderError, CRC_COVERED_LEN};
use crate::utils::compute_crc32;

/// Deserialize and validate the header at the start of `buf`.
#[inline]
pub fn decode_header_le(buf: &[u8]) -> Result<ChunkHeader, HeaderError> {
    if buf.len() < ChunkHeader::LEN {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need: ChunkHeader::LEN });
    }

    let mut i = 0usize;
    #[inline] fn get_u8(buf: &[u8], i: &mut usize) -> u8 { let v = buf[*i]; *i += 1; v }
    #[inline] fn get_u32(buf: &[u8], i: &mut usize) -> u32 { let v = LittleEndian::read_u32(&buf[*i..*i + 4]); *i += 4; v }
    #[inline] fn get_u64(buf: &[u8], i: &mut usize) -> u64 { let v = LittleEndian::read_u64(&buf[*i..*i + 8]); *i += 8; v }
    #[inline] fn get_bytes<const N: usize>(buf: &[u8], i: &mut usize) -> [u8; N] {
        let mut dst = [0u8; N]; dst.copy_from_slice(&buf[*i..*i + N]); *i += N; dst
    }

    let h = ChunkHeader {
        magic:            get_bytes::<4>(buf, &mut i), // 0..4
        version:          get_u8(buf, &mut i),         // 4
        flags:            get_u8(buf, &mut i),         // 5
        codec:            get_u8(buf, &mut i),         // 6
        level:            get_u8(buf, &mut i),         // 7
        elem_size:        get_u32(buf, &mut i),        // 8..12
        block_size:       get_u32(buf, &mut i),        // 12..16
        uncompressed_len: get_u64(buf, &mut i),        // 16..24
        compressed_len:   get_u64(buf, &mut i),        // 24..32
        reserved:         get_bytes::<4>(buf, &mut i), // 32..36
        crc32:            get_u32(buf, &mut i),        // 36..40
    };
    debug_assert_eq!(i, ChunkHeader::LEN);

    let computed = compute_crc32(&buf[..CRC_COVERED_LEN]);
    if h.crc32 != computed {
        return Err(HeaderError::InvalidCrc32 { have: h.crc32, need: computed });
    }

    h.validate()?;
    Ok(h)
}
