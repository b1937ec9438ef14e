//! src/compression/codecs/zstd.rs
//!
//! Zstd block backend.
//!
//! Design notes:
//! - Uses the bulk API: every block is a standalone zstd frame.
//! - Levels 1..=8 map to zstd level `2*level - 1`; level 9 maps to the zstd maximum.
//! - Decoding writes straight into the destination slice and checks the exact length.

use crate::compression::constants::ZSTD_MAX_LEVEL;
use crate::compression::types::{BlockCodec, Codec, CompressionError};

pub struct ZstdCodec;

impl ZstdCodec {
    pub fn new() -> Box<dyn BlockCodec> {
        Box::new(Self)
    }

    /// Map a 1..=9 level onto zstd's own scale.
    pub fn native_level(level: u8) -> i32 {
        if level >= 9 {
            ZSTD_MAX_LEVEL
        } else {
            (level.max(1) as i32) * 2 - 1
        }
    }
}

impl BlockCodec for ZstdCodec {
    fn codec(&self) -> Codec {
        Codec::Zstd
    }

    fn compress_block(&self, level: u8, src: &[u8]) -> Result<Option<Vec<u8>>, CompressionError> {
        let out = zstd::bulk::compress(src, Self::native_level(level))
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zstd".into(), msg: e.to_string() })?;
        if out.len() >= src.len() {
            return Ok(None);
        }
        Ok(Some(out))
    }

    fn decompress_block(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CompressionError> {
        let written = zstd::bulk::decompress_to_buffer(src, dst)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zstd".into(), msg: e.to_string() })?;
        if written != dst.len() {
            return Err(CompressionError::LengthMismatch {
                codec: "zstd".into(),
                expected: dst.len(),
                actual: written,
            });
        }
        Ok(())
    }
}
