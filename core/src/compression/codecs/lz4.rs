//! src/compression/codecs/lz4.rs
//!
//! LZ4 block backend (lz4_flex raw block format, no size prefix).
//!
//! Design notes:
//! - The chunk's block table already records every block's raw length, so the
//!   block stream carries no length prefix of its own.

use lz4_flex::block::{compress, decompress_into};

use crate::compression::types::{BlockCodec, Codec, CompressionError};

pub struct Lz4Codec;

impl Lz4Codec {
    pub fn new() -> Box<dyn BlockCodec> {
        Box::new(Self)
    }
}

impl BlockCodec for Lz4Codec {
    fn codec(&self) -> Codec {
        Codec::Lz4
    }

    // lz4_flex has no effort knob; level only changes the block size.
    fn compress_block(&self, _level: u8, src: &[u8]) -> Result<Option<Vec<u8>>, CompressionError> {
        let out = compress(src);
        if out.len() >= src.len() {
            return Ok(None);
        }
        Ok(Some(out))
    }

    fn decompress_block(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CompressionError> {
        let written = decompress_into(src, dst)
            .map_err(|e| CompressionError::CodecProcessFailed {
                codec: "lz4".into(),
                msg: e.to_string(),
            })?;
        if written != dst.len() {
            return Err(CompressionError::LengthMismatch {
                codec: "lz4".into(),
                expected: dst.len(),
                actual: written,
            });
        }
        Ok(())
    }
}
