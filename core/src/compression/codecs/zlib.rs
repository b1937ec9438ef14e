//! src/compression/codecs/zlib.rs
//!
//! Zlib block backend (deflate with the zlib wrapper) via flate2.
//!
//! Design notes:
//! - Every block is its own zlib stream; levels 1..=9 pass through unchanged.
//! - Output that is not smaller than the input is reported as `None`.
//! - Decoding must reach the end of the stream and fill the destination exactly.

use std::io::Write;
use flate2::{Compression, Decompress, FlushDecompress, Status, write::ZlibEncoder};

use crate::compression::types::{BlockCodec, Codec, CompressionError};

pub struct ZlibCodec;

impl ZlibCodec {
    pub fn new() -> Box<dyn BlockCodec> {
        Box::new(Self)
    }
}

impl BlockCodec for ZlibCodec {
    fn codec(&self) -> Codec {
        Codec::Zlib
    }

    fn compress_block(&self, level: u8, src: &[u8]) -> Result<Option<Vec<u8>>, CompressionError> {
        // Each block is its own zlib stream
        let mut enc = ZlibEncoder::new(Vec::with_capacity(src.len()), Compression::new(level.min(9) as u32));
        enc.write_all(src)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zlib".into(), msg: e.to_string() })?;
        let out = enc.finish()
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zlib".into(), msg: e.to_string() })?;
        if out.len() >= src.len() {
            return Ok(None);
        }
        Ok(Some(out))
    }

    fn decompress_block(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CompressionError> {
        let mut dec = Decompress::new(true);
        let status = dec.decompress(src, dst, FlushDecompress::Finish)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zlib".into(), msg: e.to_string() })?;

        let written = dec.total_out() as usize;
        if status != Status::StreamEnd {
            // Either truncated input or more output than the block can hold
            return Err(CompressionError::CodecProcessFailed {
                codec: "zlib".into(),
                msg: format!("stream did not end after {} of {} bytes", written, dst.len()),
            });
        }
        if written != dst.len() {
            return Err(CompressionError::LengthMismatch {
                codec: "zlib".into(),
                expected: dst.len(),
                actual: written,
            });
        }
        Ok(())
    }
}
