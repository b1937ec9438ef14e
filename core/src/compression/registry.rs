//! compression/registry.rs
//! Codec registry and factory functions.

use crate::compression::codecs::{Lz4Codec, ZlibCodec, ZstdCodec};
use crate::compression::constants::{DEFAULT_LEVEL_LZ4, DEFAULT_LEVEL_ZLIB, DEFAULT_LEVEL_ZSTD};
use crate::compression::types::{BlockCodec, Codec, CompressionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecInfo {
    pub name: &'static str,
    pub default_level: u8,
}

pub fn resolve(codec: Codec) -> CodecInfo {
    match codec {
        Codec::Lz4  => CodecInfo { name: "lz4", default_level: DEFAULT_LEVEL_LZ4 },
        Codec::Zlib => CodecInfo { name: "zlib", default_level: DEFAULT_LEVEL_ZLIB },
        Codec::Zstd => CodecInfo { name: "zstd", default_level: DEFAULT_LEVEL_ZSTD },
    }
}

pub fn create_codec(codec: Codec) -> Box<dyn BlockCodec> {
    match codec {
        Codec::Lz4  => Lz4Codec::new(),
        Codec::Zlib => ZlibCodec::new(),
        Codec::Zstd => ZstdCodec::new(),
    }
}

/// Factory keyed by the raw header id.
pub fn create_codec_by_id(codec_id: u8) -> Result<Box<dyn BlockCodec>, CompressionError> {
    let codec = Codec::try_from(codec_id)
        .map_err(|_| CompressionError::UnsupportedCodec { codec_id })?;
    Ok(create_codec(codec))
}
