//! compression/types.rs
//! Codec identifiers, the block backend trait, and backend errors.
use std::fmt;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::compression::constants::codec_ids;
use crate::utils::enum_name_or_hex;

/// Backend identifier recorded in every chunk header.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Lz4  = codec_ids::LZ4,
    Zlib = codec_ids::ZLIB,
    Zstd = codec_ids::ZSTD,
}

impl Codec {
    /// All registered backends, in id order.
    pub const ALL: [Codec; 3] = [Codec::Lz4, Codec::Zlib, Codec::Zstd];

    pub fn verify(raw: u8) -> Result<(), CodecError> {
        match raw {
            x if x == Codec::Lz4 as u8  => Ok(()),
            x if x == Codec::Zlib as u8 => Ok(()),
            x if x == Codec::Zstd as u8 => Ok(()),
            _ => Err(CodecError::UnknownCodec { raw }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::Lz4  => "lz4",
            Codec::Zlib => "zlib",
            Codec::Zstd => "zstd",
        }
    }

    /// Resolve a backend by its wire name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Codec> {
        Codec::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comma separated list of every backend name, e.g. `"lz4,zlib,zstd"`.
pub fn list_codecs() -> String {
    Codec::ALL.iter().map(|c| c.name()).collect::<Vec<_>>().join(",")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    UnknownCodec { raw: u8 },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnknownCodec { raw } =>
                write!(f, "unknown codec: {}", enum_name_or_hex::<Codec>(*raw)),
        }
    }
}

impl std::error::Error for CodecError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    UnsupportedCodec { codec_id: u8 },
    CodecProcessFailed { codec: String, msg: String },
    LengthMismatch { codec: String, expected: usize, actual: usize },
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CompressionError::*;
        match self {
            UnsupportedCodec { codec_id } =>
                write!(f, "unsupported compression codec: {}",
                       enum_name_or_hex::<Codec>(*codec_id)),
            CodecProcessFailed { codec, msg } =>
                write!(f, "codec {} process failed: {}", codec, msg),
            LengthMismatch { codec, expected, actual } =>
                write!(f, "codec {} produced {} bytes, expected {}", codec, actual, expected),
        }
    }
}

impl std::error::Error for CompressionError {}

impl From<CodecError> for CompressionError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::UnknownCodec { raw } => CompressionError::UnsupportedCodec { codec_id: raw },
        }
    }
}

/// Single-block compress/decompress primitive.
///
/// Implementations are stateless so one instance is shared by every worker
/// of a call.
pub trait BlockCodec: Send + Sync {
    fn codec(&self) -> Codec;

    /// Compress `src` at `level` (1..=9).
    ///
    /// Returns `Ok(None)` when the encoded form would not be strictly smaller
    /// than `src`; the caller then stores the block literally.
    fn compress_block(&self, level: u8, src: &[u8]) -> Result<Option<Vec<u8>>, CompressionError>;

    /// Decode `src` into `dst`, which must be filled exactly.
    fn decompress_block(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CompressionError>;
}
