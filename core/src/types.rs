use std::fmt;

use crate::{compression::CompressionError, headers::HeaderError};

/// Unified error for every public chunk operation.
/// - Each variant maps to one failure class callers can act on.
/// - `From<T>` impls enable `?` across header, codec and pipeline layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// Rejected before any work started (element size, level, empty destination, ...).
    InvalidArgument(String),

    /// Header or block table failed validation; no block was touched.
    CorruptHeader(HeaderError),

    /// A block failed to decode; the destination contents are not valid.
    CorruptBlock { index: usize, source: CompressionError },

    /// Caller-supplied destination is smaller than required.
    DestinationTooSmall { have: usize, need: usize },

    /// Backend failed while compressing (never raised for incompressible input).
    Codec(CompressionError),

    /// Worker pool could not be created.
    ThreadPool(String),
}

impl ChunkError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ChunkError::InvalidArgument(msg.into())
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, ChunkError::CorruptHeader(_) | ChunkError::CorruptBlock { .. })
    }
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            ChunkError::CorruptHeader(e) => write!(f, "corrupt header: {}", e),
            ChunkError::CorruptBlock { index, source } =>
                write!(f, "corrupt block {}: {}", index, source),
            ChunkError::DestinationTooSmall { have, need } =>
                write!(f, "destination too small: {} < {}", have, need),
            ChunkError::Codec(e) => write!(f, "compression error: {}", e),
            ChunkError::ThreadPool(msg) => write!(f, "thread pool error: {}", msg),
        }
    }
}

impl std::error::Error for ChunkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkError::CorruptHeader(e) => Some(e),
            ChunkError::CorruptBlock { source, .. } => Some(source),
            ChunkError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HeaderError> for ChunkError {
    fn from(e: HeaderError) -> Self {
        ChunkError::CorruptHeader(e)
    }
}

impl From<CompressionError> for ChunkError {
    fn from(e: CompressionError) -> Self {
        ChunkError::Codec(e)
    }
}
