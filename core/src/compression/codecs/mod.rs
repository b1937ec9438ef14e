//! compression/codecs/mod.rs
//! Concrete block backends.

pub mod lz4;
pub mod zlib;
pub mod zstd;

pub use lz4::Lz4Codec;
pub use zlib::ZlibCodec;
pub use zstd::ZstdCodec;
