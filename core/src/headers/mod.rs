//! headers/mod.rs
//! Fixed-size chunk header: layout, encoding, decoding and validation.
//!
//! Notes:
//! - 40 bytes, little-endian, checksummed.
//! - Explicit ids (codec, shuffle flags) avoid silent incompatibilities.
//! - Unknown versions and flag bits are rejected, never ignored.

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::*;
pub use decode::*;
