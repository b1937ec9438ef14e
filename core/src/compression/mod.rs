//! compression/mod.rs
//! Pluggable single-block backends.
//!
//! Notes:
//! - Every block is compressed independently; no state crosses blocks.
//! - "Not smaller" is reported as `Ok(None)`, never as an error.
//! - The registry resolves header ids to implementations.

pub mod constants;
pub mod types;
pub mod registry;
pub mod codecs;

pub use constants::*;
pub use types::*;
pub use registry::*;
