//! shuffle/mod.rs
//! Reversible byte and bit transposition filters.
//!
//! Notes:
//! - Treats a buffer as `len / elem_size` fixed-width elements and groups
//!   same-offset bytes (or bits) so the backend sees long correlated runs.
//! - The free functions are the portable reference kernels; `Dispatcher`
//!   selects a faster, output-identical variant at runtime.

pub mod types;
pub mod generic;
pub mod dispatch;

#[cfg(target_arch = "x86_64")]
mod x86;
#[cfg(target_arch = "x86_64")]
mod avx2;

pub use types::*;
pub use dispatch::Dispatcher;
pub use generic::{bitshuffle, bitunshuffle, shuffle, unshuffle};
