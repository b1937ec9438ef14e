//! shuffle/dispatch.rs
//!
//! Runtime kernel selection.
//!
//! Design notes:
//! - CPU features are detected once; the chosen kernels are stored as plain
//!   function pointers so the per-block path has no feature checks.
//! - Every variant produces the same bytes, so the choice never reaches the wire.
#![allow(unsafe_code)]

use std::fmt;

use super::generic;
use super::types::{ShuffleImpl, ShuffleMode};

/// Kernel signature: `(elem_size, src, dst)`.
///
/// # Safety
/// The kernel's instruction-set requirements must hold and
/// `src.len() == dst.len()`, `elem_size >= 1`.
type KernelFn = unsafe fn(usize, &[u8], &mut [u8]);

/// Resolved shuffle kernels for one instruction-set variant.
#[derive(Clone, Copy)]
pub struct Dispatcher {
    imp: ShuffleImpl,
    shuffle_fn: KernelFn,
    unshuffle_fn: KernelFn,
    bitshuffle_fn: KernelFn,
    bitunshuffle_fn: KernelFn,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("imp", &self.imp)
            .finish()
    }
}

impl Dispatcher {
    /// Pick the fastest variant the running CPU supports (AVX2, then SSSE3).
    pub fn detect() -> Self {
        let imp = ShuffleImpl::available()
            .last()
            .copied()
            .unwrap_or(ShuffleImpl::Generic);
        log::debug!("shuffle kernels resolved to {}", imp);
        Self::resolve(imp)
    }

    /// Portable scalar kernels.
    pub fn generic() -> Self {
        Self::resolve(ShuffleImpl::Generic)
    }

    /// Kernels for a specific variant, or `None` if this CPU cannot run it.
    pub fn for_impl(imp: ShuffleImpl) -> Option<Self> {
        if imp.is_supported() {
            Some(Self::resolve(imp))
        } else {
            None
        }
    }

    fn resolve(imp: ShuffleImpl) -> Self {
        match imp {
            #[cfg(target_arch = "x86_64")]
            ShuffleImpl::Ssse3 => Self {
                imp,
                shuffle_fn: super::x86::shuffle,
                unshuffle_fn: super::x86::unshuffle,
                bitshuffle_fn: super::x86::bitshuffle,
                bitunshuffle_fn: generic::bitunshuffle,
            },
            #[cfg(target_arch = "x86_64")]
            ShuffleImpl::Avx2 => Self {
                imp,
                shuffle_fn: super::avx2::shuffle,
                unshuffle_fn: super::avx2::unshuffle,
                bitshuffle_fn: super::avx2::bitshuffle,
                bitunshuffle_fn: generic::bitunshuffle,
            },
            _ => Self {
                imp: ShuffleImpl::Generic,
                shuffle_fn: generic::shuffle,
                unshuffle_fn: generic::unshuffle,
                bitshuffle_fn: generic::bitshuffle,
                bitunshuffle_fn: generic::bitunshuffle,
            },
        }
    }

    pub fn implementation(&self) -> ShuffleImpl {
        self.imp
    }

    /// # Panics
    /// If `elem_size == 0` or `src.len() != dst.len()`.
    pub fn shuffle(&self, elem_size: usize, src: &[u8], dst: &mut [u8]) {
        generic::check_args(elem_size, src, dst);
        // SAFETY: only variants that passed `is_supported` are resolved, and
        // the slice preconditions were just checked.
        unsafe { (self.shuffle_fn)(elem_size, src, dst) }
    }

    /// # Panics
    /// If `elem_size == 0` or `src.len() != dst.len()`.
    pub fn unshuffle(&self, elem_size: usize, src: &[u8], dst: &mut [u8]) {
        generic::check_args(elem_size, src, dst);
        // SAFETY: see `shuffle`.
        unsafe { (self.unshuffle_fn)(elem_size, src, dst) }
    }

    /// # Panics
    /// If `elem_size == 0` or `src.len() != dst.len()`.
    pub fn bitshuffle(&self, elem_size: usize, src: &[u8], dst: &mut [u8]) {
        generic::check_args(elem_size, src, dst);
        // SAFETY: see `shuffle`.
        unsafe { (self.bitshuffle_fn)(elem_size, src, dst) }
    }

    /// # Panics
    /// If `elem_size == 0` or `src.len() != dst.len()`.
    pub fn bitunshuffle(&self, elem_size: usize, src: &[u8], dst: &mut [u8]) {
        generic::check_args(elem_size, src, dst);
        // SAFETY: see `shuffle`.
        unsafe { (self.bitunshuffle_fn)(elem_size, src, dst) }
    }

    /// Forward filter for `mode`; `None` is a plain copy.
    pub fn apply(&self, mode: ShuffleMode, elem_size: usize, src: &[u8], dst: &mut [u8]) {
        match mode {
            ShuffleMode::None => dst.copy_from_slice(src),
            ShuffleMode::Byte => self.shuffle(elem_size, src, dst),
            ShuffleMode::Bit  => self.bitshuffle(elem_size, src, dst),
        }
    }

    /// Inverse filter for `mode`; `None` is a plain copy.
    pub fn invert(&self, mode: ShuffleMode, elem_size: usize, src: &[u8], dst: &mut [u8]) {
        match mode {
            ShuffleMode::None => dst.copy_from_slice(src),
            ShuffleMode::Byte => self.unshuffle(elem_size, src, dst),
            ShuffleMode::Bit  => self.bitunshuffle(elem_size, src, dst),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::detect()
    }
}
