//! shuffle/types.rs
//! Filter modes recorded in the chunk header and the available kernel sets.
use std::fmt;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use crate::constants::flags;

/// Pre-compression filter applied to every block.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
pub enum ShuffleMode {
    #[serde(rename = "noshuffle")]
    None = 0,
    #[default]
    #[serde(rename = "shuffle")]
    Byte = 1,
    #[serde(rename = "bitshuffle")]
    Bit  = 2,
}

impl ShuffleMode {
    pub fn name(self) -> &'static str {
        match self {
            ShuffleMode::None => "noshuffle",
            ShuffleMode::Byte => "shuffle",
            ShuffleMode::Bit  => "bitshuffle",
        }
    }

    /// Accepts the wire names plus the short aliases `none`, `byte`, `bit`.
    pub fn from_name(name: &str) -> Option<ShuffleMode> {
        match name.trim().to_ascii_lowercase().as_str() {
            "noshuffle" | "none" | "0" => Some(ShuffleMode::None),
            "shuffle" | "byte" | "1"   => Some(ShuffleMode::Byte),
            "bitshuffle" | "bit" | "2" => Some(ShuffleMode::Bit),
            _ => None,
        }
    }

    /// Mode actually applied for a given element size.
    ///
    /// Byte shuffling single-byte elements is the identity, so it is recorded as `None`.
    pub fn effective(self, elem_size: usize) -> ShuffleMode {
        match self {
            ShuffleMode::Byte if elem_size <= 1 => ShuffleMode::None,
            other => other,
        }
    }

    pub fn header_bits(self) -> u8 {
        match self {
            ShuffleMode::None => 0,
            ShuffleMode::Byte => flags::BYTE_SHUFFLE,
            ShuffleMode::Bit  => flags::BIT_SHUFFLE,
        }
    }

    /// Inverse of `header_bits`; `None` when both shuffle bits are set.
    pub fn from_header_bits(bits: u8) -> Option<ShuffleMode> {
        let byte = bits & flags::BYTE_SHUFFLE != 0;
        let bit = bits & flags::BIT_SHUFFLE != 0;
        match (byte, bit) {
            (false, false) => Some(ShuffleMode::None),
            (true, false)  => Some(ShuffleMode::Byte),
            (false, true)  => Some(ShuffleMode::Bit),
            (true, true)   => None,
        }
    }
}

impl fmt::Display for ShuffleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Instruction-set variant backing a `Dispatcher`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShuffleImpl {
    /// Portable scalar loops.
    Generic,
    /// x86_64 SSSE3 byte shuffle (element sizes 2, 4, 8) plus SSE2 bit shuffle.
    Ssse3,
    /// x86_64 AVX2 byte and bit shuffle, 32 elements per step.
    Avx2,
}

impl ShuffleImpl {
    pub const ALL: [ShuffleImpl; 3] = [ShuffleImpl::Generic, ShuffleImpl::Ssse3, ShuffleImpl::Avx2];

    /// Whether the running CPU can execute this variant.
    pub fn is_supported(self) -> bool {
        match self {
            ShuffleImpl::Generic => true,
            ShuffleImpl::Ssse3 => {
                #[cfg(target_arch = "x86_64")]
                {
                    is_x86_feature_detected!("ssse3")
                }
                #[cfg(not(target_arch = "x86_64"))]
                {
                    false
                }
            }
            ShuffleImpl::Avx2 => {
                #[cfg(target_arch = "x86_64")]
                {
                    is_x86_feature_detected!("avx2")
                }
                #[cfg(not(target_arch = "x86_64"))]
                {
                    false
                }
            }
        }
    }

    /// Every variant usable on this machine, slowest first.
    pub fn available() -> Vec<ShuffleImpl> {
        ShuffleImpl::ALL.iter().copied().filter(|i| i.is_supported()).collect()
    }
}

impl fmt::Display for ShuffleImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShuffleImpl::Generic => f.write_str("generic"),
            ShuffleImpl::Ssse3   => f.write_str("ssse3"),
            ShuffleImpl::Avx2    => f.write_str("avx2"),
        }
    }
}
