use std::fmt;
use num_enum::TryFromPrimitive;

use crate::types::ChunkError;

/// Render a raw enum discriminant as its variant name, or hex when unknown.
pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Render bytes as a quoted ASCII literal when printable, hex otherwise.
pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}

/// CRC32 (IEEE) over `data`.
#[inline]
pub fn compute_crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Ceiling division for block counts.
#[inline]
pub fn div_ceil(n: usize, d: usize) -> usize {
    if d == 0 { 0 } else { n / d + usize::from(n % d != 0) }
}

/// `len` copies of `fill`, or an error instead of aborting when the
/// allocation cannot be satisfied.
pub fn try_filled_vec<T: Clone>(len: usize, fill: T) -> Result<Vec<T>, ChunkError> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|e| ChunkError::invalid(format!("cannot allocate {} elements: {}", len, e)))?;
    out.resize(len, fill);
    Ok(out)
}
