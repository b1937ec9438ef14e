//! shuffle/generic.rs
//!
//! Portable scalar kernels. These define the reference output every
//! vectorized variant must reproduce byte for byte.
//!
//! Layout notes:
//! - Byte shuffle: `n = len / elem_size` elements; byte `j` of element `e`
//!   lands at `j * n + e`. Trailing partial-element bytes are copied as is.
//! - Bit shuffle: only the first `m = n - n % 8` elements are transposed.
//!   Row `j * 8 + b` holds bit `b` of byte `j` of each element, packed LSB
//!   first, `m / 8` bytes per row. Everything past `m * elem_size` is copied.

/// Precondition shared by every kernel entry point.
#[inline]
pub(crate) fn check_args(elem_size: usize, src: &[u8], dst: &[u8]) {
    assert!(elem_size >= 1, "element size must be at least 1");
    assert_eq!(src.len(), dst.len(), "shuffle source and destination lengths differ");
}

/// Byte-transpose elements `from..n` of `src` into plane layout.
#[inline]
pub(crate) fn shuffle_elements(elem_size: usize, n: usize, from: usize, src: &[u8], dst: &mut [u8]) {
    if from >= n {
        return;
    }
    let body = &src[from * elem_size..n * elem_size];
    for (k, elem) in body.chunks_exact(elem_size).enumerate() {
        let e = from + k;
        for (j, &byte) in elem.iter().enumerate() {
            dst[j * n + e] = byte;
        }
    }
}

/// Inverse of `shuffle_elements` for elements `from..n`.
#[inline]
pub(crate) fn unshuffle_elements(elem_size: usize, n: usize, from: usize, src: &[u8], dst: &mut [u8]) {
    if from >= n {
        return;
    }
    let body = &mut dst[from * elem_size..n * elem_size];
    for (k, elem) in body.chunks_exact_mut(elem_size).enumerate() {
        let e = from + k;
        for (j, byte) in elem.iter_mut().enumerate() {
            *byte = src[j * n + e];
        }
    }
}

/// Copy bytes from `start` to the end unchanged.
#[inline]
pub(crate) fn copy_tail(start: usize, src: &[u8], dst: &mut [u8]) {
    dst[start..].copy_from_slice(&src[start..]);
}

pub fn shuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    check_args(elem_size, src, dst);
    let n = src.len() / elem_size;
    shuffle_elements(elem_size, n, 0, src, dst);
    copy_tail(n * elem_size, src, dst);
}

pub fn unshuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    check_args(elem_size, src, dst);
    let n = src.len() / elem_size;
    unshuffle_elements(elem_size, n, 0, src, dst);
    copy_tail(n * elem_size, src, dst);
}

/// Pack bit `bit` of each byte in `plane` (length multiple of 8) into `row`.
#[inline]
pub(crate) fn pack_plane_bits(plane: &[u8], bit: u32, row: &mut [u8]) {
    for (out, group) in row.iter_mut().zip(plane.chunks_exact(8)) {
        let mut v = 0u8;
        for (k, &byte) in group.iter().enumerate() {
            v |= ((byte >> bit) & 1) << k;
        }
        *out = v;
    }
}

pub fn bitshuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    check_args(elem_size, src, dst);
    let n = src.len() / elem_size;
    let m = n - n % 8;
    let row_len = m / 8;

    if row_len > 0 {
        let mut plane = vec![0u8; m];
        for j in 0..elem_size {
            for (e, byte) in plane.iter_mut().enumerate() {
                *byte = src[e * elem_size + j];
            }
            for b in 0..8u32 {
                let r = j * 8 + b as usize;
                pack_plane_bits(&plane, b, &mut dst[r * row_len..(r + 1) * row_len]);
            }
        }
    }
    copy_tail(m * elem_size, src, dst);
}

pub fn bitunshuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    check_args(elem_size, src, dst);
    let n = src.len() / elem_size;
    let m = n - n % 8;
    let row_len = m / 8;

    dst[..m * elem_size].fill(0);
    for j in 0..elem_size {
        for b in 0..8usize {
            let r = j * 8 + b;
            let row = &src[r * row_len..(r + 1) * row_len];
            for (i, &packed) in row.iter().enumerate() {
                for k in 0..8 {
                    dst[(8 * i + k) * elem_size + j] |= ((packed >> k) & 1) << b;
                }
            }
        }
    }
    copy_tail(m * elem_size, src, dst);
}
