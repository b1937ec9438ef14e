//! shuffle/x86.rs
//!
//! SSSE3 byte shuffle and SSE2 bit shuffle for x86_64.
//!
//! Design notes:
//! - Element sizes 2, 4 and 8 are vectorized 16 elements at a time; every
//!   other size, and the leftover `n % 16` elements, go through the scalar
//!   loops in `generic`.
//! - `pshufb` gathers same-offset bytes inside one register, then an
//!   unpack-based lane transpose spreads them across the byte planes.
//! - Bit unshuffle has no vector path here and reuses the scalar kernel.
//! - Output is identical to `generic` for every size and length.
#![allow(unsafe_code)]

use std::arch::x86_64::*;

use super::generic;

/// Transpose a 4x4 matrix of 32-bit lanes: `out[c]` lane `r` = `rows[r]` lane `c`.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn transpose_4x32(rows: [__m128i; 4]) -> [__m128i; 4] {
    let t0 = _mm_unpacklo_epi32(rows[0], rows[1]);
    let t1 = _mm_unpacklo_epi32(rows[2], rows[3]);
    let t2 = _mm_unpackhi_epi32(rows[0], rows[1]);
    let t3 = _mm_unpackhi_epi32(rows[2], rows[3]);
    [
        _mm_unpacklo_epi64(t0, t1),
        _mm_unpackhi_epi64(t0, t1),
        _mm_unpacklo_epi64(t2, t3),
        _mm_unpackhi_epi64(t2, t3),
    ]
}

/// Transpose an 8x8 matrix of 16-bit lanes: `out[c]` lane `r` = `rows[r]` lane `c`.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn transpose_8x16(rows: [__m128i; 8]) -> [__m128i; 8] {
    let a0 = _mm_unpacklo_epi16(rows[0], rows[1]);
    let a1 = _mm_unpacklo_epi16(rows[2], rows[3]);
    let a2 = _mm_unpacklo_epi16(rows[4], rows[5]);
    let a3 = _mm_unpacklo_epi16(rows[6], rows[7]);
    let a4 = _mm_unpackhi_epi16(rows[0], rows[1]);
    let a5 = _mm_unpackhi_epi16(rows[2], rows[3]);
    let a6 = _mm_unpackhi_epi16(rows[4], rows[5]);
    let a7 = _mm_unpackhi_epi16(rows[6], rows[7]);

    let b0 = _mm_unpacklo_epi32(a0, a1);
    let b1 = _mm_unpacklo_epi32(a2, a3);
    let b2 = _mm_unpackhi_epi32(a0, a1);
    let b3 = _mm_unpackhi_epi32(a2, a3);
    let b4 = _mm_unpacklo_epi32(a4, a5);
    let b5 = _mm_unpacklo_epi32(a6, a7);
    let b6 = _mm_unpackhi_epi32(a4, a5);
    let b7 = _mm_unpackhi_epi32(a6, a7);

    [
        _mm_unpacklo_epi64(b0, b1),
        _mm_unpackhi_epi64(b0, b1),
        _mm_unpacklo_epi64(b2, b3),
        _mm_unpackhi_epi64(b2, b3),
        _mm_unpacklo_epi64(b4, b5),
        _mm_unpackhi_epi64(b4, b5),
        _mm_unpacklo_epi64(b6, b7),
        _mm_unpackhi_epi64(b6, b7),
    ]
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn load(p: *const u8) -> __m128i {
    _mm_loadu_si128(p as *const __m128i)
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn store(p: *mut u8, v: __m128i) {
    _mm_storeu_si128(p as *mut __m128i, v)
}

// Each vector kernel below returns how many leading elements it handled
// (a multiple of 16). Callers guarantee `src.len() >= n * size` and
// `dst.len() >= n * size`.

#[target_feature(enable = "ssse3")]
unsafe fn shuffle2(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let mask = _mm_setr_epi8(0, 2, 4, 6, 8, 10, 12, 14, 1, 3, 5, 7, 9, 11, 13, 15);
    let done = n - n % 16;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let a = _mm_shuffle_epi8(load(sp.add(e * 2)), mask);
        let b = _mm_shuffle_epi8(load(sp.add(e * 2 + 16)), mask);
        store(dp.add(e), _mm_unpacklo_epi64(a, b));
        store(dp.add(n + e), _mm_unpackhi_epi64(a, b));
        e += 16;
    }
    done
}

#[target_feature(enable = "sse2")]
unsafe fn unshuffle2(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let done = n - n % 16;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let p0 = load(sp.add(e));
        let p1 = load(sp.add(n + e));
        store(dp.add(e * 2), _mm_unpacklo_epi8(p0, p1));
        store(dp.add(e * 2 + 16), _mm_unpackhi_epi8(p0, p1));
        e += 16;
    }
    done
}

#[target_feature(enable = "ssse3")]
unsafe fn shuffle4(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let mask = _mm_setr_epi8(0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15);
    let done = n - n % 16;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let base = sp.add(e * 4);
        let rows = [
            _mm_shuffle_epi8(load(base), mask),
            _mm_shuffle_epi8(load(base.add(16)), mask),
            _mm_shuffle_epi8(load(base.add(32)), mask),
            _mm_shuffle_epi8(load(base.add(48)), mask),
        ];
        for (j, plane) in transpose_4x32(rows).into_iter().enumerate() {
            store(dp.add(j * n + e), plane);
        }
        e += 16;
    }
    done
}

#[target_feature(enable = "ssse3")]
unsafe fn unshuffle4(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    // The 4x4 byte gather is its own inverse.
    let mask = _mm_setr_epi8(0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15);
    let done = n - n % 16;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let planes = [
            load(sp.add(e)),
            load(sp.add(n + e)),
            load(sp.add(2 * n + e)),
            load(sp.add(3 * n + e)),
        ];
        for (r, row) in transpose_4x32(planes).into_iter().enumerate() {
            store(dp.add(e * 4 + r * 16), _mm_shuffle_epi8(row, mask));
        }
        e += 16;
    }
    done
}

#[target_feature(enable = "ssse3")]
unsafe fn shuffle8(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let mask = _mm_setr_epi8(0, 8, 1, 9, 2, 10, 3, 11, 4, 12, 5, 13, 6, 14, 7, 15);
    let done = n - n % 16;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let base = sp.add(e * 8);
        let mut rows = [_mm_setzero_si128(); 8];
        for (r, row) in rows.iter_mut().enumerate() {
            *row = _mm_shuffle_epi8(load(base.add(r * 16)), mask);
        }
        for (j, plane) in transpose_8x16(rows).into_iter().enumerate() {
            store(dp.add(j * n + e), plane);
        }
        e += 16;
    }
    done
}

#[target_feature(enable = "ssse3")]
unsafe fn unshuffle8(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let mask = _mm_setr_epi8(0, 2, 4, 6, 8, 10, 12, 14, 1, 3, 5, 7, 9, 11, 13, 15);
    let done = n - n % 16;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let mut planes = [_mm_setzero_si128(); 8];
        for (j, plane) in planes.iter_mut().enumerate() {
            *plane = load(sp.add(j * n + e));
        }
        for (r, row) in transpose_8x16(planes).into_iter().enumerate() {
            store(dp.add(e * 8 + r * 16), _mm_shuffle_epi8(row, mask));
        }
        e += 16;
    }
    done
}

/// Shuffle the first `n` elements of `src` into plane layout (planes of length `n`).
///
/// # Safety
/// SSSE3 must be available.
unsafe fn shuffle_planes(elem_size: usize, n: usize, src: &[u8], dst: &mut [u8]) {
    let done = match elem_size {
        2 => shuffle2(n, src, dst),
        4 => shuffle4(n, src, dst),
        8 => shuffle8(n, src, dst),
        _ => 0,
    };
    generic::shuffle_elements(elem_size, n, done, src, dst);
}

/// # Safety
/// SSSE3 must be available; lengths must satisfy `generic::check_args`.
pub(super) unsafe fn shuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    let n = src.len() / elem_size;
    shuffle_planes(elem_size, n, src, dst);
    generic::copy_tail(n * elem_size, src, dst);
}

/// # Safety
/// SSSE3 must be available; lengths must satisfy `generic::check_args`.
pub(super) unsafe fn unshuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    let n = src.len() / elem_size;
    let done = match elem_size {
        2 => unshuffle2(n, src, dst),
        4 => unshuffle4(n, src, dst),
        8 => unshuffle8(n, src, dst),
        _ => 0,
    };
    generic::unshuffle_elements(elem_size, n, done, src, dst);
    generic::copy_tail(n * elem_size, src, dst);
}

/// Pack bit `bit` of every byte in `plane` into `row`, 16 bytes per step.
#[target_feature(enable = "sse2")]
unsafe fn pack_plane_bits(plane: &[u8], bit: u32, row: &mut [u8]) {
    let count = _mm_cvtsi32_si128(7 - bit as i32);
    let vectorized = plane.len() - plane.len() % 16;
    let mut p = 0;
    while p < vectorized {
        // Shifting 16-bit lanes moves bit `bit` of both bytes into their MSB.
        let v = _mm_sll_epi16(load(plane.as_ptr().add(p)), count);
        let bits = _mm_movemask_epi8(v) as u32;
        row[p / 8] = bits as u8;
        row[p / 8 + 1] = (bits >> 8) as u8;
        p += 16;
    }
    generic::pack_plane_bits(&plane[vectorized..], bit, &mut row[vectorized / 8..]);
}

/// # Safety
/// SSSE3 must be available; lengths must satisfy `generic::check_args`.
pub(super) unsafe fn bitshuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    let n = src.len() / elem_size;
    let m = n - n % 8;
    let row_len = m / 8;

    if row_len > 0 {
        let mut planes = vec![0u8; m * elem_size];
        shuffle_planes(elem_size, m, &src[..m * elem_size], &mut planes);
        for (j, plane) in planes.chunks_exact(m).enumerate() {
            for b in 0..8u32 {
                let r = j * 8 + b as usize;
                pack_plane_bits(plane, b, &mut dst[r * row_len..(r + 1) * row_len]);
            }
        }
    }
    generic::copy_tail(m * elem_size, src, dst);
}
