//! shuffle/avx2.rs
//!
//! AVX2 byte shuffle and bit shuffle for x86_64.
//!
//! Design notes:
//! - Element sizes 2, 4 and 8 are vectorized 32 elements at a time; every
//!   other size, and the leftover `n % 32` elements, go through `generic`.
//! - `vpshufb` only moves bytes inside a 128-bit lane, so each kernel gathers
//!   per lane first and then fixes the lane order with cross-lane permutes.
//! - Bit shuffle packs 32 plane bytes per `movemask`; bit unshuffle reuses
//!   the scalar kernel.
#![allow(unsafe_code)]

use std::arch::x86_64::*;

use super::generic;

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load(p: *const u8) -> __m256i {
    _mm256_loadu_si256(p as *const __m256i)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn store(p: *mut u8, v: __m256i) {
    _mm256_storeu_si256(p as *mut __m256i, v)
}

/// The same 16-byte `vpshufb` mask in both lanes.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn lane_mask(m: [i8; 16]) -> __m256i {
    _mm256_broadcastsi128_si256(_mm_loadu_si128(m.as_ptr() as *const __m128i))
}

/// Transpose a 4x4 matrix of 64-bit lanes: `out[c]` qword `r` = `rows[r]` qword `c`.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn transpose_4x64(rows: [__m256i; 4]) -> [__m256i; 4] {
    let t0 = _mm256_unpacklo_epi64(rows[0], rows[1]);
    let t1 = _mm256_unpackhi_epi64(rows[0], rows[1]);
    let t2 = _mm256_unpacklo_epi64(rows[2], rows[3]);
    let t3 = _mm256_unpackhi_epi64(rows[2], rows[3]);
    [
        _mm256_permute2x128_si256::<0x20>(t0, t2),
        _mm256_permute2x128_si256::<0x20>(t1, t3),
        _mm256_permute2x128_si256::<0x31>(t0, t2),
        _mm256_permute2x128_si256::<0x31>(t1, t3),
    ]
}

/// Transpose an 8x8 matrix of 32-bit lanes: `out[c]` dword `r` = `rows[r]` dword `c`.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn transpose_8x32(rows: [__m256i; 8]) -> [__m256i; 8] {
    let t0 = _mm256_unpacklo_epi32(rows[0], rows[1]);
    let t1 = _mm256_unpackhi_epi32(rows[0], rows[1]);
    let t2 = _mm256_unpacklo_epi32(rows[2], rows[3]);
    let t3 = _mm256_unpackhi_epi32(rows[2], rows[3]);
    let t4 = _mm256_unpacklo_epi32(rows[4], rows[5]);
    let t5 = _mm256_unpackhi_epi32(rows[4], rows[5]);
    let t6 = _mm256_unpacklo_epi32(rows[6], rows[7]);
    let t7 = _mm256_unpackhi_epi32(rows[6], rows[7]);

    // u[j] lane l holds dword 4l + j of rows 0..4; u[j + 4] the same for rows 4..8.
    let u = [
        _mm256_unpacklo_epi64(t0, t2),
        _mm256_unpackhi_epi64(t0, t2),
        _mm256_unpacklo_epi64(t1, t3),
        _mm256_unpackhi_epi64(t1, t3),
        _mm256_unpacklo_epi64(t4, t6),
        _mm256_unpackhi_epi64(t4, t6),
        _mm256_unpacklo_epi64(t5, t7),
        _mm256_unpackhi_epi64(t5, t7),
    ];

    [
        _mm256_permute2x128_si256::<0x20>(u[0], u[4]),
        _mm256_permute2x128_si256::<0x20>(u[1], u[5]),
        _mm256_permute2x128_si256::<0x20>(u[2], u[6]),
        _mm256_permute2x128_si256::<0x20>(u[3], u[7]),
        _mm256_permute2x128_si256::<0x31>(u[0], u[4]),
        _mm256_permute2x128_si256::<0x31>(u[1], u[5]),
        _mm256_permute2x128_si256::<0x31>(u[2], u[6]),
        _mm256_permute2x128_si256::<0x31>(u[3], u[7]),
    ]
}

// Each vector kernel below returns how many leading elements it handled
// (a multiple of 32). Callers guarantee `src.len() >= n * size` and
// `dst.len() >= n * size`.

const GATHER_2: [i8; 16] = [0, 2, 4, 6, 8, 10, 12, 14, 1, 3, 5, 7, 9, 11, 13, 15];
const GATHER_4: [i8; 16] = [0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15];
const GATHER_8: [i8; 16] = [0, 8, 1, 9, 2, 10, 3, 11, 4, 12, 5, 13, 6, 14, 7, 15];
/// Interleaves the low-lane and high-lane word of each byte offset.
const PAIR_WORDS: [i8; 16] = [0, 1, 8, 9, 2, 3, 10, 11, 4, 5, 12, 13, 6, 7, 14, 15];
const UNPAIR_WORDS: [i8; 16] = [0, 1, 4, 5, 8, 9, 12, 13, 2, 3, 6, 7, 10, 11, 14, 15];

/// Qword order `[0, 2, 1, 3]`; its own inverse.
const SWAP_MIDDLE_QWORDS: i32 = 0b11_01_10_00;

#[target_feature(enable = "avx2")]
unsafe fn shuffle2(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let mask = lane_mask(GATHER_2);
    let done = n - n % 32;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let a = _mm256_permute4x64_epi64::<SWAP_MIDDLE_QWORDS>(_mm256_shuffle_epi8(load(sp.add(e * 2)), mask));
        let b = _mm256_permute4x64_epi64::<SWAP_MIDDLE_QWORDS>(_mm256_shuffle_epi8(load(sp.add(e * 2 + 32)), mask));
        store(dp.add(e), _mm256_permute2x128_si256::<0x20>(a, b));
        store(dp.add(n + e), _mm256_permute2x128_si256::<0x31>(a, b));
        e += 32;
    }
    done
}

#[target_feature(enable = "avx2")]
unsafe fn unshuffle2(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let done = n - n % 32;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let p0 = load(sp.add(e));
        let p1 = load(sp.add(n + e));
        // lo = elements [0..8 | 16..24], hi = [8..16 | 24..32]
        let lo = _mm256_unpacklo_epi8(p0, p1);
        let hi = _mm256_unpackhi_epi8(p0, p1);
        store(dp.add(e * 2), _mm256_permute2x128_si256::<0x20>(lo, hi));
        store(dp.add(e * 2 + 32), _mm256_permute2x128_si256::<0x31>(lo, hi));
        e += 32;
    }
    done
}

#[target_feature(enable = "avx2")]
unsafe fn shuffle4(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let mask = lane_mask(GATHER_4);
    let spread = _mm256_setr_epi32(0, 4, 1, 5, 2, 6, 3, 7);
    let done = n - n % 32;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let base = sp.add(e * 4);
        // After the permute, qword j of row k is byte j of elements 8k..8k+8.
        let mut rows = [_mm256_setzero_si256(); 4];
        for (k, row) in rows.iter_mut().enumerate() {
            let gathered = _mm256_shuffle_epi8(load(base.add(k * 32)), mask);
            *row = _mm256_permutevar8x32_epi32(gathered, spread);
        }
        for (j, plane) in transpose_4x64(rows).into_iter().enumerate() {
            store(dp.add(j * n + e), plane);
        }
        e += 32;
    }
    done
}

#[target_feature(enable = "avx2")]
unsafe fn unshuffle4(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let mask = lane_mask(GATHER_4);
    let gather = _mm256_setr_epi32(0, 2, 4, 6, 1, 3, 5, 7);
    let done = n - n % 32;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let mut planes = [_mm256_setzero_si256(); 4];
        for (j, plane) in planes.iter_mut().enumerate() {
            *plane = load(sp.add(j * n + e));
        }
        for (k, row) in transpose_4x64(planes).into_iter().enumerate() {
            let grouped = _mm256_permutevar8x32_epi32(row, gather);
            store(dp.add(e * 4 + k * 32), _mm256_shuffle_epi8(grouped, mask));
        }
        e += 32;
    }
    done
}

#[target_feature(enable = "avx2")]
unsafe fn shuffle8(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let gather = lane_mask(GATHER_8);
    let pair = lane_mask(PAIR_WORDS);
    let done = n - n % 32;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let base = sp.add(e * 8);
        // Dword j of row k is byte j of elements 4k..4k+4.
        let mut rows = [_mm256_setzero_si256(); 8];
        for (k, row) in rows.iter_mut().enumerate() {
            let words = _mm256_shuffle_epi8(load(base.add(k * 32)), gather);
            let halves = _mm256_permute4x64_epi64::<SWAP_MIDDLE_QWORDS>(words);
            *row = _mm256_shuffle_epi8(halves, pair);
        }
        for (j, plane) in transpose_8x32(rows).into_iter().enumerate() {
            store(dp.add(j * n + e), plane);
        }
        e += 32;
    }
    done
}

#[target_feature(enable = "avx2")]
unsafe fn unshuffle8(n: usize, src: &[u8], dst: &mut [u8]) -> usize {
    let scatter = lane_mask(GATHER_2);
    let unpair = lane_mask(UNPAIR_WORDS);
    let done = n - n % 32;
    let (sp, dp) = (src.as_ptr(), dst.as_mut_ptr());
    let mut e = 0;
    while e < done {
        let mut planes = [_mm256_setzero_si256(); 8];
        for (j, plane) in planes.iter_mut().enumerate() {
            *plane = load(sp.add(j * n + e));
        }
        for (k, row) in transpose_8x32(planes).into_iter().enumerate() {
            let halves = _mm256_shuffle_epi8(row, unpair);
            let words = _mm256_permute4x64_epi64::<SWAP_MIDDLE_QWORDS>(halves);
            store(dp.add(e * 8 + k * 32), _mm256_shuffle_epi8(words, scatter));
        }
        e += 32;
    }
    done
}

/// Shuffle the first `n` elements of `src` into plane layout (planes of length `n`).
///
/// # Safety
/// AVX2 must be available.
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
/// AVX2 must be available; lengths must satisfy `generic::check_args`.
pub(super) unsafe fn shuffle(elem_size: usize, src: &[u8], dst: &mut [u8]) {
    let n = src.len() / elem_size;
    shuffle_planes(elem_size, n, src, dst);
    generic::copy_tail(n * elem_size, src, dst);
}

/// # Safety
/// AVX2 must be available; lengths must satisfy `generic::check_args`.
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

/// Pack bit `bit` of every byte in `plane` into `row`, 32 bytes per step.
#[target_feature(enable = "avx2")]
unsafe fn pack_plane_bits(plane: &[u8], bit: u32, row: &mut [u8]) {
    let count = _mm_cvtsi32_si128(7 - bit as i32);
    let vectorized = plane.len() - plane.len() % 32;
    let mut p = 0;
    while p < vectorized {
        let v = _mm256_sll_epi16(load(plane.as_ptr().add(p)), count);
        let bits = _mm256_movemask_epi8(v) as u32;
        row[p / 8..p / 8 + 4].copy_from_slice(&bits.to_le_bytes());
        p += 32;
    }
    generic::pack_plane_bits(&plane[vectorized..], bit, &mut row[vectorized / 8..]);
}

/// # Safety
/// AVX2 must be available; lengths must satisfy `generic::check_args`.
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
