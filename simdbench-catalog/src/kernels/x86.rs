//! 256-bit AVX kernels.
//!
//! Callers must have verified the named target features at runtime before
//! entering any function here.

use std::arch::x86_64::*;
use std::hint::black_box;

/// `ILP` independent `vfmadd` chains on 8 x f32.
///
/// # Safety
///
/// The CPU must support AVX and FMA.
#[target_feature(enable = "avx,fma")]
pub unsafe fn fma_f32x8<const ILP: usize>(n: usize) -> f64 {
    unsafe {
        let factor = _mm256_set1_ps(black_box(0.999_9));
        let offset = _mm256_set1_ps(black_box(1.0e-4));
        let mut acc = [_mm256_setzero_ps(); ILP];
        for (i, a) in acc.iter_mut().enumerate() {
            *a = _mm256_set1_ps(black_box(1.0 + i as f32 / 64.0));
        }

        for _ in 0..n {
            for a in acc.iter_mut() {
                *a = _mm256_fmadd_ps(*a, factor, offset);
            }
        }

        let mut sum = 0.0;
        for a in acc {
            let lanes: [f32; 8] = std::mem::transmute(a);
            sum += lanes.iter().map(|&x| x as f64).sum::<f64>();
        }
        sum
    }
}

/// `ILP` independent `vfmadd` chains on 4 x f64.
///
/// # Safety
///
/// The CPU must support AVX and FMA.
#[target_feature(enable = "avx,fma")]
pub unsafe fn fma_f64x4<const ILP: usize>(n: usize) -> f64 {
    unsafe {
        let factor = _mm256_set1_pd(black_box(0.999_9));
        let offset = _mm256_set1_pd(black_box(1.0e-4));
        let mut acc = [_mm256_setzero_pd(); ILP];
        for (i, a) in acc.iter_mut().enumerate() {
            *a = _mm256_set1_pd(black_box(1.0 + i as f64 / 64.0));
        }

        for _ in 0..n {
            for a in acc.iter_mut() {
                *a = _mm256_fmadd_pd(*a, factor, offset);
            }
        }

        let mut sum = 0.0;
        for a in acc {
            let lanes: [f64; 4] = std::mem::transmute(a);
            sum += lanes.iter().sum::<f64>();
        }
        sum
    }
}

/// `ILP` independent `vpmulld` + `vpaddd` chains on 8 x i32.
///
/// # Safety
///
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
pub unsafe fn mul_add_i32x8<const ILP: usize>(n: usize) -> f64 {
    unsafe {
        let factor = _mm256_set1_epi32(black_box(1_103_515_245));
        let offset = _mm256_set1_epi32(black_box(12_345));
        let mut acc = [_mm256_setzero_si256(); ILP];
        for (i, a) in acc.iter_mut().enumerate() {
            *a = _mm256_set1_epi32(black_box(i as i32 + 1));
        }

        for _ in 0..n {
            for a in acc.iter_mut() {
                *a = _mm256_add_epi32(_mm256_mullo_epi32(*a, factor), offset);
            }
        }

        let mut sum = 0.0;
        for a in acc {
            let lanes: [i32; 8] = std::mem::transmute(a);
            sum += lanes.iter().map(|&x| x as f64).sum::<f64>();
        }
        sum
    }
}
