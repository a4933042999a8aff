//! 128-bit NEON `fmla` kernels.

use std::arch::aarch64::*;
use std::hint::black_box;

/// `ILP` independent `fmla` chains on 4 x f32.
///
/// # Safety
///
/// The CPU must support NEON (every AArch64 Linux and macOS target does).
#[target_feature(enable = "neon")]
pub unsafe fn fmla_f32x4<const ILP: usize>(n: usize) -> f64 {
    unsafe {
        let factor = vdupq_n_f32(black_box(0.999_9));
        let offset = vdupq_n_f32(black_box(1.0e-4));
        let mut acc = [vdupq_n_f32(0.0); ILP];
        for (i, a) in acc.iter_mut().enumerate() {
            *a = vdupq_n_f32(black_box(1.0 + i as f32 / 64.0));
        }

        for _ in 0..n {
            for a in acc.iter_mut() {
                // offset + a * factor
                *a = vfmaq_f32(offset, *a, factor);
            }
        }

        acc.iter().map(|&a| vaddvq_f32(a) as f64).sum()
    }
}

/// `ILP` independent `fmla` chains on 2 x f64.
///
/// # Safety
///
/// The CPU must support NEON.
#[target_feature(enable = "neon")]
pub unsafe fn fmla_f64x2<const ILP: usize>(n: usize) -> f64 {
    unsafe {
        let factor = vdupq_n_f64(black_box(0.999_9));
        let offset = vdupq_n_f64(black_box(1.0e-4));
        let mut acc = [vdupq_n_f64(0.0); ILP];
        for (i, a) in acc.iter_mut().enumerate() {
            *a = vdupq_n_f64(black_box(1.0 + i as f64 / 64.0));
        }

        for _ in 0..n {
            for a in acc.iter_mut() {
                *a = vfmaq_f64(offset, *a, factor);
            }
        }

        acc.iter().map(|&a| vaddvq_f64(a)).sum()
    }
}
