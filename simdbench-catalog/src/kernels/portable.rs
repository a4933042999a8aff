//! Portable multiply-add kernels on 128-bit lane groups.
//!
//! Written as plain arrays; the optimizer maps each lane group onto one
//! SSE2/NEON register, so no target features are required.

use std::hint::black_box;

/// Element type usable in [`mul_add`]
pub trait Lane: Copy {
    /// Starting value for accumulator `i`
    fn seed(i: usize) -> Self;
    /// Multiplicand
    const FACTOR: Self;
    /// Addend
    const OFFSET: Self;
    /// `self * factor + offset` (wrapping for integers)
    fn mul_add(self, factor: Self, offset: Self) -> Self;
    /// Widen for reduction
    fn to_f64(self) -> f64;
}

impl Lane for f32 {
    const FACTOR: Self = 0.999_9;
    const OFFSET: Self = 1.0e-4;

    #[inline(always)]
    fn seed(i: usize) -> Self {
        1.0 + i as f32 / 64.0
    }

    #[inline(always)]
    fn mul_add(self, factor: Self, offset: Self) -> Self {
        self * factor + offset
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Lane for f64 {
    const FACTOR: Self = 0.999_9;
    const OFFSET: Self = 1.0e-4;

    #[inline(always)]
    fn seed(i: usize) -> Self {
        1.0 + i as f64 / 64.0
    }

    #[inline(always)]
    fn mul_add(self, factor: Self, offset: Self) -> Self {
        self * factor + offset
    }

    fn to_f64(self) -> f64 {
        self
    }
}

impl Lane for i32 {
    const FACTOR: Self = 1_103_515_245;
    const OFFSET: Self = 12_345;

    #[inline(always)]
    fn seed(i: usize) -> Self {
        i as i32 + 1
    }

    #[inline(always)]
    fn mul_add(self, factor: Self, offset: Self) -> Self {
        self.wrapping_mul(factor).wrapping_add(offset)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Run `n` iterations of `ILP` independent `LANES`-wide multiply-adds and
/// return the reduced accumulators.
#[inline(always)]
pub fn mul_add<T: Lane, const LANES: usize, const ILP: usize>(n: usize) -> f64 {
    let factor = black_box([T::FACTOR; LANES]);
    let offset = black_box([T::OFFSET; LANES]);
    let mut acc: [[T; LANES]; ILP] =
        black_box(std::array::from_fn(|i| std::array::from_fn(|j| T::seed(i * LANES + j))));

    for _ in 0..n {
        for group in acc.iter_mut() {
            for lane in 0..LANES {
                group[lane] = group[lane].mul_add(factor[lane], offset[lane]);
            }
        }
    }

    black_box(acc).iter().flatten().map(|x| x.to_f64()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_kernel_converges() {
        // x -> 0.9999 x + 1e-4 has its fixed point at 1.0
        let sum = mul_add::<f32, 4, 2>(100_000);
        assert!((sum - 8.0).abs() < 5e-2, "{sum}");

        let sum = mul_add::<f64, 2, 3>(200_000);
        assert!((sum - 6.0).abs() < 1e-6, "{sum}");
    }

    #[test]
    fn test_integer_kernel_matches_scalar() {
        let n = 1000;
        let mut expected = 0.0;
        for seed in 1..=8 {
            let mut x: i32 = seed;
            for _ in 0..n {
                x = x.wrapping_mul(i32::FACTOR).wrapping_add(i32::OFFSET);
            }
            expected += x as f64;
        }
        assert_eq!(mul_add::<i32, 4, 2>(n), expected);
    }

    #[test]
    fn test_zero_iterations_returns_seeds() {
        assert_eq!(mul_add::<i32, 4, 1>(0), 10.0);
    }
}
