//! Load, store and copy kernels over a byte buffer.
//!
//! The buffer is walked in units of `LANES` x u64 (16, 32 or 64 bytes). Each
//! loop iteration issues `ILP` independent unit transfers; a trailing partial
//! block is finished one unit at a time. After every pass the buffer pointer
//! escapes through `black_box`, so passes cannot be merged or elided.

use std::hint::black_box;

type Unit<const LANES: usize> = [u64; LANES];

#[inline(always)]
fn read_unit<const LANES: usize>(bytes: &[u8]) -> Unit<LANES> {
    debug_assert!(bytes.len() >= LANES * 8);
    // SAFETY: the slice holds at least one unit; the read is unaligned.
    unsafe { std::ptr::read_unaligned(bytes.as_ptr().cast::<Unit<LANES>>()) }
}

#[inline(always)]
fn write_unit<const LANES: usize>(bytes: &mut [u8], value: Unit<LANES>) {
    debug_assert!(bytes.len() >= LANES * 8);
    // SAFETY: the slice holds at least one unit; the write is unaligned.
    unsafe { std::ptr::write_unaligned(bytes.as_mut_ptr().cast::<Unit<LANES>>(), value) }
}

#[inline(always)]
fn fold<const LANES: usize>(acc: &mut Unit<LANES>, value: Unit<LANES>) {
    for (a, v) in acc.iter_mut().zip(value) {
        *a ^= v;
    }
}

/// Read all of `src` `n_iterations` times; returns a checksum
pub fn load<const LANES: usize, const ILP: usize>(src: &[u8], n_iterations: usize) -> u64 {
    let unit = LANES * 8;
    let mut acc = [[0u64; LANES]; ILP];

    for _ in 0..n_iterations {
        let mut blocks = src.chunks_exact(unit * ILP);
        for block in &mut blocks {
            for (i, a) in acc.iter_mut().enumerate() {
                fold(a, read_unit(&block[i * unit..]));
            }
        }
        for tail in blocks.remainder().chunks_exact(unit) {
            fold(&mut acc[0], read_unit(tail));
        }
        black_box(src.as_ptr());
    }

    acc.iter().flatten().fold(0, |x, y| x ^ y)
}

/// Overwrite all of `dst` `n_iterations` times
pub fn store<const LANES: usize, const ILP: usize>(dst: &mut [u8], n_iterations: usize) {
    let unit = LANES * 8;
    let pattern: Unit<LANES> = black_box([0x5a5a_5a5a_5a5a_5a5a; LANES]);

    for _ in 0..n_iterations {
        let mut blocks = dst.chunks_exact_mut(unit * ILP);
        for block in &mut blocks {
            for i in 0..ILP {
                write_unit(&mut block[i * unit..], pattern);
            }
        }
        for tail in blocks.into_remainder().chunks_exact_mut(unit) {
            write_unit(tail, pattern);
        }
        black_box(dst.as_mut_ptr());
    }
}

/// Copy `src` into `dst` `n_iterations` times
pub fn copy<const LANES: usize, const ILP: usize>(src: &[u8], dst: &mut [u8], n_iterations: usize) {
    let unit = LANES * 8;
    let len = src.len().min(dst.len());
    let (src, dst) = (&src[..len], &mut dst[..len]);

    for _ in 0..n_iterations {
        let mut src_blocks = src.chunks_exact(unit * ILP);
        let mut dst_blocks = dst.chunks_exact_mut(unit * ILP);
        for (from, to) in (&mut src_blocks).zip(&mut dst_blocks) {
            for i in 0..ILP {
                write_unit(&mut to[i * unit..], read_unit::<LANES>(&from[i * unit..]));
            }
        }
        let tails = src_blocks
            .remainder()
            .chunks_exact(unit)
            .zip(dst_blocks.into_remainder().chunks_exact_mut(unit));
        for (from, to) in tails {
            write_unit(to, read_unit::<LANES>(from));
        }
        black_box(dst.as_mut_ptr());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_fills_every_unit() {
        let mut buf = vec![0u8; 768];
        store::<8, 4>(&mut buf, 2);
        assert!(buf.iter().all(|&b| b == 0x5a));
    }

    #[test]
    fn test_copy_with_tail() {
        // 768 bytes = one 512-byte block plus a 256-byte tail at ILP 8
        let src: Vec<u8> = (0..768).map(|i| (i % 251) as u8).collect();
        let mut dst = vec![0u8; 768];
        copy::<8, 8>(&src, &mut dst, 1);
        assert_eq!(src, dst);
    }

    #[test]
    fn test_load_checksum_independent_of_ilp() {
        let mut src = vec![0u8; 1024];
        src[100] = 0xff;
        src[1000] = 0x0f;
        let a = load::<2, 1>(&src, 1);
        let b = load::<2, 4>(&src, 1);
        let c = load::<2, 8>(&src, 1);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, 0);
    }
}
