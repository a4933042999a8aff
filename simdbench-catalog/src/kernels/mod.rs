//! Benchmark bodies.
//!
//! Every kernel keeps its working set in independent accumulators so the
//! `ILP` parameter controls how many data-independent instructions are in
//! flight per loop iteration. Results are passed through `black_box` so the
//! optimizer cannot drop the work.

pub mod memory;
pub mod portable;

#[cfg(target_arch = "aarch64")]
pub mod aarch64;
#[cfg(target_arch = "x86_64")]
pub mod x86;
