#![warn(missing_docs)]
//! SimdBench Catalog - Benchmark Tables
//!
//! Static, read-only descriptions of every micro-benchmark simdbench knows,
//! each pairing a `BenchmarkFns` with the metadata needed to turn a raw
//! operation count into GOP/s or GB/s:
//! - [`op_benchmarks`]: vector arithmetic throughput (multiply-add chains)
//! - [`mem_benchmarks`]: load, store and copy bandwidth over private buffers
//!
//! The tables carry no runtime state and perform no rate computation.

pub mod kernels;
mod mem;
mod op;

pub use mem::{
    AlignedBuffer, MEM_ILP_VARIANTS, MIN_ALIGNMENT, MemBenchmark, MemHandle, MemParams,
    SIZE_ALIGNMENT, mem_benchmarks, n_iterations,
};
pub use op::{N_ITERATIONS, OP_ILP_VARIANTS, OpBenchmark, OpHandle, op_benchmarks};
