#![warn(missing_docs)]
//! # SimdBench
//!
//! Peak-throughput micro-benchmarks for vector arithmetic and memory
//! transfers on hybrid (performance + efficiency core) CPUs.
//!
//! SimdBench provides:
//! - **Three-phase contract**: `setup` and `teardown` stay outside the timed
//!   window; only `run` is measured
//! - **Priority classes**: high- and low-priority worker pools that the OS
//!   steers towards performance and efficiency cores
//! - **Synchronized start**: the timer starts only once every worker has
//!   checked in at the start gate, so the window covers only concurrent work
//! - **Catalog**: fused multiply-add families at ILP 1-8 and load, store and
//!   copy kernels at ILP 1, 2, 4 and 8 over aligned buffers
//! - **Reports**: GOP/s and GB/s per repetition, written as JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use simdbench::prelude::*;
//!
//! let bench = op_benchmarks().next().unwrap();
//! let result = run_benchmark(&bench.benchmark, &(), ThreadCounts::new(2, 0)).unwrap();
//! println!("{:.2} GOP/s", rate_per_second(&result, GIGA));
//! ```
//!
//! ## Custom Benchmarks
//!
//! ```ignore
//! struct Spin;
//!
//! impl Benchmark for Spin {
//!     type Params = u64;
//!     type Handle = u64;
//!
//!     fn setup(&self, n: &u64) -> Result<u64, SetupError> { Ok(*n) }
//!     fn run(&self, n: &mut u64) -> f64 { *n as f64 }
//!     fn teardown(&self, _: u64) {}
//! }
//! ```

// Re-export core types
pub use simdbench_core::{
    BASELINE_FEATURE, Benchmark, BenchmarkFns, EngineError, ExecutionRequest, ExecutionResult,
    HAS_CYCLE_COUNTER, ParseThreadCountsError, PriorityClass, SetupError, ThreadCounts, Timer,
    feature_supported, probe, run_benchmark, sysctl_value, vector_length,
};

// Re-export the catalog
pub use simdbench_catalog::{
    AlignedBuffer, MEM_ILP_VARIANTS, MIN_ALIGNMENT, MemBenchmark, MemHandle, MemParams,
    N_ITERATIONS, OP_ILP_VARIANTS, OpBenchmark, OpHandle, SIZE_ALIGNMENT, kernels,
    mem_benchmarks, n_iterations, op_benchmarks,
};

// Re-export report types
pub use simdbench_report::{
    CpuInfo, GIGA, MemBenchmarkReport, OpBenchmarkReport, OutputFormat, Report, ReportError,
    ReportMeta, SkippedBenchmark, SystemInfo, format_bytes, generate_json_report, mean,
    rate_per_second, write_json,
};

// Re-export the suite drivers
pub use simdbench_cli::{
    Cli, Commands, MemorySweep, SimdConfig, Suite, SuiteOptions, SuiteOutput, detect_cpu_info,
    generate_test_sizes, repeat, run_memory_suite, run_op_suite, thread_combinations,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Benchmark, BenchmarkFns, ExecutionRequest, ExecutionResult, GIGA, SetupError,
        ThreadCounts, mem_benchmarks, op_benchmarks, rate_per_second, run_benchmark,
    };
}

/// Run the SimdBench CLI.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     simdbench::run()
/// }
/// ```
pub use simdbench_cli::run;
