#![warn(missing_docs)]
//! SimdBench Core - Execution Runtime
//!
//! This crate provides everything needed to run one throughput measurement:
//! - The three-phase `Benchmark` contract (setup, run, teardown)
//! - The execution engine fanning a benchmark out over high- and
//!   low-priority worker pools behind a spinning start barrier
//! - Thread priority hints mapped onto the host scheduler
//! - Monotonic timing with a hardware tick counter alongside
//! - Capability probes for vector length, sysctl values and CPU features

mod contract;
mod engine;
mod measure;
mod priority;
pub mod probe;

pub use contract::{Benchmark, BenchmarkFns, SetupError};
pub use engine::{
    EngineError, ExecutionRequest, ExecutionResult, ParseThreadCountsError, ThreadCounts,
    run_benchmark,
};
/// Whether this platform provides a hardware counter (x86_64 RDTSCP or AArch64 CNTVCT_EL0).
/// When `false`, `ExecutionResult::elapsed_ticks` is always 0.
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::Timer;
pub use priority::PriorityClass;
pub use probe::{BASELINE_FEATURE, feature_supported, sysctl_value, vector_length};
