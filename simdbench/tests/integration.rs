//! Integration tests for SimdBench
//!
//! These tests drive catalog entries and user benchmarks end to end through
//! the engine, the suites and the JSON output.

use regex::Regex;
use simdbench::{
    BASELINE_FEATURE, Benchmark, CpuInfo, EngineError, ExecutionRequest, GIGA, MemParams,
    MemorySweep, OpBenchmarkReport, SetupError, SuiteOptions, ThreadCounts, mem_benchmarks,
    op_benchmarks, rate_per_second, run_benchmark, run_memory_suite, run_op_suite, write_json,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn baseline_cpu() -> CpuInfo {
    CpuInfo {
        cpu_p_cores: 1,
        cpu_e_cores: 0,
        vector_length: 16,
        features: vec![BASELINE_FEATURE.to_string()],
    }
}

/// Counts every lifecycle call and fails setup for one chosen worker
struct Lifecycle {
    setups: AtomicUsize,
    runs: AtomicUsize,
    teardowns: AtomicUsize,
    fail_on: Option<usize>,
}

impl Lifecycle {
    fn new(fail_on: Option<usize>) -> Self {
        Self {
            setups: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
            teardowns: AtomicUsize::new(0),
            fail_on,
        }
    }
}

impl Benchmark for Lifecycle {
    type Params = f64;
    type Handle = f64;

    fn setup(&self, ops: &f64) -> Result<f64, SetupError> {
        let index = self.setups.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(index) {
            return Err(SetupError::Failed("refused".to_string()));
        }
        Ok(*ops)
    }

    fn run(&self, ops: &mut f64) -> f64 {
        self.runs.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(5));
        *ops
    }

    fn teardown(&self, _: f64) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Test that every worker runs once and the totals add up
#[test]
fn test_lifecycle_balanced() {
    let bench = Lifecycle::new(None);
    let result = run_benchmark(&bench, &250.0, ThreadCounts::new(3, 2)).unwrap();

    assert_eq!(result.total_operations, 1250.0);
    assert!(result.elapsed_seconds > 0.0);
    assert_eq!(bench.setups.load(Ordering::SeqCst), 5);
    assert_eq!(bench.runs.load(Ordering::SeqCst), 5);
    assert_eq!(bench.teardowns.load(Ordering::SeqCst), 5);
}

/// Test that a failed setup tears down its siblings and runs nothing
#[test]
fn test_setup_failure_aborts_request() {
    let bench = Lifecycle::new(Some(1));
    let err = run_benchmark(&bench, &1.0, ThreadCounts::new(2, 2)).unwrap_err();

    assert!(matches!(err, EngineError::Setup { .. }));
    assert_eq!(bench.setups.load(Ordering::SeqCst), 4);
    assert_eq!(bench.runs.load(Ordering::SeqCst), 0);
    assert_eq!(bench.teardowns.load(Ordering::SeqCst), 3);
}

/// Test that an empty thread split is rejected before any setup
#[test]
fn test_no_threads() {
    let bench = Lifecycle::new(None);
    let err = run_benchmark(&bench, &1.0, ThreadCounts::new(0, 0)).unwrap_err();

    assert!(matches!(err, EngineError::NoThreads));
    assert_eq!(bench.setups.load(Ordering::SeqCst), 0);
}

/// Test that a portable catalog entry reports two workers' worth of operations
#[test]
fn test_portable_op_entry() {
    let bench = op_benchmarks()
        .find(|b| b.feature == BASELINE_FEATURE && b.ilp == 4)
        .unwrap();
    let result = ExecutionRequest::new(&bench.benchmark, &(), ThreadCounts::new(1, 1))
        .execute()
        .unwrap();

    assert_eq!(result.total_operations, 2.0 * bench.ops_per_run());
    assert!(rate_per_second(&result, GIGA) > 0.0);
}

/// Test that invalid memory parameters are rejected in setup
#[test]
fn test_memory_entry_rejects_unaligned_size() {
    let bench = mem_benchmarks().next().unwrap();
    let err = run_benchmark(&bench.benchmark, &MemParams::new(1000, 64), ThreadCounts::new(1, 0))
        .unwrap_err();

    match err {
        EngineError::Setup { source, .. } => {
            assert!(matches!(source, SetupError::InvalidParams(_)))
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Test the op suite and JSON output end to end
#[test]
fn test_op_suite_writes_json() {
    let label = op_benchmarks()
        .find(|b| b.feature == BASELINE_FEATURE)
        .unwrap()
        .label;
    let options = SuiteOptions {
        warmup: 1,
        repetitions: 1,
        threads: vec![ThreadCounts::new(1, 0)],
        filter: Some(Regex::new(&format!("^{}$", regex::escape(label))).unwrap()),
        echo: false,
        progress: false,
    };
    let output = run_op_suite(&baseline_cpu(), &options);
    assert!(!output.results.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = write_json(dir.path(), "op_benchmarks.json", &output.results).unwrap();

    let json = std::fs::read_to_string(path).unwrap();
    let parsed: Vec<OpBenchmarkReport> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), output.results.len());
    assert_eq!(parsed[0].label, label);
    assert_eq!(parsed[0].threads_h, 1);
    assert_eq!(parsed[0].gops.len(), 1);
}

/// Test that the memory suite honors the allocation budget
#[test]
fn test_memory_suite_budget() {
    let label = mem_benchmarks().next().unwrap().label;
    let options = SuiteOptions {
        warmup: 0,
        repetitions: 1,
        threads: vec![ThreadCounts::new(1, 0), ThreadCounts::new(3, 0)],
        filter: Some(Regex::new(&format!("^{}$", regex::escape(label))).unwrap()),
        echo: false,
        progress: false,
    };
    let sweep = MemorySweep {
        sizes: vec![4096],
        alignments: vec![256],
    };
    let output = run_memory_suite(&baseline_cpu(), &options, &sweep);

    // 3 x 4096 exceeds twice the largest size, so only 1H+0L runs
    assert!(!output.results.is_empty());
    assert!(output.results.iter().all(|r| r.threads_h == 1));
    assert!(output.results.iter().all(|r| r.alignment == 256));
}
