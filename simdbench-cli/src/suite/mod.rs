//! Benchmark Suites
//!
//! Drives catalog entries through the execution engine:
//!
//! - **Planning**: thread combinations and memory buffer sizes
//! - **Repetition**: warmup executions followed by the measured series
//! - **Suites**: arithmetic operations and memory transfers, each printing
//!   one line per result above an `indicatif` progress bar

mod memory;
mod ops;
mod plan;

pub use memory::{MemorySweep, run_memory_suite};
pub use ops::run_op_suite;
pub use plan::{divider, generate_test_sizes, thread_combinations};

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use simdbench_core::{EngineError, ExecutionResult, ThreadCounts};
use simdbench_report::SkippedBenchmark;

/// Settings shared by both suites
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    /// Discarded executions before the measured series
    pub warmup: usize,
    /// Measured executions kept per benchmark
    pub repetitions: usize,
    /// Thread splits every benchmark runs with
    pub threads: Vec<ThreadCounts>,
    /// Only benchmarks whose label (or category) matches
    pub filter: Option<Regex>,
    /// Print dividers and result lines to stdout
    pub echo: bool,
    /// Draw a progress bar
    pub progress: bool,
}

impl SuiteOptions {
    /// Whether a benchmark passes the filter
    pub fn selects(&self, names: &[&str]) -> bool {
        match &self.filter {
            Some(re) => names.iter().any(|name| re.is_match(name)),
            None => true,
        }
    }
}

/// Results of one suite plus the benchmarks it did not run
#[derive(Debug, Clone)]
pub struct SuiteOutput<R> {
    /// One record per measured (benchmark, parameters, threads) combination
    pub results: Vec<R>,
    /// Deduplicated skip records, in first-seen order
    pub skipped: Vec<SkippedBenchmark>,
}

impl<R> Default for SuiteOutput<R> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<R> SuiteOutput<R> {
    /// Record a skip unless an identical one already exists
    pub fn skip(&mut self, label: &str, reason: impl Into<String>) {
        let skipped = SkippedBenchmark {
            label: label.to_string(),
            reason: reason.into(),
        };
        if !self.skipped.contains(&skipped) {
            self.skipped.push(skipped);
        }
    }
}

/// Execute `warmup + repetitions` times and keep the last `repetitions` results
pub fn repeat<F>(
    warmup: usize,
    repetitions: usize,
    mut execute: F,
) -> Result<Vec<ExecutionResult>, EngineError>
where
    F: FnMut() -> Result<ExecutionResult, EngineError>,
{
    let mut results = Vec::with_capacity(repetitions);
    for i in 0..warmup + repetitions {
        let result = execute()?;
        if i >= warmup {
            results.push(result);
        }
    }
    Ok(results)
}

/// Prints above the progress bar so result lines and the bar never interleave
struct Console {
    bar: ProgressBar,
    echo: bool,
}

impl Console {
    fn new(len: usize, options: &SuiteOptions) -> Self {
        let bar = if options.progress {
            let pb = ProgressBar::new(len as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            echo: options.echo,
        }
    }

    fn println(&self, line: impl AsRef<str>) {
        if self.echo {
            self.bar.suspend(|| println!("{}", line.as_ref()));
        }
    }

    fn step(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn inc(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(elapsed_seconds: f64) -> ExecutionResult {
        ExecutionResult {
            elapsed_seconds,
            total_operations: 1.0,
            elapsed_ticks: 0,
        }
    }

    #[test]
    fn test_repeat_discards_warmup() {
        let mut calls = 0;
        let results = repeat(2, 3, || {
            calls += 1;
            Ok(result(calls as f64))
        })
        .unwrap();

        assert_eq!(calls, 5);
        let elapsed: Vec<f64> = results.iter().map(|r| r.elapsed_seconds).collect();
        assert_eq!(elapsed, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_repeat_stops_on_error() {
        let mut calls = 0;
        let err = repeat(1, 4, || {
            calls += 1;
            if calls == 2 {
                Err(EngineError::NoThreads)
            } else {
                Ok(result(1.0))
            }
        })
        .unwrap_err();

        assert!(matches!(err, EngineError::NoThreads));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_skips_deduplicated() {
        let mut output = SuiteOutput::<()>::default();
        output.skip("FMLA (4 x f32, vector)", "missing feature neon");
        output.skip("FMLA (4 x f32, vector)", "missing feature neon");
        output.skip("FMLA (2 x f64, vector)", "missing feature neon");
        assert_eq!(output.skipped.len(), 2);
        assert_eq!(output.skipped[0].label, "FMLA (4 x f32, vector)");
    }

    #[test]
    fn test_filter_selects() {
        let mut options = SuiteOptions {
            warmup: 0,
            repetitions: 1,
            threads: vec![ThreadCounts::new(1, 0)],
            filter: None,
            echo: false,
            progress: false,
        };
        assert!(options.selects(&["anything"]));

        options.filter = Some(Regex::new("^LOAD").unwrap());
        assert!(options.selects(&["LOAD (16-byte units)"]));
        assert!(options.selects(&["STORE (16-byte units)", "LOAD category"]));
        assert!(!options.selects(&["STORE (16-byte units)"]));
    }
}
