//! Benchmark Execution Engine
//!
//! Fans one benchmark out over a mix of high- and low-priority worker
//! threads, releases them together through a spinning start barrier and
//! sums the operation counts they report.
//!
//! ## Lifecycle of one request
//!
//! 1. Build one thread pool per non-empty priority class.
//! 2. Run every worker's `setup` on its class pool and wait for all of them.
//! 3. Spawn the run tasks; each checks in at the start gate and spins.
//! 4. Once every worker has checked in, start the timer and open the gate,
//!    then wait for every `run` to return.
//! 5. Stop the timer, drop the pools, tear every handle down.

use crate::contract::{Benchmark, SetupError};
use crate::measure::Timer;
use crate::priority::PriorityClass;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;

/// Errors that abort an execution request
#[derive(Debug, Error)]
pub enum EngineError {
    /// Both thread counts were zero
    #[error("at least one worker thread is required")]
    NoThreads,

    /// A worker pool could not be created
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A worker's setup failed; every successful setup has been torn down
    #[error("setup failed on worker {worker}: {source}")]
    Setup {
        /// Index of the first failing worker (high-priority workers first)
        worker: usize,
        /// The benchmark's error
        #[source]
        source: SetupError,
    },
}

/// Number of workers per priority class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadCounts {
    /// Workers requested at high priority
    pub high: usize,
    /// Workers requested at low priority
    pub low: usize,
}

impl ThreadCounts {
    /// Create a split of `high` + `low` workers
    pub const fn new(high: usize, low: usize) -> Self {
        Self { high, low }
    }

    /// Total number of workers
    pub const fn total(&self) -> usize {
        self.high + self.low
    }
}

impl fmt::Display for ThreadCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}H+{}L", self.high, self.low)
    }
}

/// Rejected thread-count string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid thread counts '{0}' (expected e.g. 4H+2L, 4h2l or 4,2)")]
pub struct ParseThreadCountsError(String);

impl FromStr for ThreadCounts {
    type Err = ParseThreadCountsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseThreadCountsError(s.to_string());
        let trimmed = s.trim();

        if let Some((high, low)) = trimmed.split_once(',') {
            let high = high.trim().parse().map_err(|_| invalid())?;
            let low = low.trim().parse().map_err(|_| invalid())?;
            return Ok(Self { high, low });
        }

        let mut counts = Self::default();
        let (mut seen_high, mut seen_low) = (false, false);
        let mut digits = String::new();
        for c in trimmed.chars() {
            match c.to_ascii_lowercase() {
                d if d.is_ascii_digit() => digits.push(d),
                'h' if !seen_high && !digits.is_empty() => {
                    counts.high = digits.parse().map_err(|_| invalid())?;
                    seen_high = true;
                    digits.clear();
                }
                'l' if !seen_low && !digits.is_empty() => {
                    counts.low = digits.parse().map_err(|_| invalid())?;
                    seen_low = true;
                    digits.clear();
                }
                '+' | ' ' if digits.is_empty() => {}
                _ => return Err(invalid()),
            }
        }

        if !digits.is_empty() || !(seen_high || seen_low) {
            return Err(invalid());
        }
        Ok(counts)
    }
}

/// Outcome of one execution request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Monotonic duration of the timed window
    pub elapsed_seconds: f64,
    /// Sum of the operation counts returned by every worker's `run`
    pub total_operations: f64,
    /// Hardware counter delta across the timed window (0 without a counter)
    pub elapsed_ticks: u64,
}

impl ExecutionResult {
    /// Aggregate throughput; 0 when the window was too short to measure
    pub fn operations_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.total_operations / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

/// A benchmark, its shared parameters and the thread split to run it with
#[derive(Debug)]
pub struct ExecutionRequest<'a, B: Benchmark + ?Sized> {
    /// Benchmark definition
    pub benchmark: &'a B,
    /// Parameters passed to every worker's setup
    pub params: &'a B::Params,
    /// Worker split
    pub threads: ThreadCounts,
}

impl<B: Benchmark + ?Sized> Clone for ExecutionRequest<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Benchmark + ?Sized> Copy for ExecutionRequest<'_, B> {}

impl<'a, B: Benchmark + ?Sized> ExecutionRequest<'a, B> {
    /// Bundle a request
    pub fn new(benchmark: &'a B, params: &'a B::Params, threads: ThreadCounts) -> Self {
        Self {
            benchmark,
            params,
            threads,
        }
    }

    /// Run the request; see [`run_benchmark`]
    pub fn execute(&self) -> Result<ExecutionResult, EngineError> {
        run_benchmark(self.benchmark, self.params, self.threads)
    }
}

/// `f64` accumulator updated with a relaxed compare-exchange loop.
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    fn fetch_add(&self, value: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + value).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    fn into_inner(self) -> f64 {
        f64::from_bits(self.0.into_inner())
    }
}

/// Execute `benchmark` on `threads.high` high-priority and `threads.low`
/// low-priority workers and return the timed window's result.
///
/// Every handle produced by `setup` is torn down exactly once, including
/// when a sibling's setup fails, in which case no `run` is invoked.
pub fn run_benchmark<B>(
    benchmark: &B,
    params: &B::Params,
    threads: ThreadCounts,
) -> Result<ExecutionResult, EngineError>
where
    B: Benchmark + ?Sized,
{
    if threads.total() == 0 {
        return Err(EngineError::NoThreads);
    }

    let high_pool = build_pool(PriorityClass::High, threads.high)?;
    let low_pool = build_pool(PriorityClass::Low, threads.low)?;
    tracing::debug!(threads = %threads, "worker pools ready");

    // Setup phase: all outcomes are joined before any is inspected.
    let mut outcomes = setup_on(high_pool.as_ref(), benchmark, params, threads.high);
    outcomes.extend(setup_on(low_pool.as_ref(), benchmark, params, threads.low));

    let mut handles = Vec::with_capacity(outcomes.len());
    let mut failure = None;
    for (worker, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                if failure.is_none() {
                    failure = Some((worker, source));
                }
            }
        }
    }

    if let Some((worker, source)) = failure {
        tracing::warn!(worker, error = %source, "benchmark setup failed, tearing down");
        drop(high_pool);
        drop(low_pool);
        for handle in handles {
            benchmark.teardown(handle);
        }
        return Err(EngineError::Setup { worker, source });
    }
    tracing::debug!(workers = handles.len(), "setup complete");

    // Run phase
    let gate = StartGate::new(threads.total());
    let total = AtomicF64::new(0.0);
    let (high_handles, low_handles) = handles.split_at_mut(threads.high);

    let timer = match (&high_pool, &low_pool) {
        (Some(high), Some(low)) => high.in_place_scope(|hs| {
            spawn_workers(hs, benchmark, high_handles, &gate, &total);
            low.in_place_scope(|ls| {
                spawn_workers(ls, benchmark, low_handles, &gate, &total);
                gate.release()
            })
        }),
        (Some(pool), None) => pool.in_place_scope(|s| {
            spawn_workers(s, benchmark, high_handles, &gate, &total);
            gate.release()
        }),
        (None, Some(pool)) => pool.in_place_scope(|s| {
            spawn_workers(s, benchmark, low_handles, &gate, &total);
            gate.release()
        }),
        (None, None) => return Err(EngineError::NoThreads),
    };
    let (elapsed, elapsed_ticks) = timer.stop();

    drop(high_pool);
    drop(low_pool);
    for handle in handles {
        benchmark.teardown(handle);
    }

    let result = ExecutionResult {
        elapsed_seconds: elapsed.as_secs_f64(),
        total_operations: total.into_inner(),
        elapsed_ticks,
    };
    tracing::debug!(
        elapsed_seconds = result.elapsed_seconds,
        total_operations = result.total_operations,
        "benchmark finished"
    );
    Ok(result)
}

fn build_pool(class: PriorityClass, n: usize) -> Result<Option<ThreadPool>, EngineError> {
    if n == 0 {
        return Ok(None);
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(n)
        .thread_name(move |i| format!("simdbench-{}-{i}", class.as_str()))
        .start_handler(move |_| class.apply_to_current_thread())
        .build()?;
    Ok(Some(pool))
}

fn setup_on<B>(
    pool: Option<&ThreadPool>,
    benchmark: &B,
    params: &B::Params,
    n: usize,
) -> Vec<Result<B::Handle, SetupError>>
where
    B: Benchmark + ?Sized,
{
    match pool {
        Some(pool) => pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|_| benchmark.setup(params))
                .collect()
        }),
        None => Vec::new(),
    }
}

fn spawn_workers<'scope, B>(
    scope: &rayon::Scope<'scope>,
    benchmark: &'scope B,
    handles: &'scope mut [B::Handle],
    gate: &'scope StartGate,
    total: &'scope AtomicF64,
) where
    B: Benchmark + ?Sized,
{
    for handle in handles {
        scope.spawn(move |_| {
            gate.wait();
            total.fetch_add(benchmark.run(handle));
        });
    }
}

/// Spinning start barrier.
///
/// A worker task occupies its pool thread while it waits, so once all
/// `workers` have arrived each one is parked on a distinct thread and none
/// can pick up a second task.
struct StartGate {
    workers: usize,
    arrived: AtomicUsize,
    open: AtomicBool,
}

impl StartGate {
    fn new(workers: usize) -> Self {
        Self {
            workers,
            arrived: AtomicUsize::new(0),
            open: AtomicBool::new(false),
        }
    }

    /// Check in, then spin until the gate opens
    #[inline(always)]
    fn wait(&self) {
        self.arrived.fetch_add(1, Ordering::AcqRel);
        while !self.open.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
    }

    /// Wait for every worker to check in, then open the timed window.
    #[inline(always)]
    fn release(&self) -> Timer {
        while self.arrived.load(Ordering::Acquire) < self.workers {
            std::hint::spin_loop();
        }
        let timer = Timer::start();
        self.open.store(true, Ordering::Release);
        timer
    }
}
