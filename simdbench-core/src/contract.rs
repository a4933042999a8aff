//! Benchmark Contract
//!
//! A benchmark is three entry points: `setup` performs allocation and
//! preprocessing, `run` executes the measured workload and reports how many
//! operations it completed, and `teardown` releases whatever setup acquired.
//!
//! Each worker thread owns exactly one handle. The handle is moved out of
//! `setup`, lent exclusively to `run`, and consumed by `teardown`, so no two
//! threads can ever observe the same per-thread state.

use thiserror::Error;

/// Why a worker could not prepare its private state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// The CPU lacks a feature the benchmark body requires
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Benchmark parameters were rejected
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A buffer could not be allocated
    #[error("Allocation of {size} bytes (alignment {alignment}) failed")]
    Allocation {
        /// Requested size in bytes
        size: usize,
        /// Requested alignment in bytes
        alignment: usize,
    },

    /// Any other benchmark-specific failure
    #[error("Setup failed: {0}")]
    Failed(String),
}

/// The three-phase lifecycle every benchmark honors.
///
/// `setup` may be called concurrently from independent threads with the same
/// shared `params`. `run` executes inside the timed window and must not block,
/// allocate or perform I/O. `teardown` runs after the window closes.
pub trait Benchmark: Sync {
    /// Benchmark-specific configuration shared read-only by all workers
    type Params: Sync + ?Sized;
    /// Per-thread private state
    type Handle: Send;

    /// Prepare one worker's private state
    fn setup(&self, params: &Self::Params) -> Result<Self::Handle, SetupError>;

    /// Execute the measured workload, returning the operation count (≥ 0)
    fn run(&self, handle: &mut Self::Handle) -> f64;

    /// Release everything acquired in `setup`
    fn teardown(&self, handle: Self::Handle);
}

/// A benchmark assembled from three function pointers.
///
/// This is the form static catalog tables use: every entry shares the
/// parameter and handle types of its table and differs only in the functions.
pub struct BenchmarkFns<P: ?Sized, H> {
    /// Prepare one worker's private state
    pub setup: fn(&P) -> Result<H, SetupError>,
    /// Run the workload and return the number of operations executed
    pub run: fn(&mut H) -> f64,
    /// Tear the worker's state down
    pub teardown: fn(H),
}

impl<P: ?Sized, H> Clone for BenchmarkFns<P, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized, H> Copy for BenchmarkFns<P, H> {}

impl<P: ?Sized, H> std::fmt::Debug for BenchmarkFns<P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkFns")
            .field("handle", &std::any::type_name::<H>())
            .finish_non_exhaustive()
    }
}

impl<P, H> Benchmark for BenchmarkFns<P, H>
where
    P: Sync + ?Sized,
    H: Send,
{
    type Params = P;
    type Handle = H;

    #[inline]
    fn setup(&self, params: &P) -> Result<H, SetupError> {
        (self.setup)(params)
    }

    #[inline]
    fn run(&self, handle: &mut H) -> f64 {
        (self.run)(handle)
    }

    #[inline]
    fn teardown(&self, handle: H) {
        (self.teardown)(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_double(params: &u64) -> Result<u64, SetupError> {
        if *params == 0 {
            return Err(SetupError::InvalidParams("zero".to_string()));
        }
        Ok(params * 2)
    }

    fn run_value(handle: &mut u64) -> f64 {
        *handle as f64
    }

    fn teardown_noop(_: u64) {}

    const DOUBLE: BenchmarkFns<u64, u64> = BenchmarkFns {
        setup: setup_double,
        run: run_value,
        teardown: teardown_noop,
    };

    #[test]
    fn test_fn_benchmark_lifecycle() {
        let mut handle = DOUBLE.setup(&21).unwrap();
        assert_eq!(DOUBLE.run(&mut handle), 42.0);
        DOUBLE.teardown(handle);
    }

    #[test]
    fn test_fn_benchmark_setup_error() {
        let err = DOUBLE.setup(&0).unwrap_err();
        assert_eq!(err, SetupError::InvalidParams("zero".to_string()));
        assert_eq!(err.to_string(), "Invalid parameters: zero");
    }

    #[test]
    fn test_allocation_error_message() {
        let err = SetupError::Allocation {
            size: 4096,
            alignment: 64,
        };
        assert_eq!(
            err.to_string(),
            "Allocation of 4096 bytes (alignment 64) failed"
        );
    }
}
