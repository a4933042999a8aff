//! A user-defined benchmark driven by the simdbench engine.
//!
//! Each worker sums a private vector; setup allocates it outside the timed
//! window. Run with `cargo run --release --example custom_benchmark`.

use simdbench::prelude::*;
use std::hint::black_box;

struct VecSum;

struct SumParams {
    len: usize,
    passes: usize,
}

impl Benchmark for VecSum {
    type Params = SumParams;
    type Handle = (Vec<u64>, usize);

    fn setup(&self, params: &SumParams) -> Result<Self::Handle, SetupError> {
        if params.len == 0 {
            return Err(SetupError::InvalidParams("empty vector".to_string()));
        }
        Ok(((0..params.len as u64).collect(), params.passes))
    }

    fn run(&self, (data, passes): &mut Self::Handle) -> f64 {
        let mut total = 0u64;
        for _ in 0..*passes {
            total = total.wrapping_add(black_box(&*data).iter().sum::<u64>());
        }
        black_box(total);
        (data.len() * *passes) as f64
    }

    fn teardown(&self, _handle: Self::Handle) {}
}

fn main() -> anyhow::Result<()> {
    let params = SumParams {
        len: 1 << 16,
        passes: 2_000,
    };

    for threads in ["1H", "2H", "1H+1L", "0H+1L"] {
        let threads: ThreadCounts = threads.parse()?;
        let result = ExecutionRequest::new(&VecSum, &params, threads).execute()?;
        println!(
            "{:<6} {:>8.2} G additions/s ({:.2} ms)",
            threads.to_string(),
            rate_per_second(&result, GIGA),
            result.elapsed_seconds * 1000.0
        );
    }

    Ok(())
}
