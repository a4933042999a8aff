//! Arithmetic throughput suite.

use super::{Console, SuiteOptions, SuiteOutput, divider, repeat};
use simdbench_catalog::{OpBenchmark, op_benchmarks};
use simdbench_core::ExecutionRequest;
use simdbench_report::{CpuInfo, OpBenchmarkReport};

/// Run every selected operation benchmark at every thread split.
///
/// Entries whose feature `cpu` lacks are skipped once per label; a category
/// divider is printed whenever the category changes.
pub fn run_op_suite(cpu: &CpuInfo, options: &SuiteOptions) -> SuiteOutput<OpBenchmarkReport> {
    let mut output = SuiteOutput::default();

    let mut planned: Vec<&'static OpBenchmark> = Vec::new();
    for bench in op_benchmarks() {
        if !options.selects(&[bench.label, bench.category]) {
            continue;
        }
        if !cpu.supports(bench.feature) {
            output.skip(bench.label, format!("missing feature {}", bench.feature));
            continue;
        }
        planned.push(bench);
    }
    tracing::debug!(
        benchmarks = planned.len(),
        thread_splits = options.threads.len(),
        "op suite planned"
    );

    let console = Console::new(planned.len() * options.threads.len(), options);
    let mut category = "";
    for bench in planned {
        if bench.category != category {
            category = bench.category;
            console.println(format!("\n{}\n", divider(category)));
        }

        for &threads in &options.threads {
            console.step(&format!("{} ILP={} {}", bench.label, bench.ilp, threads));
            let request = ExecutionRequest::new(&bench.benchmark, &(), threads);
            match repeat(options.warmup, options.repetitions, || request.execute()) {
                Ok(results) => {
                    let report = OpBenchmarkReport::new(bench, threads, &results);
                    console.println(report.to_string());
                    output.results.push(report);
                }
                Err(e) => {
                    tracing::warn!(label = bench.label, ilp = bench.ilp, %threads, error = %e, "benchmark failed");
                    output.skip(bench.label, e.to_string());
                }
            }
            console.inc();
        }
    }

    for skipped in &output.skipped {
        console.println(skipped.to_string());
    }
    console.finish();
    output
}
