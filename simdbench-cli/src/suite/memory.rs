//! Memory bandwidth suite.

use super::{Console, SuiteOptions, SuiteOutput, divider, repeat};
use simdbench_catalog::{MemBenchmark, MemParams, mem_benchmarks};
use simdbench_core::{ExecutionRequest, ThreadCounts};
use simdbench_report::{CpuInfo, MemBenchmarkReport};

/// Buffer sizes and alignments to sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySweep {
    /// Per-thread buffer sizes in bytes
    pub sizes: Vec<usize>,
    /// Buffer alignments in bytes
    pub alignments: Vec<usize>,
}

impl MemorySweep {
    /// (size, alignment, threads) combinations, dropping any that would
    /// allocate more than twice the largest size in total
    fn combinations(&self, threads: &[ThreadCounts]) -> Vec<(MemParams, ThreadCounts)> {
        let budget = self.sizes.iter().copied().max().unwrap_or(0).saturating_mul(2);
        let mut combos = Vec::new();
        for &size in &self.sizes {
            for &alignment in &self.alignments {
                for &t in threads {
                    if t.total().saturating_mul(size) <= budget {
                        combos.push((MemParams::new(size, alignment), t));
                    }
                }
            }
        }
        combos
    }
}

/// Run every selected memory benchmark over the sweep.
///
/// Parameter combinations the catalog rejects are skipped with the
/// validation message; a divider is printed whenever the label changes.
pub fn run_memory_suite(
    cpu: &CpuInfo,
    options: &SuiteOptions,
    sweep: &MemorySweep,
) -> SuiteOutput<MemBenchmarkReport> {
    let mut output = SuiteOutput::default();

    let mut combos = sweep.combinations(&options.threads);
    combos.retain(|(params, _)| match params.validate() {
        Ok(()) => true,
        Err(e) => {
            output.skip(&format!("{} bytes @{}", params.size, params.alignment), e.to_string());
            false
        }
    });

    let mut planned: Vec<&'static MemBenchmark> = Vec::new();
    for bench in mem_benchmarks() {
        if !options.selects(&[bench.label, bench.op_type]) {
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
        combinations = combos.len(),
        "memory suite planned"
    );

    let console = Console::new(planned.len() * combos.len(), options);
    let mut label = "";
    for bench in planned {
        if bench.label != label {
            label = bench.label;
            console.println(format!("\n{}\n", divider(label)));
        }

        for (params, threads) in &combos {
            console.step(&format!(
                "{} ILP={} {}@{} {}",
                bench.label, bench.ilp, params.size, params.alignment, threads
            ));
            let request = ExecutionRequest::new(&bench.benchmark, params, *threads);
            match repeat(options.warmup, options.repetitions, || request.execute()) {
                Ok(results) => {
                    let report = MemBenchmarkReport::new(bench, *params, *threads, &results);
                    console.println(report.to_string());
                    output.results.push(report);
                }
                Err(e) => {
                    tracing::warn!(
                        label = bench.label,
                        ilp = bench.ilp,
                        size = params.size,
                        alignment = params.alignment,
                        %threads,
                        error = %e,
                        "benchmark failed"
                    );
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

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use simdbench_core::BASELINE_FEATURE;

    #[test]
    fn test_combinations_respect_budget() {
        let sweep = MemorySweep {
            sizes: vec![4096, 8192],
            alignments: vec![64],
        };
        let threads = [ThreadCounts::new(1, 0), ThreadCounts::new(2, 1)];
        let combos = sweep.combinations(&threads);

        // 3 threads x 4096 and 3 x 8192 both exceed 2 x 8192
        assert_eq!(combos.len(), 2);
        assert!(combos.iter().all(|(_, t)| t.total() == 1));
    }

    #[test]
    fn test_combinations_with_huge_sizes() {
        let sweep = MemorySweep {
            sizes: vec![usize::MAX / 4],
            alignments: vec![64],
        };
        let threads = [ThreadCounts::new(1, 0), ThreadCounts::new(8, 0)];
        let combos = sweep.combinations(&threads);

        // 8 x size would wrap below the budget without saturation
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].1, ThreadCounts::new(1, 0));
    }

    #[test]
    fn test_single_size_suite() {
        let cpu = CpuInfo {
            cpu_p_cores: 1,
            cpu_e_cores: 0,
            vector_length: 16,
            features: vec![BASELINE_FEATURE.to_string()],
        };
        let label = mem_benchmarks().next().unwrap().label;
        let options = SuiteOptions {
            warmup: 0,
            repetitions: 1,
            threads: vec![ThreadCounts::new(1, 0)],
            filter: Some(Regex::new(&format!("^{}$", regex::escape(label))).unwrap()),
            echo: false,
            progress: false,
        };
        let sweep = MemorySweep {
            sizes: vec![4096],
            alignments: vec![64],
        };
        let output = run_memory_suite(&cpu, &options, &sweep);

        let variants = mem_benchmarks().filter(|b| b.label == label).count();
        assert_eq!(output.results.len(), variants);
        assert!(output.skipped.is_empty());
        assert!(output.results.iter().all(|r| r.mean_gbps > 0.0));
    }

    #[test]
    fn test_invalid_alignment_skipped() {
        let cpu = CpuInfo {
            cpu_p_cores: 1,
            cpu_e_cores: 0,
            vector_length: 16,
            features: vec![BASELINE_FEATURE.to_string()],
        };
        let options = SuiteOptions {
            warmup: 0,
            repetitions: 1,
            threads: vec![ThreadCounts::new(1, 0)],
            filter: Some(Regex::new("^$").unwrap()),
            echo: false,
            progress: false,
        };
        let sweep = MemorySweep {
            sizes: vec![4096],
            alignments: vec![48],
        };
        let output = run_memory_suite(&cpu, &options, &sweep);

        assert!(output.results.is_empty());
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].label, "4096 bytes @48");
    }
}
