//! Report Data Structures

use crate::rate::{GIGA, format_bytes, mean, rate_per_second};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simdbench_catalog::{MemBenchmark, MemParams, OpBenchmark};
use simdbench_core::{ExecutionResult, ThreadCounts};
use std::fmt;

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub cpu: CpuInfo,
    pub ops: Vec<OpBenchmarkReport>,
    pub memory: Vec<MemBenchmarkReport>,
    pub skipped: Vec<SkippedBenchmark>,
}

impl Report {
    /// Empty report for a host
    pub fn new(meta: ReportMeta, cpu: CpuInfo) -> Self {
        Self {
            meta,
            cpu,
            ops: Vec::new(),
            memory: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub system: SystemInfo,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

/// Core counts and vector capabilities of the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    /// Performance cores
    pub cpu_p_cores: usize,
    /// Efficiency cores
    pub cpu_e_cores: usize,
    /// Vector register width in bytes
    pub vector_length: usize,
    /// Supported features among those the catalog requires
    pub features: Vec<String>,
}

impl CpuInfo {
    /// All cores
    pub fn cpu_cores(&self) -> usize {
        self.cpu_p_cores + self.cpu_e_cores
    }

    /// Whether a catalog feature was detected
    pub fn supports(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

impl fmt::Display for CpuInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "P-cores       {}", self.cpu_p_cores)?;
        writeln!(f, "E-cores       {}", self.cpu_e_cores)?;
        writeln!(f, "Vector length {} bytes", self.vector_length)?;
        write!(f, "Features      {}", self.features.join(", "))
    }
}

/// Results of one arithmetic benchmark at one thread split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpBenchmarkReport {
    pub category: String,
    pub label: String,
    pub feature: String,
    pub encoding: String,
    pub opcode: String,
    pub output_data: String,
    pub output_elements: usize,
    pub output_vectors: usize,
    pub input_data: String,
    pub input_elements: usize,
    pub input_vectors: usize,
    pub ops_per_instruction: usize,
    pub ilp: usize,
    /// High-priority threads
    pub threads_h: usize,
    /// Low-priority threads
    pub threads_l: usize,
    /// GOP/s of every measured repetition
    pub gops: Vec<f64>,
    pub mean_gops: f64,
    /// Mean timed-window length in seconds
    pub mean_elapsed: f64,
}

impl OpBenchmarkReport {
    /// Combine catalog metadata with the measured repetitions
    pub fn new(bench: &OpBenchmark, threads: ThreadCounts, results: &[ExecutionResult]) -> Self {
        let gops: Vec<f64> = results.iter().map(|r| rate_per_second(r, GIGA)).collect();
        let elapsed: Vec<f64> = results.iter().map(|r| r.elapsed_seconds).collect();
        Self {
            category: bench.category.to_string(),
            label: bench.label.to_string(),
            feature: bench.feature.to_string(),
            encoding: bench.encoding.to_string(),
            opcode: bench.opcode.to_string(),
            output_data: bench.output_data.to_string(),
            output_elements: bench.output_elements,
            output_vectors: bench.output_vectors,
            input_data: bench.input_data.to_string(),
            input_elements: bench.input_elements,
            input_vectors: bench.input_vectors,
            ops_per_instruction: bench.ops_per_instruction,
            ilp: bench.ilp,
            threads_h: threads.high,
            threads_l: threads.low,
            mean_gops: mean(&gops),
            gops,
            mean_elapsed: mean(&elapsed),
        }
    }

    /// The thread split this result was measured with
    pub fn threads(&self) -> ThreadCounts {
        ThreadCounts::new(self.threads_h, self.threads_l)
    }
}

impl fmt::Display for OpBenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<34} | ILP={:<2} | VLx{:<2} | threads {:<6} | {:>9.2} GOP/s ({:.2} ms)",
            self.label,
            self.ilp,
            self.output_vectors * self.ilp,
            self.threads().to_string(),
            self.mean_gops,
            self.mean_elapsed * 1000.0
        )
    }
}

/// Results of one memory benchmark at one size, alignment and thread split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemBenchmarkReport {
    pub label: String,
    pub encoding: String,
    pub feature: String,
    pub op_type: String,
    pub n_vectors: usize,
    /// Element bit width, `None` if untyped
    pub data_size: Option<usize>,
    pub ilp: usize,
    /// Buffer size per thread in bytes
    pub size: usize,
    /// Buffer alignment in bytes
    pub alignment: usize,
    pub threads_h: usize,
    pub threads_l: usize,
    /// GB/s of every measured repetition
    pub gbps: Vec<f64>,
    pub mean_gbps: f64,
    /// Mean timed-window length in seconds
    pub mean_elapsed: f64,
}

impl MemBenchmarkReport {
    /// Combine catalog metadata with the measured repetitions
    pub fn new(
        bench: &MemBenchmark,
        params: MemParams,
        threads: ThreadCounts,
        results: &[ExecutionResult],
    ) -> Self {
        let gbps: Vec<f64> = results.iter().map(|r| rate_per_second(r, GIGA)).collect();
        let elapsed: Vec<f64> = results.iter().map(|r| r.elapsed_seconds).collect();
        Self {
            label: bench.label.to_string(),
            encoding: bench.encoding.to_string(),
            feature: bench.feature.to_string(),
            op_type: bench.op_type.to_string(),
            n_vectors: bench.n_vectors,
            data_size: bench.data_size,
            ilp: bench.ilp,
            size: params.size,
            alignment: params.alignment,
            threads_h: threads.high,
            threads_l: threads.low,
            mean_gbps: mean(&gbps),
            gbps,
            mean_elapsed: mean(&elapsed),
        }
    }

    /// The thread split this result was measured with
    pub fn threads(&self) -> ThreadCounts {
        ThreadCounts::new(self.threads_h, self.threads_l)
    }
}

impl fmt::Display for MemBenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<28} | ILP={:<2} | VLx{:<2} | {:>9} @{:<4} | threads {:<6} | {:>9.2} GB/s ({:.2} ms)",
            self.label,
            self.ilp,
            self.n_vectors * self.ilp,
            format_bytes(self.size),
            self.alignment,
            self.threads().to_string(),
            self.mean_gbps,
            self.mean_elapsed * 1000.0
        )
    }
}

/// A benchmark that was not run, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkippedBenchmark {
    pub label: String,
    pub reason: String,
}

impl fmt::Display for SkippedBenchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "* skipping test '{}' due to {}", self.label, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simdbench_catalog::{mem_benchmarks, op_benchmarks};

    fn result(elapsed_seconds: f64, total_operations: f64) -> ExecutionResult {
        ExecutionResult {
            elapsed_seconds,
            total_operations,
            elapsed_ticks: 0,
        }
    }

    #[test]
    fn test_op_report_rates() {
        let bench = op_benchmarks().next().unwrap();
        let results = [result(0.5, 1e9), result(0.25, 1e9)];
        let report = OpBenchmarkReport::new(bench, ThreadCounts::new(2, 1), &results);

        assert_eq!(report.gops, vec![2.0, 4.0]);
        assert_eq!(report.mean_gops, 3.0);
        assert_eq!(report.mean_elapsed, 0.375);
        assert_eq!(report.threads_h, 2);
        assert_eq!(report.threads_l, 1);
        assert_eq!(report.label, bench.label);

        let line = report.to_string();
        assert!(line.contains("2H+1L"), "{line}");
        assert!(line.contains("3.00 GOP/s"), "{line}");
        assert!(line.contains("375.00 ms"), "{line}");
    }

    #[test]
    fn test_mem_report_rates() {
        let bench = mem_benchmarks().next().unwrap();
        let params = MemParams::new(4096, 64);
        let report =
            MemBenchmarkReport::new(bench, params, ThreadCounts::new(0, 1), &[result(1.0, 5e9)]);

        assert_eq!(report.mean_gbps, 5.0);
        assert_eq!(report.size, 4096);
        assert_eq!(report.data_size, None);

        let line = report.to_string();
        assert!(line.contains("4 KiB"), "{line}");
        assert!(line.contains("@64"), "{line}");
        assert!(line.contains("0H+1L"), "{line}");
    }

    #[test]
    fn test_cpu_info() {
        let cpu = CpuInfo {
            cpu_p_cores: 6,
            cpu_e_cores: 2,
            vector_length: 32,
            features: vec!["baseline".to_string(), "fma".to_string()],
        };
        assert_eq!(cpu.cpu_cores(), 8);
        assert!(cpu.supports("fma"));
        assert!(!cpu.supports("avx2"));
        assert!(cpu.to_string().contains("Features      baseline, fma"));
    }

    #[test]
    fn test_skipped_message() {
        let skipped = SkippedBenchmark {
            label: "VFMADD (8 x f32, ymm)".to_string(),
            reason: "missing feature fma".to_string(),
        };
        assert_eq!(
            skipped.to_string(),
            "* skipping test 'VFMADD (8 x f32, ymm)' due to missing feature fma"
        );
    }
}
