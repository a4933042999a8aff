#![warn(missing_docs)]
//! SimdBench Report - Results and Output
//!
//! Turns raw execution results into the records simdbench publishes:
//! - Rate computation (GOP/s, GB/s) and means over repetitions
//! - Report data model mirroring the catalog fields
//! - JSON (machine-readable) output files

mod json;
mod rate;
mod report;

pub use json::{ReportError, generate_json_report, write_json};
pub use rate::{GIGA, format_bytes, mean, rate_per_second};
pub use report::{
    CpuInfo, MemBenchmarkReport, OpBenchmarkReport, Report, ReportMeta, SkippedBenchmark,
    SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with full schema
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse(), Ok(OutputFormat::Json));
        assert_eq!("JSON".parse(), Ok(OutputFormat::Json));
        assert_eq!("text".parse(), Ok(OutputFormat::Human));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
