//! JSON Output

use crate::report::Report;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure writing a report file
#[derive(Debug, Error)]
pub enum ReportError {
    /// Output directory or file could not be written
    #[error("I/O error writing {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Generate a prettified JSON report.
///
/// Serializes the benchmark report into machine-readable JSON format.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write `value` as pretty JSON to `dir/file`, creating `dir` if needed.
///
/// Returns the path written.
pub fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    file: &str,
    value: &T,
) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file);
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, json).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CpuInfo, ReportMeta, SystemInfo};

    fn sample_report() -> Report {
        let meta = ReportMeta {
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
            system: SystemInfo {
                os: "linux".to_string(),
                arch: "x86_64".to_string(),
                cpu: "Test CPU".to_string(),
                cpu_cores: 8,
                memory_gb: 16.0,
            },
        };
        let cpu = CpuInfo {
            cpu_p_cores: 4,
            cpu_e_cores: 4,
            vector_length: 16,
            features: vec!["avx2".to_string()],
        };
        Report::new(meta, cpu)
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cpu"]["cpu_p_cores"], 4);
        assert_eq!(value["meta"]["system"]["cpu"], "Test CPU");
        assert!(value["ops"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_json_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let report = sample_report();

        let path = write_json(&dir, "cpu_info.json", &report.cpu).unwrap();
        assert_eq!(path, dir.join("cpu_info.json"));

        let back: CpuInfo =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report.cpu);
    }

    #[test]
    fn test_write_json_into_file_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let err = write_json(&blocker, "a.json", &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
