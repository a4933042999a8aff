//! Host Metadata Collection
//!
//! Collects the core topology and vector capabilities the suites are planned
//! from, plus the system information stamped on every report.
//!
//! ## Core topology
//!
//! - **Apple**: `hw.perflevel0.physicalcpu` (P-cores) and
//!   `hw.perflevel1.physicalcpu` (E-cores)
//! - **Linux hybrid**: `/sys/devices/cpu_core/cpus` and `/sys/devices/cpu_atom/cpus`
//! - **Elsewhere**: every available core counts as a P-core
//!
//! Linux-specific data (CPU model, memory) gracefully degrades on other
//! platforms, returning "Unknown" or 0 values.

use chrono::Utc;
use simdbench_catalog::{mem_benchmarks, op_benchmarks};
use simdbench_core::{feature_supported, sysctl_value, vector_length};
use simdbench_report::{CpuInfo, ReportMeta, SystemInfo};

/// Detect the host's core counts, vector length and catalog features
pub fn detect_cpu_info() -> CpuInfo {
    let (cpu_p_cores, cpu_e_cores) = core_topology();
    let features = catalog_features()
        .into_iter()
        .filter(|feature| feature_supported(feature))
        .map(str::to_string)
        .collect();

    CpuInfo {
        cpu_p_cores,
        cpu_e_cores,
        vector_length: vector_length(),
        features,
    }
}

/// Every feature name the catalog tables require, in table order
pub fn catalog_features() -> Vec<&'static str> {
    let mut features: Vec<&'static str> = Vec::new();
    let names = op_benchmarks()
        .map(|b| b.feature)
        .chain(mem_benchmarks().map(|b| b.feature));
    for name in names {
        if !features.contains(&name) {
            features.push(name);
        }
    }
    features
}

/// (P-cores, E-cores) of the host
fn core_topology() -> (usize, usize) {
    let p = sysctl_value("hw.perflevel0.physicalcpu");
    if p > 0 {
        let e = sysctl_value("hw.perflevel1.physicalcpu").max(0);
        return (p as usize, e as usize);
    }

    if let Some(p) = sysfs_cpu_count("cpu_core") {
        let e = sysfs_cpu_count("cpu_atom").unwrap_or(0);
        return (p, e);
    }

    (num_cpus() as usize, 0)
}

#[cfg(target_os = "linux")]
fn sysfs_cpu_count(pmu: &str) -> Option<usize> {
    let list = std::fs::read_to_string(format!("/sys/devices/{pmu}/cpus")).ok()?;
    let count = count_cpu_list(&list)?;
    (count > 0).then_some(count)
}

#[cfg(not(target_os = "linux"))]
fn sysfs_cpu_count(_pmu: &str) -> Option<usize> {
    None
}

/// Count the CPUs in a kernel cpu list such as `0-7,16,18-19`
fn count_cpu_list(list: &str) -> Option<usize> {
    let list = list.trim();
    if list.is_empty() {
        return Some(0);
    }

    let mut count = 0;
    for range in list.split(',') {
        count += match range.split_once('-') {
            Some((first, last)) => {
                let first: usize = first.trim().parse().ok()?;
                let last: usize = last.trim().parse().ok()?;
                last.checked_sub(first)? + 1
            }
            None => {
                range.trim().parse::<usize>().ok()?;
                1
            }
        };
    }
    Some(count)
}

/// Build report metadata including system info
pub fn build_report_meta() -> ReportMeta {
    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
        memory_gb: get_memory_gb().unwrap_or(0.0),
    };

    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        system,
    }
}

/// Get CPU model name from /proc/cpuinfo (Linux) or `machdep.cpu.brand_string` (Apple)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name") || l.starts_with("Model"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(target_vendor = "apple")]
    {
        std::process::Command::new("sysctl")
            .args(["-n", "machdep.cpu.brand_string"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
    #[cfg(not(any(target_os = "linux", target_vendor = "apple")))]
    {
        None
    }
}

/// Get number of available CPU cores
fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Get total system memory in GB
fn get_memory_gb() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("MemTotal"))
                    .and_then(|l| {
                        l.split_whitespace()
                            .nth(1)
                            .and_then(|s| s.parse::<u64>().ok())
                    })
                    .map(|kb| kb as f64 / 1024.0 / 1024.0)
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        let bytes = sysctl_value("hw.memsize");
        (bytes > 0).then(|| bytes as f64 / 1024.0 / 1024.0 / 1024.0)
    }
}
