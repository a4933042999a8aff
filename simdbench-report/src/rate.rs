//! Rate Computation

use simdbench_core::ExecutionResult;

/// Scale for GOP/s and GB/s
pub const GIGA: f64 = 1e9;

/// `total_operations / elapsed_seconds / scale`, or 0 for an empty window
pub fn rate_per_second(result: &ExecutionResult, scale: f64) -> f64 {
    if result.elapsed_seconds > 0.0 {
        result.total_operations / result.elapsed_seconds / scale
    } else {
        0.0
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Binary byte count, e.g. `4 KiB` or `1.5 MiB`
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value.fract() == 0.0 {
        format!("{} {}", value as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
