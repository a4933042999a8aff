//! Thread combinations, memory buffer sizes and section dividers.

use simdbench_core::ThreadCounts;
use simdbench_report::CpuInfo;

/// Width of a section divider line
const DIVIDER_WIDTH: usize = 52;

/// Thread splits to sweep on `cpu`.
///
/// Multi-core: 1..=all cores high-priority threads, then 1..=E-cores
/// low-priority threads. Single-core: one high, then one low.
pub fn thread_combinations(cpu: &CpuInfo, multi_core: bool) -> Vec<ThreadCounts> {
    if !multi_core {
        return vec![ThreadCounts::new(1, 0), ThreadCounts::new(0, 1)];
    }

    let high = (1..=cpu.cpu_cores()).map(|n| ThreadCounts::new(n, 0));
    let low = (1..=cpu.cpu_e_cores).map(|n| ThreadCounts::new(0, n));
    high.chain(low).collect()
}

/// Buffer sizes for the memory sweep.
///
/// Each of the `multiplicative` rounds emits `step * (1..=linear)` and then
/// grows the step by `linear * 2`, starting from `initial`. Sizes above `max`
/// are dropped. Generation stops at the first size above `max` or beyond
/// `usize::MAX`, since every later size is larger still.
pub fn generate_test_sizes(
    initial: usize,
    linear: usize,
    multiplicative: usize,
    max: Option<usize>,
) -> Vec<usize> {
    let max = max.unwrap_or(usize::MAX);
    let mut sizes = Vec::new();
    let mut step = initial;
    for _ in 0..multiplicative {
        for i in 1..=linear {
            match i.checked_mul(step) {
                Some(size) if size <= max => sizes.push(size),
                _ => return sizes,
            }
        }
        step = match linear.checked_mul(2).and_then(|f| step.checked_mul(f)) {
            Some(next) => next,
            None => return sizes,
        };
    }
    sizes
}

/// `== title ====...` padded to a fixed width
pub fn divider(title: &str) -> String {
    format!("{:=<width$}", format!("== {title} "), width = DIVIDER_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(p: usize, e: usize) -> CpuInfo {
        CpuInfo {
            cpu_p_cores: p,
            cpu_e_cores: e,
            vector_length: 16,
            features: Vec::new(),
        }
    }

    #[test]
    fn test_multi_core_combinations() {
        let combos = thread_combinations(&cpu(2, 2), true);
        let shown: Vec<String> = combos.iter().map(ToString::to_string).collect();
        assert_eq!(
            shown,
            vec!["1H+0L", "2H+0L", "3H+0L", "4H+0L", "0H+1L", "0H+2L"]
        );
    }

    #[test]
    fn test_multi_core_without_e_cores() {
        let combos = thread_combinations(&cpu(3, 0), true);
        assert_eq!(combos.len(), 3);
        assert!(combos.iter().all(|t| t.low == 0));
    }

    #[test]
    fn test_single_core_combinations() {
        let combos = thread_combinations(&cpu(8, 4), false);
        assert_eq!(combos, vec![ThreadCounts::new(1, 0), ThreadCounts::new(0, 1)]);
    }

    #[test]
    fn test_generate_test_sizes() {
        let sizes = generate_test_sizes(4096, 4, 5, None);
        assert_eq!(sizes.len(), 20);
        assert_eq!(&sizes[..5], &[4096, 8192, 12288, 16384, 32768]);
        assert_eq!(sizes.last(), Some(&(64 << 20)));
    }

    #[test]
    fn test_generate_test_sizes_with_max() {
        let sizes = generate_test_sizes(4096, 4, 5, Some(65536));
        assert_eq!(sizes, vec![4096, 8192, 12288, 16384, 32768, 65536]);
        assert!(generate_test_sizes(4096, 4, 5, Some(1024)).is_empty());
    }

    #[test]
    fn test_generate_test_sizes_many_steps() {
        let capped = generate_test_sizes(4096, 4, 20, Some(64 << 20));
        assert_eq!(capped, generate_test_sizes(4096, 4, 5, None));

        // Without a cap generation ends before the sizes overflow
        let uncapped = generate_test_sizes(4096, 4, 40, None);
        assert!(uncapped.windows(2).all(|w| w[0] < w[1]));
        assert!(uncapped.len() < 4 * 40);
    }

    #[test]
    fn test_divider() {
        let line = divider("NEON fused multiply-add");
        assert_eq!(line.len(), DIVIDER_WIDTH);
        assert!(line.starts_with("== NEON fused multiply-add ="));
        assert!(line.ends_with('='));

        let long = "x".repeat(60);
        assert_eq!(divider(&long), format!("== {long} "));
    }
}
