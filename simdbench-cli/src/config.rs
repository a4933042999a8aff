//! Configuration loading from simdbench.toml
//!
//! SimdBench configuration can be specified in a `simdbench.toml` file in the
//! project root. The file is discovered by walking up from the current
//! directory; command-line flags override whatever it sets.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up by [`SimdConfig::discover`]
pub const CONFIG_FILE: &str = "simdbench.toml";

/// SimdBench configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SimdConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Memory sweep configuration
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// A benchmark suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suite {
    /// Arithmetic throughput
    Ops,
    /// Memory bandwidth
    Memory,
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Suites executed by `run`, in order
    #[serde(default = "default_suites")]
    pub suites: Vec<Suite>,
    /// Sweep every core count instead of a single thread per class
    #[serde(default = "default_multi_core")]
    pub multi_core: bool,
    /// Discarded executions before each measured series
    #[serde(default = "default_warmup")]
    pub warmup: usize,
    /// Measured executions per operation benchmark
    #[serde(default = "default_op_repetitions")]
    pub op_repetitions: usize,
    /// Measured executions per memory benchmark
    #[serde(default = "default_mem_repetitions")]
    pub mem_repetitions: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            suites: default_suites(),
            multi_core: default_multi_core(),
            warmup: default_warmup(),
            op_repetitions: default_op_repetitions(),
            mem_repetitions: default_mem_repetitions(),
        }
    }
}

fn default_suites() -> Vec<Suite> {
    vec![Suite::Ops, Suite::Memory]
}
fn default_multi_core() -> bool {
    true
}
fn default_warmup() -> usize {
    2
}
fn default_op_repetitions() -> usize {
    20
}
fn default_mem_repetitions() -> usize {
    10
}

/// Memory sweep configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// First buffer size in bytes
    #[serde(default = "default_initial_size")]
    pub initial_size: usize,
    /// Sizes generated per multiplicative step
    #[serde(default = "default_linear_steps")]
    pub linear_steps: usize,
    /// Number of multiplicative steps
    #[serde(default = "default_multiplicative_steps")]
    pub multiplicative_steps: usize,
    /// Largest buffer size kept (None = keep all generated sizes)
    #[serde(default)]
    pub max_size: Option<usize>,
    /// Buffer alignments in bytes
    #[serde(default = "default_alignments")]
    pub alignments: Vec<usize>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            initial_size: default_initial_size(),
            linear_steps: default_linear_steps(),
            multiplicative_steps: default_multiplicative_steps(),
            max_size: None,
            alignments: default_alignments(),
        }
    }
}

fn default_initial_size() -> usize {
    4096
}
fn default_linear_steps() -> usize {
    4
}
fn default_multiplicative_steps() -> usize {
    5
}
fn default_alignments() -> Vec<usize> {
    vec![16, 32, 64, 128, 256]
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the JSON result files
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Write `cpu_info.json`, `op_benchmarks.json` and `mem_benchmarks.json`
    #[serde(default = "default_write_json")]
    pub write_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            format: default_format(),
            write_json: default_write_json(),
        }
    }
}

fn default_output_dir() -> String {
    "target/simdbench".to_string()
}
fn default_format() -> String {
    "human".to_string()
}
fn default_write_json() -> bool {
    true
}

impl SimdConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` looking for [`CONFIG_FILE`]
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring unreadable config");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# SimdBench Configuration

[runner]
# Suites executed by `simdbench run`, in order
suites = ["ops", "memory"]
# Sweep every core count (false = one high and one low priority thread)
multi_core = true
# Discarded executions before each measured series
warmup = 2
# Measured executions per benchmark
op_repetitions = 20
mem_repetitions = 10

[memory]
# Buffer sizes: initial_size * (1..=linear_steps), then the step grows by
# linear_steps * 2, multiplicative_steps times (4 KiB .. 64 MiB by default)
initial_size = 4096
linear_steps = 4
multiplicative_steps = 5
# Largest buffer size (uncomment to enable)
# max_size = 16777216
# Buffer alignments in bytes
alignments = [16, 32, 64, 128, 256]

[output]
# Directory for cpu_info.json, op_benchmarks.json and mem_benchmarks.json
directory = "target/simdbench"
# Default output format: human, json
format = "human"
# Write the JSON result files
write_json = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimdConfig::default();
        assert_eq!(config.runner.suites, vec![Suite::Ops, Suite::Memory]);
        assert!(config.runner.multi_core);
        assert_eq!(config.runner.warmup, 2);
        assert_eq!(config.runner.op_repetitions, 20);
        assert_eq!(config.runner.mem_repetitions, 10);
        assert_eq!(config.memory.alignments, vec![16, 32, 64, 128, 256]);
        assert_eq!(config.memory.max_size, None);
        assert!(config.output.write_json);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let parsed: SimdConfig = toml::from_str(&SimdConfig::default_toml()).unwrap();
        assert_eq!(parsed, SimdConfig::default());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [runner]
            suites = ["memory"]
            multi_core = false

            [memory]
            max_size = 65536
        "#;

        let config: SimdConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.suites, vec![Suite::Memory]);
        assert!(!config.runner.multi_core);
        assert_eq!(config.memory.max_size, Some(65536));
        // Defaults should still apply
        assert_eq!(config.runner.op_repetitions, 20);
        assert_eq!(config.memory.initial_size, 4096);
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_unknown_suite_rejected() {
        let result = toml::from_str::<SimdConfig>("[runner]\nsuites = [\"gpu\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_walks_up() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            root.path().join(CONFIG_FILE),
            "[runner]\nwarmup = 0\n[output]\nwrite_json = false\n",
        )
        .unwrap();

        let config = SimdConfig::discover_from(&nested).unwrap();
        assert_eq!(config.runner.warmup, 0);
        assert!(!config.output.write_json);
    }
}
