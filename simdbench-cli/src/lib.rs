#![warn(missing_docs)]
//! SimdBench CLI Library
//!
//! Command-line driver for the operation and memory suites. Use
//! `simdbench::run()` (or `simdbench_cli::run()`) in a main function to get
//! the full CLI: host detection, catalog listing, both suites and JSON
//! result files.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     simdbench_cli::run()
//! }
//! ```

mod config;
mod metadata;
mod suite;

pub use config::*;
pub use metadata::{build_report_meta, catalog_features, detect_cpu_info};
pub use suite::{
    MemorySweep, SuiteOptions, SuiteOutput, divider, generate_test_sizes, repeat,
    run_memory_suite, run_op_suite, thread_combinations,
};

use clap::{Parser, Subcommand};
use regex::Regex;
use simdbench_catalog::{mem_benchmarks, op_benchmarks};
use simdbench_core::ThreadCounts;
use simdbench_report::{CpuInfo, OutputFormat, Report, generate_json_report, write_json};
use std::path::PathBuf;
use std::time::Instant;

/// SimdBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "simdbench")]
#[command(author, version, about = "SimdBench - vector arithmetic and memory throughput")]
pub struct Cli {
    /// Optional subcommand; defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Only run benchmarks whose label or category matches this regex
    #[arg(long, global = true)]
    pub filter: Option<String>,

    /// Thread split to run with, e.g. 4H+2L (repeatable; replaces the sweep)
    #[arg(long = "threads", global = true)]
    pub threads: Vec<ThreadCounts>,

    /// Measured executions per benchmark (overrides both suites' defaults)
    #[arg(long, global = true)]
    pub repetitions: Option<usize>,

    /// Discarded executions before each measured series
    #[arg(long, global = true)]
    pub warmup: Option<usize>,

    /// Output format: human, json
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Directory for the JSON result files
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Do not write JSON result files
    #[arg(long, global = true)]
    pub no_json: bool,

    /// One high and one low priority thread instead of sweeping core counts
    #[arg(long, global = true)]
    pub single_core: bool,

    /// Hide the progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Show core counts, vector length and supported features
    Info,
    /// List catalog entries
    List,
    /// Run the arithmetic throughput suite
    Ops,
    /// Run the memory bandwidth suite
    Memory,
    /// Run the configured suites (default)
    Run,
    /// Print a default simdbench.toml
    Init,
}

/// Run the SimdBench CLI with the process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the SimdBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    let config = SimdConfig::discover().unwrap_or_default();
    let settings = Settings::resolve(&cli, &config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Init => print!("{}", SimdConfig::default_toml()),
        Commands::Info => {
            let cpu = detect_cpu_info();
            show_cpu(&settings, &cpu)?;
        }
        Commands::List => list_benchmarks(&settings),
        Commands::Ops => run_suites(&settings, &config, &[Suite::Ops])?,
        Commands::Memory => run_suites(&settings, &config, &[Suite::Memory])?,
        Commands::Run => run_suites(&settings, &config, &config.runner.suites)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "simdbench=debug"
    } else {
        "simdbench=info"
    };
    // A second call in the same process keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Config file values with CLI overrides applied
#[derive(Debug)]
struct Settings {
    format: OutputFormat,
    filter: Option<Regex>,
    threads: Vec<ThreadCounts>,
    warmup: usize,
    op_repetitions: usize,
    mem_repetitions: usize,
    multi_core: bool,
    output_dir: PathBuf,
    write_json: bool,
    progress: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: &SimdConfig) -> anyhow::Result<Self> {
        let format_str = cli.format.as_deref().unwrap_or(&config.output.format);
        let format: OutputFormat = format_str.parse().map_err(anyhow::Error::msg)?;

        let filter = cli
            .filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid --filter pattern: {}", e))?;

        Ok(Self {
            format,
            filter,
            threads: cli.threads.clone(),
            warmup: cli.warmup.unwrap_or(config.runner.warmup),
            op_repetitions: cli.repetitions.unwrap_or(config.runner.op_repetitions),
            mem_repetitions: cli.repetitions.unwrap_or(config.runner.mem_repetitions),
            multi_core: config.runner.multi_core && !cli.single_core,
            output_dir: cli
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output.directory)),
            write_json: config.output.write_json && !cli.no_json,
            progress: !cli.no_progress && format == OutputFormat::Human,
        })
    }

    fn suite_options(&self, repetitions: usize, threads: Vec<ThreadCounts>) -> SuiteOptions {
        SuiteOptions {
            warmup: self.warmup,
            repetitions,
            threads: if self.threads.is_empty() {
                threads
            } else {
                self.threads.clone()
            },
            filter: self.filter.clone(),
            echo: self.format == OutputFormat::Human,
            progress: self.progress,
        }
    }

    fn write<T: serde::Serialize + ?Sized>(&self, file: &str, value: &T) -> anyhow::Result<()> {
        if !self.write_json {
            return Ok(());
        }
        let path = write_json(&self.output_dir, file, value)?;
        tracing::info!(path = %path.display(), "results written");
        Ok(())
    }
}

fn show_cpu(settings: &Settings, cpu: &CpuInfo) -> anyhow::Result<()> {
    match settings.format {
        OutputFormat::Human => println!("-- CPU info\n{}\n", cpu),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(cpu)?),
    }
    settings.write("cpu_info.json", cpu)
}

fn list_benchmarks(settings: &Settings) {
    let cpu = detect_cpu_info();
    let selects = |names: &[&str]| match &settings.filter {
        Some(re) => names.iter().any(|name| re.is_match(name)),
        None => true,
    };
    let marker = |feature: &str| if cpu.supports(feature) { "" } else { " (unsupported)" };

    println!("SimdBench catalog:");
    let mut total = 0;

    let mut category = "";
    for bench in op_benchmarks().filter(|b| b.ilp == 1 && selects(&[b.label, b.category])) {
        if bench.category != category {
            category = bench.category;
            println!("├── ops: {}", category);
        }
        let variants = op_benchmarks().filter(|b| b.label == bench.label).count();
        println!(
            "│   ├── {} [{}] {} x ILP{}",
            bench.label,
            bench.feature,
            variants,
            marker(bench.feature)
        );
        total += variants;
    }

    println!("├── memory");
    for bench in mem_benchmarks().filter(|b| b.ilp == 1 && selects(&[b.label, b.op_type])) {
        let variants = mem_benchmarks().filter(|b| b.label == bench.label).count();
        println!(
            "│   ├── {} [{}] {} x ILP{}",
            bench.label,
            bench.op_type,
            variants,
            marker(bench.feature)
        );
        total += variants;
    }

    println!("{} benchmarks found.", total);
}

fn run_suites(settings: &Settings, config: &SimdConfig, suites: &[Suite]) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let cpu = detect_cpu_info();
    if settings.format == OutputFormat::Human {
        println!("-- CPU info\n{}\n", cpu);
    }
    settings.write("cpu_info.json", &cpu)?;

    let mut report = Report::new(build_report_meta(), cpu.clone());

    for suite in suites {
        match suite {
            Suite::Ops => {
                if settings.format == OutputFormat::Human {
                    println!("-- Vector operations");
                }
                let threads = thread_combinations(&cpu, settings.multi_core);
                let options = settings.suite_options(settings.op_repetitions, threads);
                let output = run_op_suite(&cpu, &options);
                settings.write("op_benchmarks.json", &output.results)?;
                report.ops.extend(output.results);
                report.skipped.extend(output.skipped);
            }
            Suite::Memory => {
                if settings.format == OutputFormat::Human {
                    println!("\n-- Memory benchmarks");
                }
                let threads = thread_combinations(&cpu, false);
                let options = settings.suite_options(settings.mem_repetitions, threads);
                let sweep = MemorySweep {
                    sizes: generate_test_sizes(
                        config.memory.initial_size,
                        config.memory.linear_steps,
                        config.memory.multiplicative_steps,
                        config.memory.max_size,
                    ),
                    alignments: config.memory.alignments.clone(),
                };
                let output = run_memory_suite(&cpu, &options, &sweep);
                settings.write("mem_benchmarks.json", &output.results)?;
                report.memory.extend(output.results);
                report.skipped.extend(output.skipped);
            }
        }
    }

    tracing::info!(
        ops = report.ops.len(),
        memory = report.memory.len(),
        skipped = report.skipped.len(),
        seconds = start_time.elapsed().as_secs_f64(),
        "suites complete"
    );

    if settings.format == OutputFormat::Json {
        println!("{}", generate_json_report(&report)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_run() {
        let cli = Cli::try_parse_from(["simdbench"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.threads.is_empty());
        assert!(!cli.no_json);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "simdbench",
            "memory",
            "--threads",
            "2H+1L",
            "--threads",
            "0,3",
            "--filter",
            "^LOAD",
            "--repetitions",
            "3",
            "--no-json",
            "--single-core",
        ])
        .unwrap();

        assert_eq!(cli.command, Some(Commands::Memory));
        assert_eq!(
            cli.threads,
            vec![ThreadCounts::new(2, 1), ThreadCounts::new(0, 3)]
        );
        assert_eq!(cli.filter.as_deref(), Some("^LOAD"));
        assert_eq!(cli.repetitions, Some(3));
        assert!(cli.no_json);
        assert!(cli.single_core);
    }

    #[test]
    fn test_parse_rejects_bad_threads() {
        assert!(Cli::try_parse_from(["simdbench", "--threads", "lots"]).is_err());
    }

    #[test]
    fn test_settings_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "simdbench",
            "--warmup",
            "0",
            "--format",
            "json",
            "--output-dir",
            "out",
        ])
        .unwrap();
        let settings = Settings::resolve(&cli, &SimdConfig::default()).unwrap();

        assert_eq!(settings.warmup, 0);
        assert_eq!(settings.op_repetitions, 20);
        assert_eq!(settings.mem_repetitions, 10);
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert!(!settings.progress);
        assert!(settings.multi_core);
    }

    #[test]
    fn test_settings_rejects_bad_filter() {
        let cli = Cli::try_parse_from(["simdbench", "--filter", "("]).unwrap();
        assert!(Settings::resolve(&cli, &SimdConfig::default()).is_err());
    }

    #[test]
    fn test_thread_override() {
        let cli = Cli::try_parse_from(["simdbench", "--threads", "3H"]).unwrap();
        let settings = Settings::resolve(&cli, &SimdConfig::default()).unwrap();
        let options = settings.suite_options(5, vec![ThreadCounts::new(1, 0)]);
        assert_eq!(options.threads, vec![ThreadCounts::new(3, 0)]);
        assert_eq!(options.repetitions, 5);
    }
}
