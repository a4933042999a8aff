//! Arithmetic throughput benchmarks.
//!
//! Every family is instantiated at ILP 1 through 8. A kernel runs
//! `N_ITERATIONS / ILP` loop iterations, so each entry issues roughly the
//! same number of instructions regardless of its ILP.

use crate::kernels::portable;
use simdbench_core::{BASELINE_FEATURE, BenchmarkFns, SetupError, feature_supported};

/// Vector instructions per kernel call at ILP 1
pub const N_ITERATIONS: usize = 8_000_000;

/// Number of ILP variants per family
pub const OP_ILP_VARIANTS: usize = 8;

/// Per-worker state of an arithmetic benchmark
#[derive(Debug, Default)]
pub struct OpHandle {
    sink: f64,
}

impl OpHandle {
    /// Reduced accumulator value of the last run
    pub fn sink(&self) -> f64 {
        self.sink
    }
}

/// Catalog record for one arithmetic benchmark
#[derive(Debug, Clone, Copy)]
pub struct OpBenchmark {
    /// Setup/run/teardown entry points
    pub benchmark: BenchmarkFns<(), OpHandle>,
    /// Operation class, used to group results
    pub category: &'static str,
    /// Descriptive label
    pub label: &'static str,
    /// Required CPU feature
    pub feature: &'static str,
    /// Register class the instruction operates on
    pub encoding: &'static str,
    /// Mnemonic(s) of the measured instruction
    pub opcode: &'static str,
    /// Output element type
    pub output_data: &'static str,
    /// Elements written per instruction
    pub output_elements: usize,
    /// Vector registers written per instruction
    pub output_vectors: usize,
    /// Input element type
    pub input_data: &'static str,
    /// Elements read per instruction, excluding the accumulator
    pub input_elements: usize,
    /// Vector registers read per instruction, excluding the accumulator
    pub input_vectors: usize,
    /// Arithmetic operations per instruction (a multiply-add counts as two)
    pub ops_per_instruction: usize,
    /// Independent instructions per loop iteration
    pub ilp: usize,
}

impl OpBenchmark {
    /// Operations reported by one `run` on one worker
    pub fn ops_per_run(&self) -> f64 {
        (self.ops_per_instruction * self.ilp * (N_ITERATIONS / self.ilp)) as f64
    }
}

fn require(features: &[&str]) -> Result<OpHandle, SetupError> {
    match features.iter().find(|f| !feature_supported(f)) {
        Some(missing) => {
            tracing::debug!(feature = %missing, "required feature not supported");
            Err(SetupError::UnsupportedFeature(missing.to_string()))
        }
        None => Ok(OpHandle::default()),
    }
}

fn setup_baseline(_: &()) -> Result<OpHandle, SetupError> {
    require(&[BASELINE_FEATURE])
}

fn teardown(_: OpHandle) {}

#[inline(always)]
fn finish(handle: &mut OpHandle, sink: f64, ops_per_instruction: usize, ilp: usize) -> f64 {
    handle.sink = sink;
    (ops_per_instruction * ilp * (N_ITERATIONS / ilp)) as f64
}

fn run_f32x4<const ILP: usize>(handle: &mut OpHandle) -> f64 {
    let sink = portable::mul_add::<f32, 4, ILP>(N_ITERATIONS / ILP);
    finish(handle, sink, 8, ILP)
}

fn run_f64x2<const ILP: usize>(handle: &mut OpHandle) -> f64 {
    let sink = portable::mul_add::<f64, 2, ILP>(N_ITERATIONS / ILP);
    finish(handle, sink, 4, ILP)
}

fn run_i32x4<const ILP: usize>(handle: &mut OpHandle) -> f64 {
    let sink = portable::mul_add::<i32, 4, ILP>(N_ITERATIONS / ILP);
    finish(handle, sink, 8, ILP)
}

macro_rules! op_family {
    (
        $run:ident, $setup:ident,
        category: $category:literal,
        label: $label:literal,
        feature: $feature:expr,
        encoding: $encoding:literal,
        opcode: $opcode:literal,
        data: $data:literal,
        lanes: $lanes:literal,
        ops: $ops:literal $(,)?
    ) => {
        op_family!(@ilp [1 2 3 4 5 6 7 8]
            $run, $setup, $category, $label, $feature, $encoding, $opcode, $data, $lanes, $ops)
    };
    (@ilp [$($ilp:literal)*]
        $run:ident, $setup:ident, $category:literal, $label:literal, $feature:expr,
        $encoding:literal, $opcode:literal, $data:literal, $lanes:literal, $ops:literal
    ) => {
        [$(
            OpBenchmark {
                benchmark: BenchmarkFns {
                    setup: $setup,
                    run: $run::<$ilp>,
                    teardown,
                },
                category: $category,
                label: $label,
                feature: $feature,
                encoding: $encoding,
                opcode: $opcode,
                output_data: $data,
                output_elements: $lanes,
                output_vectors: 1,
                input_data: $data,
                input_elements: 2 * $lanes,
                input_vectors: 2,
                ops_per_instruction: $ops,
                ilp: $ilp,
            }
        ),*]
    };
}

static PORTABLE: [[OpBenchmark; OP_ILP_VARIANTS]; 3] = [
    op_family!(
        run_f32x4, setup_baseline,
        category: "128-bit FP multiply-add",
        label: "MUL+ADD (4 x f32, portable)",
        feature: BASELINE_FEATURE,
        encoding: "vec128",
        opcode: "fmul+fadd",
        data: "f32",
        lanes: 4,
        ops: 8,
    ),
    op_family!(
        run_f64x2, setup_baseline,
        category: "128-bit FP multiply-add",
        label: "MUL+ADD (2 x f64, portable)",
        feature: BASELINE_FEATURE,
        encoding: "vec128",
        opcode: "fmul+fadd",
        data: "f64",
        lanes: 2,
        ops: 4,
    ),
    op_family!(
        run_i32x4, setup_baseline,
        category: "128-bit integer multiply-add",
        label: "MUL+ADD (4 x i32, portable)",
        feature: BASELINE_FEATURE,
        encoding: "vec128",
        opcode: "mul+add",
        data: "i32",
        lanes: 4,
        ops: 8,
    ),
];

#[cfg(target_arch = "x86_64")]
mod arch {
    use super::*;
    use crate::kernels::x86;

    fn setup_fma(_: &()) -> Result<OpHandle, SetupError> {
        require(&["avx", "fma"])
    }

    fn setup_avx2(_: &()) -> Result<OpHandle, SetupError> {
        require(&["avx2"])
    }

    fn run_fma_f32x8<const ILP: usize>(handle: &mut OpHandle) -> f64 {
        // SAFETY: setup_fma verified AVX and FMA
        let sink = unsafe { x86::fma_f32x8::<ILP>(N_ITERATIONS / ILP) };
        finish(handle, sink, 16, ILP)
    }

    fn run_fma_f64x4<const ILP: usize>(handle: &mut OpHandle) -> f64 {
        // SAFETY: setup_fma verified AVX and FMA
        let sink = unsafe { x86::fma_f64x4::<ILP>(N_ITERATIONS / ILP) };
        finish(handle, sink, 8, ILP)
    }

    fn run_i32x8<const ILP: usize>(handle: &mut OpHandle) -> f64 {
        // SAFETY: setup_avx2 verified AVX2
        let sink = unsafe { x86::mul_add_i32x8::<ILP>(N_ITERATIONS / ILP) };
        finish(handle, sink, 16, ILP)
    }

    pub(super) static OPS: &[[OpBenchmark; OP_ILP_VARIANTS]] = &[
        op_family!(
            run_fma_f32x8, setup_fma,
            category: "256-bit FP fused multiply-add",
            label: "VFMADD (8 x f32, ymm)",
            feature: "fma",
            encoding: "ymm",
            opcode: "vfmadd213ps",
            data: "f32",
            lanes: 8,
            ops: 16,
        ),
        op_family!(
            run_fma_f64x4, setup_fma,
            category: "256-bit FP fused multiply-add",
            label: "VFMADD (4 x f64, ymm)",
            feature: "fma",
            encoding: "ymm",
            opcode: "vfmadd213pd",
            data: "f64",
            lanes: 4,
            ops: 8,
        ),
        op_family!(
            run_i32x8, setup_avx2,
            category: "256-bit integer multiply-add",
            label: "VPMULLD+VPADDD (8 x i32, ymm)",
            feature: "avx2",
            encoding: "ymm",
            opcode: "vpmulld+vpaddd",
            data: "i32",
            lanes: 8,
            ops: 16,
        ),
    ];
}

#[cfg(target_arch = "aarch64")]
mod arch {
    use super::*;
    use crate::kernels::aarch64;

    fn setup_neon(_: &()) -> Result<OpHandle, SetupError> {
        require(&["neon"])
    }

    fn run_fmla_f32x4<const ILP: usize>(handle: &mut OpHandle) -> f64 {
        // SAFETY: setup_neon verified NEON
        let sink = unsafe { aarch64::fmla_f32x4::<ILP>(N_ITERATIONS / ILP) };
        finish(handle, sink, 8, ILP)
    }

    fn run_fmla_f64x2<const ILP: usize>(handle: &mut OpHandle) -> f64 {
        // SAFETY: setup_neon verified NEON
        let sink = unsafe { aarch64::fmla_f64x2::<ILP>(N_ITERATIONS / ILP) };
        finish(handle, sink, 4, ILP)
    }

    pub(super) static OPS: &[[OpBenchmark; OP_ILP_VARIANTS]] = &[
        op_family!(
            run_fmla_f32x4, setup_neon,
            category: "NEON fused multiply-add",
            label: "FMLA (4 x f32, vector)",
            feature: "neon",
            encoding: "vreg",
            opcode: "fmla",
            data: "f32",
            lanes: 4,
            ops: 8,
        ),
        op_family!(
            run_fmla_f64x2, setup_neon,
            category: "NEON fused multiply-add",
            label: "FMLA (2 x f64, vector)",
            feature: "neon",
            encoding: "vreg",
            opcode: "fmla",
            data: "f64",
            lanes: 2,
            ops: 4,
        ),
    ];
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
mod arch {
    use super::{OP_ILP_VARIANTS, OpBenchmark};

    pub(super) static OPS: &[[OpBenchmark; OP_ILP_VARIANTS]] = &[];
}

/// All arithmetic benchmarks: the portable families first, then those for
/// the target architecture. Entries of one category are adjacent.
pub fn op_benchmarks() -> impl Iterator<Item = &'static OpBenchmark> {
    PORTABLE.iter().chain(arch::OPS.iter()).flatten()
}
