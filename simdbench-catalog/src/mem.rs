//! Memory transfer benchmarks.
//!
//! Each worker allocates a private source and destination buffer of
//! `MemParams::size` bytes at `MemParams::alignment` and streams through it
//! often enough to move at least 512 MiB per `run`.

use crate::kernels::memory;
use serde::{Deserialize, Serialize};
use simdbench_core::{BASELINE_FEATURE, BenchmarkFns, SetupError};
use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Buffer sizes must be a multiple of this (four 64-byte units)
pub const SIZE_ALIGNMENT: usize = 256;

/// Smallest accepted buffer alignment
pub const MIN_ALIGNMENT: usize = 16;

/// Minimum number of bytes one `run` moves per worker
const MIN_BYTES_PER_RUN: usize = 512 * 1024 * 1024;

/// Minimum number of passes over the buffer per `run`
const MIN_ITERATIONS: usize = 16;

/// Per-worker buffer geometry, shared by all workers of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemParams {
    /// Bytes per buffer
    pub size: usize,
    /// Buffer start alignment in bytes
    pub alignment: usize,
}

impl MemParams {
    /// Create parameters
    pub const fn new(size: usize, alignment: usize) -> Self {
        Self { size, alignment }
    }

    /// Check size and alignment constraints
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.size == 0 || self.size % SIZE_ALIGNMENT != 0 {
            return Err(SetupError::InvalidParams(format!(
                "size {} is not a non-zero multiple of {SIZE_ALIGNMENT}",
                self.size
            )));
        }
        if !self.alignment.is_power_of_two() || self.alignment < MIN_ALIGNMENT {
            return Err(SetupError::InvalidParams(format!(
                "alignment {} is not a power of two >= {MIN_ALIGNMENT}",
                self.alignment
            )));
        }
        Ok(())
    }
}

/// Passes over a buffer of `size` bytes needed for one `run`
pub fn n_iterations(size: usize) -> usize {
    (MIN_BYTES_PER_RUN / size.max(1)).max(MIN_ITERATIONS)
}

/// Heap buffer with a caller-chosen alignment, filled with a non-zero pattern
/// so every page is backed before the timed window.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: AlignedBuffer uniquely owns its allocation
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `size` bytes aligned to `alignment`
    pub fn new(size: usize, alignment: usize) -> Result<Self, SetupError> {
        let alloc_error = || SetupError::Allocation { size, alignment };
        if size == 0 {
            return Err(alloc_error());
        }
        let layout = Layout::from_size_align(size, alignment).map_err(|_| alloc_error())?;

        // SAFETY: layout has a non-zero size
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).ok_or_else(alloc_error)?;

        // SAFETY: ptr is valid for `size` bytes of writes
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0xa5, size) };
        Ok(Self { ptr, layout })
    }

    /// Buffer length in bytes
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Whether the buffer is empty (never true for a constructed buffer)
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// Alignment the buffer was allocated with
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// View as bytes
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid and initialized for len bytes
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// View as mutable bytes
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid and initialized for len bytes, uniquely borrowed
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with this layout
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AlignedBuffer(len={}, align={})", self.len(), self.alignment())
    }
}

/// One worker's private transfer buffers
#[derive(Debug)]
pub struct MemHandle {
    src: AlignedBuffer,
    dst: AlignedBuffer,
    n_iterations: usize,
    checksum: u64,
}

impl MemHandle {
    /// Passes over the buffer per `run`
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// Bytes moved by one pass of a load or store
    pub fn size(&self) -> usize {
        self.src.len()
    }

    /// Checksum of the last load run
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    fn total_bytes(&self) -> f64 {
        self.size() as f64 * self.n_iterations as f64
    }
}

fn setup(params: &MemParams) -> Result<MemHandle, SetupError> {
    params.validate()?;
    Ok(MemHandle {
        src: AlignedBuffer::new(params.size, params.alignment)?,
        dst: AlignedBuffer::new(params.size, params.alignment)?,
        n_iterations: n_iterations(params.size),
        checksum: 0,
    })
}

fn teardown(handle: MemHandle) {
    drop(handle);
}

fn run_load<const LANES: usize, const ILP: usize>(handle: &mut MemHandle) -> f64 {
    handle.checksum = memory::load::<LANES, ILP>(handle.src.as_slice(), handle.n_iterations);
    handle.total_bytes()
}

fn run_store<const LANES: usize, const ILP: usize>(handle: &mut MemHandle) -> f64 {
    memory::store::<LANES, ILP>(handle.dst.as_mut_slice(), handle.n_iterations);
    handle.total_bytes()
}

fn run_copy<const LANES: usize, const ILP: usize>(handle: &mut MemHandle) -> f64 {
    let n = handle.n_iterations;
    memory::copy::<LANES, ILP>(handle.src.as_slice(), handle.dst.as_mut_slice(), n);
    2.0 * handle.total_bytes()
}

/// Catalog record for one memory benchmark
#[derive(Debug, Clone, Copy)]
pub struct MemBenchmark {
    /// Setup/run/teardown entry points
    pub benchmark: BenchmarkFns<MemParams, MemHandle>,
    /// Descriptive label
    pub label: &'static str,
    /// Transfer unit encoding
    pub encoding: &'static str,
    /// Required CPU feature
    pub feature: &'static str,
    /// `load`, `store` or `copy`
    pub op_type: &'static str,
    /// 16-byte vectors transferred per unit
    pub n_vectors: usize,
    /// Element bit width, `None` if untyped
    pub data_size: Option<usize>,
    /// Independent transfers per loop iteration
    pub ilp: usize,
}

macro_rules! mem_family {
    ($run:ident, $op:literal, $label:literal, $encoding:literal, $lanes:literal) => {
        mem_family!(@ilp [1 2 4 8] $run, $op, $label, $encoding, $lanes)
    };
    (@ilp [$($ilp:literal)*] $run:ident, $op:literal, $label:literal, $encoding:literal, $lanes:literal) => {
        [$(
            MemBenchmark {
                benchmark: BenchmarkFns {
                    setup,
                    run: $run::<$lanes, $ilp>,
                    teardown,
                },
                label: $label,
                encoding: $encoding,
                feature: BASELINE_FEATURE,
                op_type: $op,
                n_vectors: $lanes / 2,
                data_size: None,
                ilp: $ilp,
            }
        ),*]
    };
}

/// Number of ILP variants per transfer kind
pub const MEM_ILP_VARIANTS: usize = 4;

static MEM_BENCHMARKS: [[MemBenchmark; MEM_ILP_VARIANTS]; 9] = [
    mem_family!(run_load, "load", "LOAD (16-byte units)", "unit-16B", 2),
    mem_family!(run_load, "load", "LOAD (32-byte units)", "unit-32B", 4),
    mem_family!(run_load, "load", "LOAD (64-byte units)", "unit-64B", 8),
    mem_family!(run_store, "store", "STORE (16-byte units)", "unit-16B", 2),
    mem_family!(run_store, "store", "STORE (32-byte units)", "unit-32B", 4),
    mem_family!(run_store, "store", "STORE (64-byte units)", "unit-64B", 8),
    mem_family!(run_copy, "copy", "LOAD/STORE (16-byte units)", "unit-16B", 2),
    mem_family!(run_copy, "copy", "LOAD/STORE (32-byte units)", "unit-32B", 4),
    mem_family!(run_copy, "copy", "LOAD/STORE (64-byte units)", "unit-64B", 8),
];

/// All memory benchmarks, grouped by label
pub fn mem_benchmarks() -> impl Iterator<Item = &'static MemBenchmark> {
    MEM_BENCHMARKS.iter().flatten()
}
