//! Capability and Parameter Probe
//!
//! Two pure queries consumed by benchmark setup phases and the CLI:
//! - [`vector_length`]: bytes per vector register in the execution mode the
//!   kernels use (streaming mode on SME hardware)
//! - [`sysctl_value`] / [`feature_supported`]: named system configuration
//!   values and CPU feature flags
//!
//! A failed query and a negative answer are the same thing to callers: an
//! unknown name reads as 0 and is reported as unsupported.

use std::sync::OnceLock;

/// Name that every CPU supports; used by portable benchmark bodies
pub const BASELINE_FEATURE: &str = "baseline";

/// Vector register width assumed when nothing wider is detected (128 bits)
pub const MIN_VECTOR_LENGTH: usize = 16;

/// Bytes per vector register, queried once per process.
pub fn vector_length() -> usize {
    static VECTOR_LENGTH: OnceLock<usize> = OnceLock::new();
    *VECTOR_LENGTH.get_or_init(detect_vector_length)
}

#[cfg(all(target_arch = "aarch64", target_os = "linux"))]
fn detect_vector_length() -> usize {
    const PR_SVE_GET_VL: libc::c_int = 51;
    const PR_SME_GET_VL: libc::c_int = 64;
    const PR_VL_LEN_MASK: libc::c_int = 0xffff;

    for option in [PR_SME_GET_VL, PR_SVE_GET_VL] {
        // SAFETY: the GET_VL prctls take no pointer arguments and fail with
        // EINVAL on kernels or CPUs without the extension.
        let ret = unsafe { libc::prctl(option, 0, 0, 0, 0) };
        if ret > 0 {
            return (ret & PR_VL_LEN_MASK) as usize;
        }
    }
    MIN_VECTOR_LENGTH
}

#[cfg(all(target_arch = "aarch64", target_vendor = "apple"))]
fn detect_vector_length() -> usize {
    if sysctl_value("hw.optional.arm.FEAT_SME") != 1 {
        return MIN_VECTOR_LENGTH;
    }
    let bytes: u64;
    // SAFETY: FEAT_SME is present, and RDSVL reads the streaming vector
    // length without entering streaming mode or touching memory.
    unsafe {
        std::arch::asm!(
            ".arch_extension sme",
            "rdsvl {}, #1",
            out(reg) bytes,
            options(nostack, nomem, preserves_flags),
        );
    }
    bytes as usize
}

#[cfg(all(
    target_arch = "aarch64",
    not(any(target_os = "linux", target_vendor = "apple"))
))]
fn detect_vector_length() -> usize {
    MIN_VECTOR_LENGTH
}

#[cfg(target_arch = "x86_64")]
fn detect_vector_length() -> usize {
    if std::arch::is_x86_feature_detected!("avx512f") {
        64
    } else if std::arch::is_x86_feature_detected!("avx") {
        32
    } else {
        MIN_VECTOR_LENGTH
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_vector_length() -> usize {
    MIN_VECTOR_LENGTH
}

/// Read an integer system configuration value by name.
///
/// On Apple platforms `name` is a sysctl (e.g. `hw.perflevel0.physicalcpu`).
/// On Linux the dotted name is looked up under `/proc/sys`
/// (e.g. `kernel.pid_max`). Returns 0 for unknown names or failed reads.
pub fn sysctl_value(name: &str) -> i64 {
    read_sysctl(name).unwrap_or(0)
}

#[cfg(target_vendor = "apple")]
fn read_sysctl(name: &str) -> Option<i64> {
    let c_name = std::ffi::CString::new(name).ok()?;
    let mut value: i64 = 0;
    let mut size = std::mem::size_of::<i64>();

    // SAFETY: `value` and `size` describe a valid writable buffer; sysctl
    // writes at most `size` bytes and updates `size` with the actual length.
    let ret = unsafe {
        libc::sysctlbyname(
            c_name.as_ptr(),
            (&mut value as *mut i64).cast(),
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret == -1 {
        return None;
    }

    // 32-bit values only fill the low half of the buffer
    match size {
        4 => Some(value as i32 as i64),
        8 => Some(value),
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn read_sysctl(name: &str) -> Option<i64> {
    if name.is_empty() || name.contains("..") || name.contains('/') {
        return None;
    }
    let path = std::path::Path::new("/proc/sys").join(name.replace('.', "/"));
    let content = std::fs::read_to_string(path).ok()?;
    content.split_whitespace().next()?.parse().ok()
}

#[cfg(not(any(target_vendor = "apple", target_os = "linux")))]
fn read_sysctl(_name: &str) -> Option<i64> {
    None
}

/// Whether the CPU (or system configuration) reports feature `name`.
///
/// Accepts a raw sysctl name (`hw.optional.arm.FEAT_SME`), an Arm feature
/// name (`FEAT_SME2`), or a CPU flag (`avx2`, `sve`, `asimd`). Lookup
/// failures are treated as "not supported".
pub fn feature_supported(name: &str) -> bool {
    if name == BASELINE_FEATURE {
        return true;
    }
    if name.is_empty() {
        return false;
    }
    if sysctl_value(name) == 1 {
        return true;
    }
    if cfg!(target_vendor = "apple") && sysctl_value(&format!("hw.optional.arm.{name}")) == 1 {
        return true;
    }
    cpu_flags().contains(name)
}

/// CPU feature flags reported by the OS, collected once per process
#[derive(Debug, Clone, Default)]
pub struct CpuFlags {
    flags: Vec<String>,
}

impl CpuFlags {
    /// Build from a whitespace-separated flag list
    pub fn from_list(list: &str) -> Self {
        let mut flags: Vec<String> = list.split_whitespace().map(str::to_lowercase).collect();
        flags.sort();
        flags.dedup();
        Self { flags }
    }

    /// Parse the `flags` (x86) or `Features` (Arm) line of `/proc/cpuinfo`
    pub fn from_cpuinfo(cpuinfo: &str) -> Self {
        let list = cpuinfo
            .lines()
            .find(|line| line.starts_with("flags") || line.starts_with("Features"))
            .and_then(|line| line.split(':').nth(1))
            .unwrap_or("");
        Self::from_list(list)
    }

    /// Whether `name` is present. `FEAT_` prefixes are ignored and the
    /// comparison is case-insensitive.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.strip_prefix("FEAT_").unwrap_or(name).to_lowercase();
        self.flags.binary_search(&name).is_ok()
    }

    /// All flags, sorted
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}

/// The host's CPU flags
pub fn cpu_flags() -> &'static CpuFlags {
    static FLAGS: OnceLock<CpuFlags> = OnceLock::new();
    FLAGS.get_or_init(detect_cpu_flags)
}

fn detect_cpu_flags() -> CpuFlags {
    let mut list = proc_cpuinfo_flags().unwrap_or_default();
    for flag in runtime_detected_flags() {
        list.push(' ');
        list.push_str(flag);
    }
    CpuFlags::from_list(&list)
}

#[cfg(target_os = "linux")]
fn proc_cpuinfo_flags() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    Some(CpuFlags::from_cpuinfo(&cpuinfo).flags.join(" "))
}

#[cfg(not(target_os = "linux"))]
fn proc_cpuinfo_flags() -> Option<String> {
    None
}

#[cfg(target_arch = "x86_64")]
fn runtime_detected_flags() -> Vec<&'static str> {
    let mut detected = Vec::new();
    macro_rules! probe {
        ($($feature:tt),*) => {
            $(
                if std::arch::is_x86_feature_detected!($feature) {
                    detected.push($feature);
                }
            )*
        };
    }
    probe!("sse2", "sse4.1", "sse4.2", "avx", "avx2", "fma", "avx512f", "avx512bw", "avx512vl");
    detected
}

#[cfg(target_arch = "aarch64")]
fn runtime_detected_flags() -> Vec<&'static str> {
    // Advanced SIMD is mandatory on AArch64; cpuinfo calls it "asimd".
    let mut detected = vec!["neon", "asimd"];
    if std::arch::is_aarch64_feature_detected!("fp16") {
        detected.push("fp16");
    }
    if std::arch::is_aarch64_feature_detected!("sve") {
        detected.push("sve");
    }
    if std::arch::is_aarch64_feature_detected!("sve2") {
        detected.push("sve2");
    }
    detected
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn runtime_detected_flags() -> Vec<&'static str> {
    Vec::new()
}
