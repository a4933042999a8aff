//! Timed-Window Clock
//!
//! The engine brackets the measured region with a monotonic clock
//! (`std::time::Instant`, immune to wall-clock adjustments) and, where the
//! architecture exposes one, a raw hardware counter read alongside it.

use std::time::Duration;

/// Whether this platform provides a hardware counter for `elapsed_ticks`.
pub const HAS_CYCLE_COUNTER: bool = cfg!(any(target_arch = "x86_64", target_arch = "aarch64"));

/// Sample the hardware counter, or 0 where [`HAS_CYCLE_COUNTER`] is false.
///
/// Both reads wait for earlier instructions to complete, so the sample
/// cannot be hoisted above the work that precedes it.
#[inline(always)]
fn read_ticks() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        let mut _core: u32 = 0;
        // SAFETY: RDTSCP is present on every x86_64 CPU this crate targets.
        unsafe { std::arch::x86_64::__rdtscp(&mut _core) }
    }
    #[cfg(target_arch = "aarch64")]
    {
        let ticks: u64;
        // SAFETY: CNTVCT_EL0 is readable from EL0 and ISB only orders the
        // instruction stream.
        unsafe {
            std::arch::asm!(
                "isb",
                "mrs {}, cntvct_el0",
                out(reg) ticks,
                options(nostack, nomem, preserves_flags),
            );
        }
        ticks
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        0
    }
}

// ─── Timer ───────────────────────────────────────────────────────────────────

/// Brackets one timed window.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: std::time::Instant,
    ticks_start: u64,
}

impl Timer {
    /// Start the window
    #[inline(always)]
    pub fn start() -> Self {
        let ticks_start = read_ticks();
        Self {
            start: std::time::Instant::now(),
            ticks_start,
        }
    }

    /// Close the window, returning the monotonic duration and counter delta
    #[inline(always)]
    pub fn stop(&self) -> (Duration, u64) {
        let elapsed = self.start.elapsed();
        let ticks = read_ticks().saturating_sub(self.ticks_start);
        (elapsed, ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let (elapsed, ticks) = timer.stop();

        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_secs(5));
        assert_eq!(ticks > 0, HAS_CYCLE_COUNTER);
    }

    #[test]
    fn test_tick_counter() {
        if HAS_CYCLE_COUNTER {
            let a = read_ticks();
            let b = read_ticks();
            assert!(b >= a, "tick counter should be monotonic");
        } else {
            assert_eq!(read_ticks(), 0);
        }
    }
}
