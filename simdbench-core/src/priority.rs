//! Thread Priority Hints
//!
//! Workers ask the OS scheduler for a priority class: `High` should land on
//! the fastest ("performance") cores and `Low` on the efficiency cores. The
//! mapping is advisory. The engine only requests the class and never checks
//! where a thread actually runs.

use serde::{Deserialize, Serialize};

/// Scheduling hint requested for a worker thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityClass {
    /// User-initiated priority, intended for performance cores
    High,
    /// Utility priority, intended for efficiency cores
    Low,
}

impl PriorityClass {
    /// Short label used in thread names
    pub fn as_str(self) -> &'static str {
        match self {
            PriorityClass::High => "high",
            PriorityClass::Low => "low",
        }
    }

    /// Request this class for the calling thread.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn apply_to_current_thread(self) {
        if let Err(err) = apply(self) {
            tracing::debug!(class = self.as_str(), error = %err, "priority hint not applied");
        }
    }
}

impl std::fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(target_vendor = "apple")]
fn apply(class: PriorityClass) -> Result<(), std::io::Error> {
    let qos = match class {
        PriorityClass::High => libc::qos_class_t::QOS_CLASS_USER_INITIATED,
        PriorityClass::Low => libc::qos_class_t::QOS_CLASS_UTILITY,
    };

    // SAFETY: only changes the QoS of the calling thread.
    let result = unsafe { libc::pthread_set_qos_class_self_np(qos, 0) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::from_raw_os_error(result))
    }
}

/// Nice value requested for low-priority workers on Linux
#[cfg(target_os = "linux")]
const LOW_PRIORITY_NICE: libc::c_int = 10;

#[cfg(target_os = "linux")]
fn apply(class: PriorityClass) -> Result<(), std::io::Error> {
    let nice = match class {
        // Lowering nice below 0 needs privileges; high workers keep the default.
        PriorityClass::High => return Ok(()),
        PriorityClass::Low => LOW_PRIORITY_NICE,
    };

    // SAFETY: gettid has no preconditions; setpriority with a thread id only
    // affects that thread on Linux.
    let result = unsafe {
        let tid = libc::syscall(libc::SYS_gettid) as libc::id_t;
        libc::setpriority(libc::PRIO_PROCESS, tid, nice)
    };

    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(any(target_vendor = "apple", target_os = "linux")))]
fn apply(_class: PriorityClass) -> Result<(), std::io::Error> {
    // No priority classes on this platform
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(PriorityClass::High.as_str(), "high");
        assert_eq!(PriorityClass::Low.to_string(), "low");
    }

    #[test]
    fn test_apply_on_scratch_thread() {
        // Lowering priority is always permitted; run it on a throwaway thread
        // so the test harness thread keeps its own class.
        std::thread::spawn(|| {
            PriorityClass::Low.apply_to_current_thread();
            PriorityClass::High.apply_to_current_thread();
        })
        .join()
        .unwrap();
    }
}
