//! Runtime diagnostics.
//!
//! The worker keeps plain counters in [`Counters`]; the queue keeps its own
//! drop counter because producers in interrupt context bump it.  A periodic
//! `Task::Diagnostics` folds both into a [`RuntimeMetrics`] snapshot that is
//! emitted as an application event.

/// Worker-side counters.  Only the worker touches these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub tasks_handled: u64,
    pub malformed_writes: u32,
    pub advertising_failures: u32,
    pub notifications: u32,
}

/// Runtime diagnostics snapshot collected on-demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeMetrics {
    pub tasks_handled: u64,
    pub tasks_dropped: u32,
    pub malformed_writes: u32,
    pub advertising_failures: u32,
    pub notifications: u32,
    pub heap_free: u32,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect(counters: &Counters, tasks_dropped: u32) -> Self {
        let heap_free = unsafe { esp_idf_svc::sys::esp_get_free_heap_size() };
        Self::from_parts(counters, tasks_dropped, heap_free)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(counters: &Counters, tasks_dropped: u32) -> Self {
        Self::from_parts(counters, tasks_dropped, 0)
    }

    fn from_parts(counters: &Counters, tasks_dropped: u32, heap_free: u32) -> Self {
        Self {
            tasks_handled: counters.tasks_handled,
            tasks_dropped,
            malformed_writes: counters.malformed_writes,
            advertising_failures: counters.advertising_failures,
            notifications: counters.notifications,
            heap_free,
        }
    }

    /// Anything worth a warning in the log.
    pub fn is_degraded(&self) -> bool {
        self.tasks_dropped > 0 || self.advertising_failures > 0
    }
}
