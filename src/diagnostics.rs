//! Runtime diagnostics.
//!
//! [`HealthMonitor`] is ticked from the main task and emits a
//! [`HealthReport`] (uptime, free heap, heap low-water mark) once per
//! interval.  A panic hook logs the reason with the uptime at which it
//! occurred before the default handler resets the chip.

use log::{error, info, warn};

/// Default reporting interval.
pub const HEALTH_INTERVAL_MS: u64 = 10_000;

/// Free-heap level below which reports are logged as warnings.
const LOW_HEAP_BYTES: u32 = 32 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub uptime_secs: u64,
    pub heap_free: u32,
    pub heap_min_free: u32,
}

impl HealthReport {
    #[cfg(target_os = "espidf")]
    pub fn collect(uptime_ms: u64) -> Self {
        // SAFETY: heap statistics reads, callable from any task.
        let (heap_free, heap_min_free) = unsafe {
            (
                esp_idf_svc::sys::esp_get_free_heap_size(),
                esp_idf_svc::sys::esp_get_minimum_free_heap_size(),
            )
        };
        Self {
            uptime_secs: uptime_ms / 1_000,
            heap_free,
            heap_min_free,
        }
    }

    /// Synthetic values that decay slowly with uptime so host runs exercise
    /// the low-heap branch.
    #[cfg(not(target_os = "espidf"))]
    pub fn collect(uptime_ms: u64) -> Self {
        let uptime_secs = uptime_ms / 1_000;
        let base_free: u32 = 307_200;
        let decay = (uptime_secs / 60) as u32 * 512;
        let heap_free = base_free.saturating_sub(decay);
        Self {
            uptime_secs,
            heap_free,
            heap_min_free: heap_free - heap_free / 8,
        }
    }

    pub fn is_low(&self) -> bool {
        self.heap_free < LOW_HEAP_BYTES
    }
}

pub struct HealthMonitor {
    interval_ms: u64,
    next_report_ms: u64,
}

impl HealthMonitor {
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms,
            next_report_ms: now_ms + interval_ms,
        }
    }

    /// Returns a report when the interval has elapsed.  A tick that arrives
    /// late reschedules from `now_ms` instead of bursting.
    pub fn tick(&mut self, now_ms: u64) -> Option<HealthReport> {
        if now_ms < self.next_report_ms {
            return None;
        }
        self.next_report_ms = now_ms + self.interval_ms;
        let report = HealthReport::collect(now_ms);
        if report.is_low() {
            warn!(
                "Health: uptime {}s, heap {} B free (min {} B) LOW",
                report.uptime_secs, report.heap_free, report.heap_min_free
            );
        } else {
            info!(
                "Health: uptime {}s, heap {} B free (min {} B)",
                report.uptime_secs, report.heap_free, report.heap_min_free
            );
        }
        Some(report)
    }

    /// Milliseconds until the next report is due.
    pub fn due_in_ms(&self, now_ms: u64) -> u64 {
        self.next_report_ms.saturating_sub(now_ms)
    }
}

/// Install a panic hook that logs the reason before reset.
///
/// Call once during init.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: plain counter read, no allocation.
            let uptime = (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000_000;
            error!("PANIC at {}s: {} ({})", uptime, reason, location);
        }

        #[cfg(not(target_os = "espidf"))]
        error!("PANIC (simulation): {} ({})", reason, location);
    }));
}
