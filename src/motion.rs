//! PIR edge debouncer.
//!
//! ```text
//!   PIR rising edge ─▶ ISR ─▶ on_edge_interrupt(now) ─▶ pending = true
//!                                                              │
//!   alert loop (1 s) ─────────────── poll_and_clear() ◀────────┘
//! ```
//!
//! The ISR is the only writer of the trigger timestamp and the only setter
//! of the pending flag; the alert loop is the only reader and the only
//! clearer.  Everything is a single-word atomic so the ISR path never
//! blocks, allocates or logs.  Triggers inside the debounce window are
//! discarded, never queued, so at most one motion event is pending.
//!
//! Timestamps are 32-bit uptime milliseconds compared with wrapping
//! arithmetic; the window is far below the 49-day wrap period.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Default minimum spacing between accepted edges (ms).
pub const DEBOUNCE_WINDOW_MS: u32 = 5_000;

/// Debounce state shared between the PIR interrupt and the alert loop.
pub struct MotionDebouncer {
    window_ms: AtomicU32,
    last_trigger_ms: AtomicU32,
    /// False until the first edge is accepted.
    armed: AtomicBool,
    pending: AtomicBool,
}

impl MotionDebouncer {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms: AtomicU32::new(window_ms),
            last_trigger_ms: AtomicU32::new(0),
            armed: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        }
    }

    /// Interrupt-context entry point.  Returns whether the edge was accepted.
    ///
    /// The very first edge after boot is always accepted.  Later edges are
    /// accepted only once strictly more than the window has elapsed.
    #[inline]
    pub fn on_edge_interrupt(&self, now_ms: u32) -> bool {
        if self.armed.load(Ordering::Acquire) {
            let last = self.last_trigger_ms.load(Ordering::Relaxed);
            if now_ms.wrapping_sub(last) <= self.window_ms.load(Ordering::Relaxed) {
                return false;
            }
        }
        self.last_trigger_ms.store(now_ms, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Alert-loop entry point: report and clear a pending trigger.
    #[inline]
    pub fn poll_and_clear(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Peek without clearing (diagnostics only).
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms.load(Ordering::Relaxed)
    }

    /// Change the window.  Call before the interrupt is armed.
    pub fn set_window_ms(&self, window_ms: u32) {
        self.window_ms.store(window_ms, Ordering::Relaxed);
    }
}

/// Debouncer wired to the PIR interrupt handler.
pub static PIR_DEBOUNCER: MotionDebouncer = MotionDebouncer::new(DEBOUNCE_WINDOW_MS);
