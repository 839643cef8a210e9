//! Motion alert orchestration.
//!
//! [`AlertOrchestrator`] turns a drained debounce flag into one complete
//! delivery sequence.  All I/O flows through port traits injected at call
//! sites.
//!
//! ```text
//!   IDLE ──observed ∧ cooldown elapsed──▶ CAPTURING ──▶ DELIVERING ──▶ IDLE
//!     │                                                     │
//!     └──observed ∧ inside cooldown──▶ (stay IDLE)          └─ dashboard "motion"
//! ```
//!
//! The cooldown timestamp is taken when a trigger is accepted, not when
//! delivery finishes, so retries inside one sequence never shorten the
//! gap to the next.

use log::info;

use crate::config::SystemConfig;
use crate::motion::MotionDebouncer;
use crate::relay::reference;
use crate::relay::{DeliveryOutcome, PhotoRelay};

use super::events::AppEvent;
use super::ports::{CapturePort, DashboardPort, EventSink, HttpPort, TimePort};

/// Dashboard reason tag for motion events.
pub const MOTION_REASON: &str = "motion";

// ───────────────────────────────────────────────────────────────
// Cooldown
// ───────────────────────────────────────────────────────────────

/// Time of the last accepted motion sequence.  Owned by the alert loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownState {
    last_alert_ms: Option<u64>,
}

impl CooldownState {
    pub fn last_alert_ms(&self) -> Option<u64> {
        self.last_alert_ms
    }

    /// Milliseconds still to wait, or `None` if a new sequence may start.
    pub fn remaining(&self, now_ms: u64, cooldown_ms: u64) -> Option<u64> {
        let last = self.last_alert_ms?;
        let elapsed = now_ms.saturating_sub(last);
        (elapsed < cooldown_ms).then(|| cooldown_ms - elapsed)
    }

    fn accept(&mut self, now_ms: u64) {
        self.last_alert_ms = Some(now_ms);
    }
}

/// What one poll of the alert loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStep {
    /// No trigger pending.
    Idle,
    /// Trigger dropped by the cooldown.
    Suppressed { remaining_ms: u64 },
    /// A full delivery sequence ran.
    Delivered(DeliveryOutcome),
}

// ───────────────────────────────────────────────────────────────
// AlertOrchestrator
// ───────────────────────────────────────────────────────────────

pub struct AlertOrchestrator {
    relay: PhotoRelay,
    cooldown: CooldownState,
    cooldown_ms: u64,
    spacing_ms: u64,
    caption: String,
}

impl AlertOrchestrator {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            relay: PhotoRelay::new(config),
            cooldown: CooldownState::default(),
            cooldown_ms: config.motion_cooldown_ms,
            spacing_ms: config.dashboard_spacing_ms,
            caption: config.motion_caption.clone(),
        }
    }

    pub fn cooldown(&self) -> CooldownState {
        self.cooldown
    }

    /// Drain the debounce flag and run a delivery sequence if allowed.
    pub fn poll(
        &mut self,
        debouncer: &MotionDebouncer,
        http: &mut impl HttpPort,
        dashboard: &mut impl DashboardPort,
        camera: &mut impl CapturePort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> MotionStep {
        if !debouncer.poll_and_clear() {
            return MotionStep::Idle;
        }
        self.on_motion(http, dashboard, camera, clock, sink)
    }

    /// Handle one observed trigger.
    pub fn on_motion(
        &mut self,
        http: &mut impl HttpPort,
        dashboard: &mut impl DashboardPort,
        camera: &mut impl CapturePort,
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> MotionStep {
        let now = clock.now_ms();
        if let Some(remaining_ms) = self.cooldown.remaining(now, self.cooldown_ms) {
            info!("Motion: suppressed by cooldown ({} ms left)", remaining_ms);
            sink.emit(&AppEvent::MotionSuppressed { remaining_ms });
            return MotionStep::Suppressed { remaining_ms };
        }

        self.cooldown.accept(now);
        info!("Motion: accepted, capturing");
        sink.emit(&AppEvent::MotionAccepted { at_ms: now });

        let capture = camera.capture();
        let photo = reference::resolve(capture.as_deref());
        let outcome = self.relay.deliver(http, clock, &self.caption, &photo);

        clock.sleep_ms(self.spacing_ms);
        let dashboard_ok = dashboard.publish_alert(MOTION_REASON, None);
        if !dashboard_ok {
            log::warn!("Motion: dashboard publish failed");
        }

        let elapsed_ms = clock.now_ms().saturating_sub(now);
        info!("Motion: sequence done outcome={:?} elapsed_ms={}", outcome, elapsed_ms);
        sink.emit(&AppEvent::MotionDelivered {
            outcome,
            dashboard_ok,
            elapsed_ms,
        });
        MotionStep::Delivered(outcome)
    }
}
