//! Outbound application events.
//!
//! The alert and sampling loops emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, count in tests, etc.

use super::ports::Metric;
use crate::relay::DeliveryOutcome;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A loop has started.
    Started(&'static str),

    /// A debounced motion trigger arrived inside the cooldown window.
    MotionSuppressed { remaining_ms: u64 },

    /// A motion trigger was accepted and a delivery sequence begins.
    MotionAccepted { at_ms: u64 },

    /// A motion delivery sequence finished.
    MotionDelivered {
        outcome: DeliveryOutcome,
        dashboard_ok: bool,
        elapsed_ms: u64,
    },

    /// A metric crossed its limit.  `notified` is the text-send result.
    WeatherAlertRaised {
        metric: Metric,
        value: f32,
        limit: f32,
        notified: bool,
    },

    /// A metric returned within limits (or became unreadable).
    WeatherAlertCleared { metric: Metric },

    /// A sensor reading was taken.
    SampleTaken {
        temperature_c: Option<f32>,
        humidity_percent: Option<f32>,
    },
}
