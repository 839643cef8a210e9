//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn fmt_reading(v: Option<f32>) -> String {
    v.map_or_else(|| "n/a".into(), |v| format!("{:.1}", v))
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(task) => {
                info!("START | task={}", task);
            }
            AppEvent::MotionSuppressed { remaining_ms } => {
                info!("MOTION | suppressed | cooldown_left={}ms", remaining_ms);
            }
            AppEvent::MotionAccepted { at_ms } => {
                info!("MOTION | accepted | t={}ms", at_ms);
            }
            AppEvent::MotionDelivered {
                outcome,
                dashboard_ok,
                elapsed_ms,
            } => {
                info!(
                    "RELAY | outcome={:?} | dashboard={} | elapsed_ms={}",
                    outcome,
                    if *dashboard_ok { "OK" } else { "FAIL" },
                    elapsed_ms
                );
            }
            AppEvent::WeatherAlertRaised {
                metric,
                value,
                limit,
                notified,
            } => {
                info!(
                    "WEATHER | {:?} raised | {:.1} > {:.1} | notified={}",
                    metric, value, limit, notified
                );
            }
            AppEvent::WeatherAlertCleared { metric } => {
                info!("WEATHER | {:?} cleared", metric);
            }
            AppEvent::SampleTaken {
                temperature_c,
                humidity_percent,
            } => {
                info!(
                    "SAMPLE | T={}\u{00b0}C | RH={}%",
                    fmt_reading(*temperature_c),
                    fmt_reading(*humidity_percent)
                );
            }
        }
    }
}
