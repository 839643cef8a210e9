//! Edge-triggered weather threshold alerts.
//!
//! Each metric runs its own two-state machine:
//!
//! ```text
//!              value > limit  (send text, pause, publish)
//!   NORMAL ───────────────────────────────────────────────▶ ALERTED
//!     ▲                                                        │
//!     └──────────── value ≤ limit  or  reading invalid ────────┘
//! ```
//!
//! Only the NORMAL → ALERTED edge produces a notification.  The flag is
//! latched even if the text send fails, so a flapping link never turns into
//! a notification storm; the next clear/raise cycle tries again.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{DashboardPort, EventSink, HttpPort, Metric, SensorSample, TimePort};
use crate::relay::PhotoRelay;

/// Latched per-metric alert flags.  `true` = already notified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeatherAlertState {
    pub temp_alerted: bool,
    pub humidity_alerted: bool,
}

impl WeatherAlertState {
    fn flag(&mut self, metric: Metric) -> &mut bool {
        match metric {
            Metric::Temperature => &mut self.temp_alerted,
            Metric::Humidity => &mut self.humidity_alerted,
        }
    }
}

/// Edge produced by one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeatherTransition {
    Raised { metric: Metric, value: f32, limit: f32 },
    Cleared { metric: Metric },
}

/// Dashboard reason tag for a raised metric.
pub fn reason_tag(metric: Metric) -> &'static str {
    match metric {
        Metric::Temperature => "high_temperature",
        Metric::Humidity => "high_humidity",
    }
}

/// Human-readable alert text, e.g. `HIGH TEMPERATURE ALERT: 35.0°C (limit 34.0°C)`.
pub fn alert_text(metric: Metric, value: f32, limit: f32) -> String {
    let name = match metric {
        Metric::Temperature => "TEMPERATURE",
        Metric::Humidity => "HUMIDITY",
    };
    let unit = metric.unit();
    format!("HIGH {name} ALERT: {value:.1}{unit} (limit {limit:.1}{unit})")
}

pub struct WeatherGate {
    temperature_limit: f32,
    humidity_limit: f32,
    spacing_ms: u64,
    state: WeatherAlertState,
}

impl WeatherGate {
    pub fn new(temperature_limit: f32, humidity_limit: f32, spacing_ms: u64) -> Self {
        Self {
            temperature_limit,
            humidity_limit,
            spacing_ms,
            state: WeatherAlertState::default(),
        }
    }

    pub fn state(&self) -> WeatherAlertState {
        self.state
    }

    fn limit(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Temperature => self.temperature_limit,
            Metric::Humidity => self.humidity_limit,
        }
    }

    /// Advance one metric's state machine.  Pure: no I/O.
    pub fn observe(&mut self, metric: Metric, value: Option<f32>) -> Option<WeatherTransition> {
        let limit = self.limit(metric);
        let flag = self.state.flag(metric);
        match value {
            Some(v) if v > limit => {
                if *flag {
                    None
                } else {
                    *flag = true;
                    Some(WeatherTransition::Raised { metric, value: v, limit })
                }
            }
            // Within limit or unreadable.
            _ => {
                let was = core::mem::replace(flag, false);
                was.then_some(WeatherTransition::Cleared { metric })
            }
        }
    }

    /// Run both metrics for `sample` and perform the notifications.
    pub fn check<H, D, T, S>(
        &mut self,
        sample: &SensorSample,
        relay: &PhotoRelay,
        http: &mut H,
        dashboard: &mut D,
        clock: &T,
        sink: &mut S,
    ) where
        H: HttpPort,
        D: DashboardPort,
        T: TimePort,
        S: EventSink,
    {
        for metric in [Metric::Temperature, Metric::Humidity] {
            let value = sample.value(metric);
            if value.is_none() {
                warn!("Weather: {:?} reading invalid, skipping", metric);
            }
            match self.observe(metric, value) {
                Some(WeatherTransition::Raised { metric, value, limit }) => {
                    let text = alert_text(metric, value, limit);
                    info!("Weather: {}", text);
                    let notified = relay.send_text(http, &text);
                    if !notified {
                        warn!("Weather: alert text not delivered");
                    }
                    clock.sleep_ms(self.spacing_ms);
                    if !dashboard.publish_alert(reason_tag(metric), None) {
                        warn!("Weather: dashboard publish failed");
                    }
                    sink.emit(&AppEvent::WeatherAlertRaised {
                        metric,
                        value,
                        limit,
                        notified,
                    });
                }
                Some(WeatherTransition::Cleared { metric }) => {
                    info!("Weather: {:?} back within limits", metric);
                    sink.emit(&AppEvent::WeatherAlertCleared { metric });
                }
                None => {}
            }
        }
    }
}
