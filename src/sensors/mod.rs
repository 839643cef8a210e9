//! Sensor subsystem: the DHT22 driver and the [`SensorHub`] that turns its
//! readings into timestamped [`SensorSample`]s for the sampling loop.
//!
//! A failed read (no response, checksum, GPIO error) yields a sample with
//! both metrics invalid; the loop skips invalid metrics rather than
//! publishing stale values.

pub mod dht22;

use log::warn;

use crate::app::ports::{SamplePort, SensorSample, TimePort};
use dht22::{DhtError, DhtReading, EnvironmentSensor};

/// Aggregates the environment sensor and stamps each reading with uptime.
pub struct SensorHub<S, T> {
    sensor: S,
    clock: T,
    temperature_limit: f32,
    humidity_limit: f32,
}

impl<S: EnvironmentSensor, T: TimePort> SensorHub<S, T> {
    pub fn new(sensor: S, clock: T, temperature_limit: f32, humidity_limit: f32) -> Self {
        Self {
            sensor,
            clock,
            temperature_limit,
            humidity_limit,
        }
    }

    fn warn_if_high(&self, sample: &SensorSample) {
        if let Some(t) = sample.temperature_c.filter(|t| *t > self.temperature_limit) {
            warn!("Sampling: temperature {:.1}°C above {:.1}°C", t, self.temperature_limit);
        }
        if let Some(h) = sample.humidity_percent.filter(|h| *h > self.humidity_limit) {
            warn!("Sampling: humidity {:.1}% above {:.1}%", h, self.humidity_limit);
        }
    }
}

impl<S: EnvironmentSensor, T: TimePort> SamplePort for SensorHub<S, T> {
    fn read_sample(&mut self) -> SensorSample {
        let now = self.clock.now_ms();
        match self.sensor.read() {
            Ok(r) => {
                let sample = SensorSample::from_raw(r.temperature_c, r.humidity_percent, now);
                self.warn_if_high(&sample);
                sample
            }
            Err(e) => {
                warn!("Sampling: DHT22 read failed: {}", e);
                SensorSample {
                    temperature_c: None,
                    humidity_percent: None,
                    timestamp_ms: now,
                }
            }
        }
    }
}

/// Host stand-in for the DHT22: replays a fixed reading or error.
#[cfg(not(target_os = "espidf"))]
pub struct SimEnvironment {
    pub next: Result<DhtReading, DhtError>,
}

#[cfg(not(target_os = "espidf"))]
impl SimEnvironment {
    pub fn new(temperature_c: f32, humidity_percent: f32) -> Self {
        Self {
            next: Ok(DhtReading {
                temperature_c,
                humidity_percent,
            }),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl EnvironmentSensor for SimEnvironment {
    fn read(&mut self) -> Result<DhtReading, DhtError> {
        self.next
    }
}
