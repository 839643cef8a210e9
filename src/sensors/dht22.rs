//! DHT22 (AM2302) temperature / humidity sensor.
//!
//! Single-wire protocol on an open-drain pin with an external pull-up:
//!
//! ```text
//!  host  ▔▔╲____ ≥1 ms ____╱▔▔▔ release
//!  dht                      ╲__80µs__╱▔▔80µs▔▔╲  40 × ( ╲_50µs_╱▔▔ 26µs=0 | 70µs=1 ▔▔╲ )
//! ```
//!
//! Frame: humidity (u16, ×10), temperature (sign bit + 15-bit magnitude,
//! ×10), checksum = low byte of the sum of the first four bytes.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` 1.0 pins and delays: on ESP-IDF it runs on a
//! `PinDriver::input_output_od` with the `Ets` busy-wait delay; on host the
//! frame decoder is exercised directly.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Polling budget for any single level change (µs).
const EDGE_TIMEOUT_US: u32 = 100;
/// High pulses longer than this are 1 bits (µs).
const ONE_THRESHOLD_US: u32 = 40;
/// Host start signal (µs).
const START_LOW_US: u32 = 1_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtError {
    /// The sensor did not answer or a bit never finished.
    Timeout,
    /// Checksum mismatch.
    Checksum,
    /// The GPIO driver reported an error.
    Pin,
}

impl core::fmt::Display for DhtError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "no response"),
            Self::Checksum => write!(f, "checksum mismatch"),
            Self::Pin => write!(f, "GPIO error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhtReading {
    pub temperature_c: f32,
    pub humidity_percent: f32,
}

/// Decode a raw 5-byte frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<DhtReading, DhtError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(DhtError::Checksum);
    }
    let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
    let magnitude = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]) as f32 / 10.0;
    let temperature = if frame[2] & 0x80 != 0 { -magnitude } else { magnitude };
    Ok(DhtReading {
        temperature_c: temperature,
        humidity_percent: humidity,
    })
}

/// Source of combined temperature/humidity readings.
pub trait EnvironmentSensor {
    fn read(&mut self) -> Result<DhtReading, DhtError>;
}

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Take ownership of the data pin and leave the bus idle (high).
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_high();
        Self { pin, delay }
    }

    fn level(&mut self) -> Result<bool, DhtError> {
        self.pin.is_high().map_err(|_| DhtError::Pin)
    }

    /// Busy-wait until the line reads `high`; returns µs waited.
    fn wait_for(&mut self, high: bool) -> Result<u32, DhtError> {
        for elapsed in 0..EDGE_TIMEOUT_US {
            if self.level()? == high {
                return Ok(elapsed);
            }
            self.delay.delay_us(1);
        }
        Err(DhtError::Timeout)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], DhtError> {
        self.pin.set_low().map_err(|_| DhtError::Pin)?;
        self.delay.delay_us(START_LOW_US);
        self.pin.set_high().map_err(|_| DhtError::Pin)?;

        // Response: low 80 µs, high 80 µs.
        self.wait_for(false)?;
        self.wait_for(true)?;
        self.wait_for(false)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_for(true)?;
            let high_us = self.wait_for(false)?;
            if high_us > ONE_THRESHOLD_US {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }
}

impl<P, D> EnvironmentSensor for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read(&mut self) -> Result<DhtReading, DhtError> {
        let frame = self.read_frame();
        let _ = self.pin.set_high();
        decode_frame(frame?)
    }
}
