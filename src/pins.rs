//! GPIO pin assignments for the HomeWatch sensor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// HC-SR501 PIR output.  Active HIGH, interrupt on rising edge.
/// Internal pull-down keeps the line low while the sensor warms up.
pub const PIR_GPIO: i32 = 15;

/// Settling time after configuring the PIR pin before arming the ISR (ms).
pub const PIR_SETTLE_MS: u32 = 50;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// DHT22 single-wire data line (open-drain, external 10 kΩ pull-up).
pub const DHT_GPIO: i32 = 4;

/// Power-on stabilisation before the first DHT22 read (ms).
pub const DHT_STABILIZE_MS: u32 = 5_000;
