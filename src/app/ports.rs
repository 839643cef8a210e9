//! Port traits: the hexagonal boundary between alert logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AlertOrchestrator / WeatherGate / PhotoRelay
//! ```
//!
//! Driven adapters (HTTP client, MQTT dashboard, camera, DHT22, clock, event
//! sinks) implement these traits.  The core consumes them via generics, so
//! it never touches the network stack or GPIO directly and every scenario
//! can be driven from host tests with scripted ports.

use crate::error::NetError;

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: system timer → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic uptime clock plus a blocking sleep.
///
/// The loops never read wall-clock time; every timestamp in the core is
/// uptime milliseconds.  Test clocks advance virtual time inside
/// [`sleep_ms`](TimePort::sleep_ms).
pub trait TimePort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the calling loop for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}

// ───────────────────────────────────────────────────────────────
// HTTP port (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// Timeouts for a single streaming GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    /// Connect and per-read socket timeout.
    pub socket_ms: u64,
    /// Whole-request timeout.
    pub request_ms: u64,
}

/// Status line and declared length of an opened response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    /// `Content-Length`, when the server advertised one.
    pub content_length: Option<usize>,
}

/// Result of one non-blocking body read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRead {
    /// `n` bytes were written to the front of the buffer.
    Data(usize),
    /// The connection is open but nothing is available yet.
    Pending,
    /// The peer closed the stream.
    Closed,
}

/// Blocking HTTP/1.x client with a single in-flight request.
///
/// A GET is driven in three steps: [`open_get`](HttpPort::open_get)
/// sends the request and reads the headers, [`read_body`](HttpPort::read_body)
/// streams the payload, [`close`](HttpPort::close) releases the connection.
/// Every request is sent with `Connection: close`.
pub trait HttpPort {
    /// Send a GET and return the response head.  The body is left unread.
    fn open_get(&mut self, url: &str, timeouts: RequestTimeouts) -> Result<ResponseHead, NetError>;

    /// Read the next chunk of the currently open response body.
    fn read_body(&mut self, buf: &mut [u8]) -> Result<StreamRead, NetError>;

    /// Drop the currently open response, if any.
    fn close(&mut self);

    /// POST `body` and return the response status.
    fn post(
        &mut self,
        url: &str,
        content_type: &str,
        body: &[u8],
        timeout_ms: u64,
    ) -> Result<u16, NetError>;

    /// GET `url`, discard the body and return the status.
    fn get_status(&mut self, url: &str, timeout_ms: u64) -> Result<u16, NetError> {
        let head = self.open_get(
            url,
            RequestTimeouts {
                socket_ms: timeout_ms,
                request_ms: timeout_ms,
            },
        );
        self.close();
        head.map(|h| h.status)
    }
}

// ───────────────────────────────────────────────────────────────
// Dashboard port (driven adapter: domain → telemetry broker)
// ───────────────────────────────────────────────────────────────

/// The two environmental metrics the device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
}

impl Metric {
    /// Unit suffix used in alert text.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "\u{00b0}C",
            Self::Humidity => "%",
        }
    }
}

/// Fire-and-forget dashboard publisher.
///
/// A `false` return is logged by the caller and otherwise ignored; the
/// core never retries a dashboard publish.
pub trait DashboardPort {
    /// Publish a numeric reading to the metric's feed.
    fn publish_metric(&mut self, metric: Metric, value: f32) -> bool;

    /// Publish an alert event with an optional photo locator.
    fn publish_alert(&mut self, reason: &str, locator: Option<&str>) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Capture port (driven adapter: camera → domain)
// ───────────────────────────────────────────────────────────────

/// Opaque camera trigger.
///
/// Returns either a bare URL or a small JSON document `{"url": "..."}`;
/// `None` when no capture could be made.
pub trait CapturePort {
    fn capture(&mut self) -> Option<String>;
}

// ───────────────────────────────────────────────────────────────
// Sample port (driven adapter: sensors → domain)
// ───────────────────────────────────────────────────────────────

/// One environmental reading.  `None` means "skip this metric this cycle".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub temperature_c: Option<f32>,
    pub humidity_percent: Option<f32>,
    /// Uptime at which the reading was taken.
    pub timestamp_ms: u64,
}

impl SensorSample {
    /// Build a sample from raw driver values, treating non-finite as invalid.
    pub fn from_raw(temperature_c: f32, humidity_percent: f32, timestamp_ms: u64) -> Self {
        Self {
            temperature_c: temperature_c.is_finite().then_some(temperature_c),
            humidity_percent: humidity_percent.is_finite().then_some(humidity_percent),
            timestamp_ms,
        }
    }

    /// Value for `metric`, if valid.
    pub fn value(&self, metric: Metric) -> Option<f32> {
        match metric {
            Metric::Temperature => self.temperature_c,
            Metric::Humidity => self.humidity_percent,
        }
    }
}

/// Read-side port: the sampling loop calls this once per period.
pub trait SamplePort {
    fn read_sample(&mut self) -> SensorSample;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
