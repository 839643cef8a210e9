//! Scripted port doubles for integration tests.
//!
//! Every double records what the core asked of it so scenarios can assert
//! on the full request history.  The clock is virtual: `sleep_ms` advances
//! it, so backoff and spacing delays cost nothing and are observable.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use homewatch::app::events::AppEvent;
use homewatch::app::ports::{
    CapturePort, DashboardPort, EventSink, HttpPort, Metric, RequestTimeouts, ResponseHead, SamplePort, SensorSample,
    StreamRead, TimePort,
};
use homewatch::config::SystemConfig;
use homewatch::error::NetError;

pub const CAMERA_IP: &str = "10.28.158.71";
pub const CHAT_ID: &str = "12345";

/// Defaults with deterministic credentials and a LAN camera.
pub fn test_config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.telegram.bot_token = "42:TEST".into();
    c.telegram.chat_id = CHAT_ID.into();
    c.camera.ip = CAMERA_IP.into();
    c.camera.mock_mode = false;
    c
}

// ── HTTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Scripted answer to an image GET.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum ImageReply {
    /// 200 with `Content-Length`.
    Image(Vec<u8>),
    /// 200 without a length; the body ends when the stream closes.
    Unsized(Vec<u8>),
    Status(u16),
    Fail(NetError),
}

/// `HttpPort` that routes Telegram URLs (`/bot…`) to a status queue and
/// everything else to an image script.
pub struct ScriptedHttp {
    pub requests: Vec<Request>,
    image_replies: VecDeque<ImageReply>,
    default_image: ImageReply,
    telegram_statuses: VecDeque<u16>,
    method_statuses: Vec<(&'static str, VecDeque<u16>)>,
    post_statuses: VecDeque<u16>,
    open_body: Option<(Vec<u8>, usize)>,
}

#[allow(dead_code)]
impl ScriptedHttp {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            image_replies: VecDeque::new(),
            default_image: ImageReply::Fail(NetError::ConnectFailed),
            telegram_statuses: VecDeque::new(),
            method_statuses: Vec::new(),
            post_statuses: VecDeque::new(),
            open_body: None,
        }
    }

    /// Every image GET answers with `reply`.
    pub fn with_image(mut self, reply: ImageReply) -> Self {
        self.default_image = reply;
        self
    }

    /// Queue one image answer ahead of the default.
    pub fn then_image(mut self, reply: ImageReply) -> Self {
        self.image_replies.push_back(reply);
        self
    }

    /// Queue POST statuses; once drained every POST answers 200.
    pub fn with_post_statuses(mut self, statuses: &[u16]) -> Self {
        self.post_statuses.extend(statuses);
        self
    }

    /// Queue Telegram GET statuses; once drained every GET answers 200.
    pub fn with_telegram_statuses(mut self, statuses: &[u16]) -> Self {
        self.telegram_statuses.extend(statuses);
        self
    }

    /// Queue statuses for one Telegram method (`sendPhoto`, `sendMessage`).
    /// Checked before the shared Telegram queue.
    pub fn with_method_statuses(mut self, method: &'static str, statuses: &[u16]) -> Self {
        self.method_statuses.push((method, statuses.iter().copied().collect()));
        self
    }

    pub fn gets_matching(&self, needle: &str) -> Vec<&Request> {
        self.requests
            .iter()
            .filter(|r| r.method == Method::Get && r.url.contains(needle))
            .collect()
    }

    pub fn posts(&self) -> Vec<&Request> {
        self.requests.iter().filter(|r| r.method == Method::Post).collect()
    }

    /// Image GETs, excluding Telegram calls that embed the camera URL.
    pub fn camera_gets(&self) -> usize {
        self.gets_matching(CAMERA_IP)
            .iter()
            .filter(|r| !r.url.contains("/bot"))
            .count()
    }
}

impl HttpPort for ScriptedHttp {
    fn open_get(&mut self, url: &str, _timeouts: RequestTimeouts) -> Result<ResponseHead, NetError> {
        self.requests.push(Request {
            method: Method::Get,
            url: url.to_owned(),
            content_type: None,
            body: Vec::new(),
        });
        self.open_body = None;

        if url.contains("/bot") {
            let scripted = self
                .method_statuses
                .iter_mut()
                .find(|(method, _)| url.contains(&format!("/{method}?")))
                .and_then(|(_, queue)| queue.pop_front());
            let status = scripted
                .or_else(|| self.telegram_statuses.pop_front())
                .unwrap_or(200);
            return Ok(ResponseHead {
                status,
                content_length: Some(0),
            });
        }

        let reply = self
            .image_replies
            .pop_front()
            .unwrap_or_else(|| self.default_image.clone());
        match reply {
            ImageReply::Image(bytes) => {
                let len = bytes.len();
                self.open_body = Some((bytes, 0));
                Ok(ResponseHead {
                    status: 200,
                    content_length: Some(len),
                })
            }
            ImageReply::Unsized(bytes) => {
                self.open_body = Some((bytes, 0));
                Ok(ResponseHead {
                    status: 200,
                    content_length: None,
                })
            }
            ImageReply::Status(status) => Ok(ResponseHead {
                status,
                content_length: None,
            }),
            ImageReply::Fail(e) => Err(e),
        }
    }

    fn read_body(&mut self, buf: &mut [u8]) -> Result<StreamRead, NetError> {
        let Some((bytes, pos)) = self.open_body.as_mut() else {
            return Ok(StreamRead::Closed);
        };
        if *pos >= bytes.len() {
            return Ok(StreamRead::Closed);
        }
        let n = buf.len().min(bytes.len() - *pos);
        buf[..n].copy_from_slice(&bytes[*pos..*pos + n]);
        *pos += n;
        Ok(StreamRead::Data(n))
    }

    fn close(&mut self) {
        self.open_body = None;
    }

    fn post(&mut self, url: &str, content_type: &str, body: &[u8], _timeout_ms: u64) -> Result<u16, NetError> {
        self.requests.push(Request {
            method: Method::Post,
            url: url.to_owned(),
            content_type: Some(content_type.to_owned()),
            body: body.to_vec(),
        });
        Ok(self.post_statuses.pop_front().unwrap_or(200))
    }
}

// ── Dashboard ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDashboard {
    pub metrics: Vec<(Metric, f32)>,
    pub alerts: Vec<String>,
    pub online: bool,
}

impl RecordingDashboard {
    pub fn new() -> Self {
        Self {
            online: true,
            ..Self::default()
        }
    }
}

impl DashboardPort for RecordingDashboard {
    fn publish_metric(&mut self, metric: Metric, value: f32) -> bool {
        if self.online {
            self.metrics.push((metric, value));
        }
        self.online
    }

    fn publish_alert(&mut self, reason: &str, locator: Option<&str>) -> bool {
        if self.online {
            self.alerts.push(homewatch::adapters::mqtt::format_alert(reason, locator));
        }
        self.online
    }
}

// ── Camera ────────────────────────────────────────────────────

/// Replays a fixed capture result.
pub struct ScriptedCapture {
    pub reply: Option<String>,
    pub captures: u32,
}

#[allow(dead_code)]
impl ScriptedCapture {
    pub fn lan() -> Self {
        Self::returning(Some(&format!("http://{}/jpg", CAMERA_IP)))
    }

    pub fn returning(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_owned),
            captures: 0,
        }
    }
}

impl CapturePort for ScriptedCapture {
    fn capture(&mut self) -> Option<String> {
        self.captures += 1;
        self.reply.clone()
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// Yields queued readings, then repeats the last one.
pub struct ScriptedSensors {
    readings: VecDeque<(Option<f32>, Option<f32>)>,
    last: (Option<f32>, Option<f32>),
}

impl ScriptedSensors {
    pub fn new(readings: &[(Option<f32>, Option<f32>)]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
            last: (None, None),
        }
    }
}

impl SamplePort for ScriptedSensors {
    fn read_sample(&mut self) -> SensorSample {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        SensorSample {
            temperature_c: self.last.0,
            humidity_percent: self.last.1,
            timestamp_ms: 0,
        }
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Virtual clock: `sleep_ms` advances time and is recorded.
pub struct MockClock {
    now: Cell<u64>,
    pub sleeps: RefCell<Vec<u64>>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u64) -> Self {
        Self {
            now: Cell::new(ms),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn total_slept(&self) -> u64 {
        self.sleeps.borrow().iter().sum()
    }
}

impl TimePort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u64) {
        self.sleeps.borrow_mut().push(ms);
        self.advance(ms);
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

/// Multipart field value by name.
pub fn multipart_field<'a>(body: &'a [u8], content_type: &str, name: &str) -> Option<&'a [u8]> {
    let boundary = content_type.split("boundary=").nth(1)?;
    let delim = format!("--{boundary}");
    let marker = format!("name=\"{name}\"");
    let mut rest = body;
    while let Some(pos) = find(rest, delim.as_bytes()) {
        rest = &rest[pos + delim.len()..];
        let end = find(rest, delim.as_bytes()).unwrap_or(rest.len());
        let part = &rest[..end];
        if find(part, marker.as_bytes()).is_some() {
            let start = find(part, b"\r\n\r\n")? + 4;
            return Some(&part[start..part.len() - 2]);
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
