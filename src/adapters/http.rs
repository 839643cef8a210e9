//! HTTP client adapter.
//!
//! Implements [`HttpPort`] with one connection per request: every request
//! is sent with `Connection: close` and the connection is dropped by
//! [`close`](HttpPort::close) or by the next request.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with the ESP-IDF
//!   certificate bundle attached (Telegram is HTTPS, the camera is plain
//!   HTTP on the LAN).
//! - **all other targets**: simulation that serves a synthetic image for
//!   every GET and accepts every POST.

use log::debug;

use crate::app::ports::{HttpPort, RequestTimeouts, ResponseHead, StreamRead};
use crate::error::NetError;

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use core::time::Duration;

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use esp_idf_svc::sys::{ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT, EspError};

    use super::*;

    pub struct Connection {
        conn: Option<EspHttpConnection>,
    }

    impl Connection {
        pub fn new() -> Self {
            Self { conn: None }
        }

        fn connect(&mut self, timeout_ms: u64) -> Result<&mut EspHttpConnection, NetError> {
            self.conn = None;
            let config = Configuration {
                timeout: Some(Duration::from_millis(timeout_ms)),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                buffer_size: Some(2048),
                ..Default::default()
            };
            let conn = EspHttpConnection::new(&config).map_err(|_| NetError::ConnectFailed)?;
            Ok(self.conn.insert(conn))
        }

        fn map_response_err(e: EspError) -> NetError {
            if e.code() == ESP_ERR_TIMEOUT as i32 {
                NetError::Timeout
            } else {
                NetError::ReadFailed
            }
        }

        pub fn open_get(&mut self, url: &str, t: RequestTimeouts) -> Result<ResponseHead, NetError> {
            let conn = self.connect(t.socket_ms.min(t.request_ms))?;
            conn.initiate_request(Method::Get, url, &[("Connection", "close")])
                .map_err(|_| NetError::ConnectFailed)?;
            conn.initiate_response().map_err(Self::map_response_err)?;
            let content_length = conn
                .header("Content-Length")
                .and_then(|v| v.trim().parse::<usize>().ok());
            Ok(ResponseHead {
                status: conn.status(),
                content_length,
            })
        }

        pub fn read_body(&mut self, buf: &mut [u8]) -> Result<StreamRead, NetError> {
            let Some(conn) = self.conn.as_mut() else {
                return Ok(StreamRead::Closed);
            };
            match conn.read(buf) {
                Ok(0) => Ok(StreamRead::Closed),
                Ok(n) => Ok(StreamRead::Data(n)),
                Err(e) if e.code() == ESP_ERR_HTTP_EAGAIN as i32 => Ok(StreamRead::Pending),
                Err(e) => Err(Self::map_response_err(e)),
            }
        }

        pub fn close(&mut self) {
            self.conn = None;
        }

        pub fn post(&mut self, url: &str, content_type: &str, body: &[u8], timeout_ms: u64) -> Result<u16, NetError> {
            let len = body.len().to_string();
            let conn = self.connect(timeout_ms)?;
            let headers = [
                ("Content-Type", content_type),
                ("Content-Length", len.as_str()),
                ("Connection", "close"),
            ];
            conn.initiate_request(Method::Post, url, &headers)
                .map_err(|_| NetError::ConnectFailed)?;
            let mut written = 0;
            while written < body.len() {
                match conn.write(&body[written..]) {
                    Ok(0) | Err(_) => {
                        self.conn = None;
                        return Err(NetError::WriteFailed);
                    }
                    Ok(n) => written += n,
                }
            }
            conn.initiate_response().map_err(Self::map_response_err)?;
            let status = conn.status();
            self.conn = None;
            Ok(status)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use log::info;

    use super::*;

    /// Size of the synthetic JPEG served to every GET.
    pub const SIM_IMAGE_LEN: usize = 4096;

    pub struct Connection {
        remaining: usize,
        served: usize,
    }

    impl Connection {
        pub fn new() -> Self {
            Self { remaining: 0, served: 0 }
        }

        pub fn open_get(&mut self, url: &str, _t: RequestTimeouts) -> Result<ResponseHead, NetError> {
            info!("HTTP(sim): GET {}", super::redact(url));
            self.remaining = SIM_IMAGE_LEN;
            self.served = 0;
            Ok(ResponseHead {
                status: 200,
                content_length: Some(SIM_IMAGE_LEN),
            })
        }

        pub fn read_body(&mut self, buf: &mut [u8]) -> Result<StreamRead, NetError> {
            if self.remaining == 0 {
                return Ok(StreamRead::Closed);
            }
            let n = buf.len().min(self.remaining);
            for (i, b) in buf[..n].iter_mut().enumerate() {
                *b = ((self.served + i) % 251) as u8;
            }
            self.remaining -= n;
            self.served += n;
            Ok(StreamRead::Data(n))
        }

        pub fn close(&mut self) {
            self.remaining = 0;
        }

        pub fn post(&mut self, url: &str, content_type: &str, body: &[u8], _timeout_ms: u64) -> Result<u16, NetError> {
            info!("HTTP(sim): POST {} ({} bytes, {})", super::redact(url), body.len(), content_type);
            Ok(200)
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub use platform::SIM_IMAGE_LEN;

// ───────────────────────────────────────────────────────────────
// HttpPort
// ───────────────────────────────────────────────────────────────

/// Blocking HTTP client, one per loop.
pub struct HttpAdapter {
    inner: platform::Connection,
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAdapter {
    pub fn new() -> Self {
        Self {
            inner: platform::Connection::new(),
        }
    }
}

/// Strip the bot token from a Telegram URL before it reaches the log.
fn redact(url: &str) -> &str {
    match url.find("/bot") {
        Some(i) => &url[..i],
        None => url,
    }
}

/// The IDF client only speaks absolute http(s) URLs.
fn check_url(url: &str) -> Result<(), NetError> {
    match url.split_once("://") {
        Some((scheme, rest))
            if (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")) && !rest.is_empty() =>
        {
            Ok(())
        }
        _ => Err(NetError::InvalidUrl),
    }
}

impl HttpPort for HttpAdapter {
    fn open_get(&mut self, url: &str, timeouts: RequestTimeouts) -> Result<ResponseHead, NetError> {
        debug!("HTTP: GET {}", redact(url));
        check_url(url)?;
        let head = self.inner.open_get(url, timeouts);
        if let Err(e) = &head {
            self.inner.close();
            debug!("HTTP: GET failed: {}", e);
        }
        head
    }

    fn read_body(&mut self, buf: &mut [u8]) -> Result<StreamRead, NetError> {
        self.inner.read_body(buf)
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn post(&mut self, url: &str, content_type: &str, body: &[u8], timeout_ms: u64) -> Result<u16, NetError> {
        debug!("HTTP: POST {} ({} bytes)", redact(url), body.len());
        check_url(url)?;
        let status = self.inner.post(url, content_type, body, timeout_ms);
        if status.is_err() {
            self.inner.close();
        }
        status
    }
}
