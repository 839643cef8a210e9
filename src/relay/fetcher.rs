//! Retrying streaming image downloader.
//!
//! ```text
//!   attempt 1 ──fail──▶ sleep 1×base ──▶ attempt 2 ──fail──▶ sleep 2×base ──▶ attempt 3
//!      │                                     │                                   │
//!      └──────────── ok ─────────────────────┴───────────── ok ──────────────────┴──▶ FetchedImage
//! ```
//!
//! Each attempt opens a fresh connection, sizes its buffer from the declared
//! `Content-Length` (or the default capacity when none is sent), and streams
//! the body in bounded chunks.  An attempt fails on any transport error, a
//! non-200 status, an allocation or ceiling failure, a short or overrun
//! read, or when no byte arrives for longer than the idle timeout.  The
//! partial buffer of a failed attempt is dropped before the next one starts.

use log::{info, warn};

use super::buffer::{FetchedImage, ImageBuffer};
use crate::app::ports::{HttpPort, RequestTimeouts, StreamRead, TimePort};
use crate::config::FetchPolicy;
use crate::error::FetchError;

/// Largest single read handed to the HTTP port.
pub const CHUNK_SIZE: usize = 1024;

/// Pause between polls while the stream has nothing available.
pub const POLL_DELAY_MS: u64 = 20;

/// A successful download and how many attempts it took.
#[derive(Debug)]
pub struct FetchSuccess {
    pub image: FetchedImage,
    pub attempts: u8,
}

pub type FetchOutcome = Result<FetchSuccess, FetchError>;

pub struct ImageFetcher {
    policy: FetchPolicy,
}

impl ImageFetcher {
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    /// Download `url`, retrying with linear backoff up to the attempt cap.
    pub fn fetch<H, T>(&self, http: &mut H, clock: &T, url: &str) -> FetchOutcome
    where
        H: HttpPort,
        T: TimePort,
    {
        let max = self.policy.max_attempts.max(1);
        let mut last = FetchError::Empty;

        for attempt in 1..=max {
            info!("Relay: fetching image (attempt {}/{})", attempt, max);
            match self.attempt(http, clock, url) {
                Ok(image) => {
                    info!("Relay: fetched {} bytes", image.len());
                    return Ok(FetchSuccess { image, attempts: attempt });
                }
                Err(e) => {
                    warn!("Relay: fetch attempt {} failed: {}", attempt, e);
                    last = e;
                    if attempt < max {
                        clock.sleep_ms(self.policy.backoff_base_ms * u64::from(attempt));
                    }
                }
            }
        }

        Err(FetchError::Exhausted {
            attempts: max,
            last: last.failure(),
        })
    }

    fn attempt<H, T>(&self, http: &mut H, clock: &T, url: &str) -> Result<FetchedImage, FetchError>
    where
        H: HttpPort,
        T: TimePort,
    {
        let timeouts = RequestTimeouts {
            socket_ms: self.policy.socket_timeout_ms,
            request_ms: self.policy.request_timeout_ms,
        };
        let head = http.open_get(url, timeouts)?;
        let result = if head.status == 200 {
            self.read_body(http, clock, head.content_length)
        } else {
            Err(FetchError::Status(head.status))
        };
        http.close();
        result
    }

    fn read_body<H, T>(
        &self,
        http: &mut H,
        clock: &T,
        declared: Option<usize>,
    ) -> Result<FetchedImage, FetchError>
    where
        H: HttpPort,
        T: TimePort,
    {
        let mut buf = match declared {
            Some(0) => return Err(FetchError::Empty),
            Some(len) => ImageBuffer::with_capacity(len, self.policy.max_image_bytes)?,
            None => ImageBuffer::with_capacity(
                self.policy.default_capacity,
                self.policy.max_image_bytes,
            )?,
        };

        let mut chunk = [0u8; CHUNK_SIZE];
        let mut last_progress_ms = clock.now_ms();

        loop {
            let want = match declared {
                Some(len) if buf.len() >= len => break,
                Some(len) => (len - buf.len()).min(CHUNK_SIZE),
                None => CHUNK_SIZE,
            };

            match http.read_body(&mut chunk[..want])? {
                StreamRead::Data(n) if n > want => return Err(FetchError::Overrun),
                StreamRead::Data(n) if n > 0 => {
                    buf.extend_from_slice(&chunk[..n])?;
                    last_progress_ms = clock.now_ms();
                }
                StreamRead::Data(_) | StreamRead::Pending => {
                    let idle_ms = clock.now_ms().saturating_sub(last_progress_ms);
                    if idle_ms > self.policy.idle_timeout_ms {
                        return Err(FetchError::IdleTimeout { idle_ms });
                    }
                    clock.sleep_ms(POLL_DELAY_MS);
                }
                StreamRead::Closed => match declared {
                    Some(expected) => {
                        return Err(FetchError::ShortRead {
                            got: buf.len(),
                            expected,
                        });
                    }
                    None => break,
                },
            }
        }

        if buf.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(buf.finish())
    }
}
