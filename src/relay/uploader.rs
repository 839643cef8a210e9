//! Retrying multipart POST to the photo endpoint.

use log::{info, warn};

use super::multipart::MultipartPayload;
use crate::app::ports::{HttpPort, TimePort};
use crate::config::UploadPolicy;

/// Result of an upload run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted { attempts: u8 },
    Rejected { attempts: u8, last_status: Option<u16> },
}

pub struct NotificationUploader {
    policy: UploadPolicy,
}

impl NotificationUploader {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    /// POST `payload` until the endpoint answers 200 or the cap is hit.
    /// The payload is consumed and freed on return.
    pub fn upload<H, T>(&self, http: &mut H, clock: &T, url: &str, payload: MultipartPayload) -> UploadOutcome
    where
        H: HttpPort,
        T: TimePort,
    {
        let max = self.policy.max_attempts.max(1);
        let mut last_status = None;

        for attempt in 1..=max {
            info!("Relay: uploading {} bytes (attempt {}/{})", payload.len(), attempt, max);
            match http.post(url, payload.content_type(), payload.as_bytes(), self.policy.timeout_ms) {
                Ok(200) => return UploadOutcome::Accepted { attempts: attempt },
                Ok(status) => {
                    warn!("Relay: upload answered HTTP {}", status);
                    last_status = Some(status);
                }
                Err(e) => warn!("Relay: upload failed: {}", e),
            }
            if attempt < max {
                clock.sleep_ms(self.policy.backoff_base_ms * u64::from(attempt));
            }
        }

        UploadOutcome::Rejected {
            attempts: max,
            last_status,
        }
    }
}
