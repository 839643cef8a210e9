//! Photo relay: get motion evidence from the LAN camera to Telegram.
//!
//! ```text
//!   PhotoReference
//!        │
//!        ├─ private ─▶ ImageFetcher ─▶ MultipartPayload ─▶ NotificationUploader ──ok──▶ PhotoUploaded
//!        │                 │ fail            │ fail                 │ fail
//!        │                 ▼                 ▼                      ▼
//!        ├─ public ───────────────────▶ sendPhoto?photo=<url> ─────────────────ok──▶ PhotoUrlSent
//!        │                                   │ fail
//!        │                                   ▼
//!        └─ absent / unusable ─────────▶ sendMessage ───────────────ok──▶ TextOnly
//!                                            │ fail
//!                                            ▼
//!                                          Failed
//! ```
//!
//! Every tier degrades to the next; the worst case for an alert with a
//! photo is a text message.  Nothing here returns an error to the caller.

pub mod buffer;
pub mod fetcher;
pub mod multipart;
pub mod reference;
pub mod telegram;
pub mod uploader;

use log::{info, warn};

use crate::app::ports::{HttpPort, TimePort};
use crate::config::SystemConfig;
use fetcher::ImageFetcher;
use multipart::MultipartPayload;
use reference::PhotoReference;
use telegram::TelegramApi;
use uploader::{NotificationUploader, UploadOutcome};

/// Which tier finally carried the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Image bytes fetched from the LAN and uploaded.
    PhotoUploaded { attempts: u8 },
    /// Telegram was handed the locator and fetched it itself.
    PhotoUrlSent,
    /// Only the caption went out.
    TextOnly,
    /// Even the text send failed.
    Failed,
}

impl DeliveryOutcome {
    pub fn delivered(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

pub struct PhotoRelay {
    api: TelegramApi,
    fetcher: ImageFetcher,
    uploader: NotificationUploader,
    send_timeout_ms: u64,
}

impl PhotoRelay {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            api: TelegramApi::new(config.telegram.clone()),
            fetcher: ImageFetcher::new(config.fetch.clone()),
            uploader: NotificationUploader::new(config.upload.clone()),
            send_timeout_ms: config.upload.timeout_ms,
        }
    }

    /// Send a plain text notification.  True only on HTTP 200.
    pub fn send_text<H: HttpPort>(&self, http: &mut H, text: &str) -> bool {
        let url = self.api.send_message_url(text);
        match http.get_status(&url, self.send_timeout_ms) {
            Ok(200) => true,
            Ok(status) => {
                warn!("Relay: sendMessage answered HTTP {}", status);
                false
            }
            Err(e) => {
                warn!("Relay: sendMessage failed: {}", e);
                false
            }
        }
    }

    /// Ask Telegram to fetch `photo_url` itself.  True only on HTTP 200.
    pub fn send_photo_url<H: HttpPort>(&self, http: &mut H, photo_url: &str, caption: &str) -> bool {
        let url = self.api.send_photo_by_url(photo_url, caption);
        match http.get_status(&url, self.send_timeout_ms) {
            Ok(200) => true,
            Ok(status) => {
                warn!("Relay: sendPhoto(url) answered HTTP {}", status);
                false
            }
            Err(e) => {
                warn!("Relay: sendPhoto(url) failed: {}", e);
                false
            }
        }
    }

    /// Deliver `caption` with the best photo evidence `reference` allows.
    pub fn deliver<H, T>(&self, http: &mut H, clock: &T, caption: &str, reference: &PhotoReference) -> DeliveryOutcome
    where
        H: HttpPort,
        T: TimePort,
    {
        let Some(locator) = reference.locator() else {
            info!("Relay: no usable photo, sending text");
            return self.text_fallback(http, caption);
        };

        if locator.private {
            if let Some(outcome) = self.relay_private(http, clock, caption, &locator.url) {
                return outcome;
            }
            warn!("Relay: upload path exhausted, falling back to URL send");
        }

        if self.send_photo_url(http, &locator.url, caption) {
            return DeliveryOutcome::PhotoUrlSent;
        }
        warn!("Relay: URL send failed, falling back to text");
        self.text_fallback(http, caption)
    }

    fn relay_private<H, T>(&self, http: &mut H, clock: &T, caption: &str, url: &str) -> Option<DeliveryOutcome>
    where
        H: HttpPort,
        T: TimePort,
    {
        let fetched = match self.fetcher.fetch(http, clock, url) {
            Ok(f) => {
                if f.attempts > 1 {
                    info!("Relay: image fetch needed {} attempts", f.attempts);
                }
                f
            }
            Err(e) => {
                warn!("Relay: {}", e);
                return None;
            }
        };

        let payload = match MultipartPayload::assemble(self.api.chat_id(), caption, fetched.image, clock.now_ms()) {
            Ok(p) => p,
            Err(e) => {
                warn!("Relay: {}", e);
                return None;
            }
        };

        match self.uploader.upload(http, clock, &self.api.upload_photo_url(), payload) {
            UploadOutcome::Accepted { attempts } => {
                info!("Relay: photo uploaded (attempt {})", attempts);
                Some(DeliveryOutcome::PhotoUploaded { attempts })
            }
            UploadOutcome::Rejected { attempts, last_status } => {
                warn!("Relay: upload rejected after {} attempts (last status {:?})", attempts, last_status);
                None
            }
        }
    }

    fn text_fallback<H: HttpPort>(&self, http: &mut H, caption: &str) -> DeliveryOutcome {
        if self.send_text(http, caption) {
            DeliveryOutcome::TextOnly
        } else {
            DeliveryOutcome::Failed
        }
    }
}
