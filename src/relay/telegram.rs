//! Telegram Bot API endpoints.
//!
//! Text and URL-photo sends are plain GETs with query parameters; the photo
//! upload is a multipart POST to `sendPhoto`.

use core::fmt::Write as _;

use crate::config::TelegramConfig;

/// Percent-encode a query value.  Space becomes `+`; ASCII alphanumerics
/// and `-_.~` pass through; every other byte becomes `%XX`.
pub fn url_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for b in input.bytes() {
        match b {
            b' ' => out.push('+'),
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                let _ = write!(out, "%{:02X}", b);
            }
        }
    }
    out
}

/// URL builder bound to one bot and one chat.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    config: TelegramConfig,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Self {
        Self { config }
    }

    pub fn chat_id(&self) -> &str {
        &self.config.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// `sendMessage` GET for a text notification.
    pub fn send_message_url(&self, text: &str) -> String {
        format!(
            "{}?chat_id={}&text={}",
            self.method_url("sendMessage"),
            url_encode(&self.config.chat_id),
            url_encode(text)
        )
    }

    /// `sendPhoto` GET that lets Telegram fetch a public image itself.
    pub fn send_photo_by_url(&self, photo_url: &str, caption: &str) -> String {
        format!(
            "{}?chat_id={}&photo={}&caption={}",
            self.method_url("sendPhoto"),
            url_encode(&self.config.chat_id),
            url_encode(photo_url),
            url_encode(caption)
        )
    }

    /// `sendPhoto` endpoint for the multipart upload.
    pub fn upload_photo_url(&self) -> String {
        self.method_url("sendPhoto")
    }
}
