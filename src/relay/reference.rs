//! Photo reference resolution.
//!
//! The camera hands back either a bare URL or a small JSON document with a
//! `url` field.  This module turns that into a [`PhotoReference`] and decides
//! whether the locator is reachable from the public internet or only from
//! the device's own LAN.
//!
//! Reachability is a literal host-prefix test against the reserved IPv4
//! ranges.  A hostname that resolves to a private address is classified as
//! public.

use serde::Deserialize;

/// A usable photo locator and its reachability class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub url: String,
    /// Host falls in 10/8, 172.16/12, 192.168/16 or 127/8.
    pub private: bool,
}

impl Locator {
    fn classify(url: &str) -> Self {
        let trimmed = url.trim();
        Self {
            url: trimmed.to_owned(),
            private: is_private_host(host_of(trimmed)),
        }
    }

    /// Only absolute http(s) locators can be fetched or forwarded.
    pub fn is_usable(&self) -> bool {
        let scheme_ok = self
            .url
            .split_once("://")
            .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"));
        scheme_ok && !host_of(&self.url).is_empty()
    }
}

/// What the capture step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoReference {
    /// Capture failed or returned nothing.
    Absent,
    /// A bare locator string.
    Direct(Locator),
    /// A structured document; `extracted` is `None` when it was malformed
    /// or had no locator field.
    Structured {
        raw: String,
        extracted: Option<Locator>,
    },
}

impl PhotoReference {
    /// The locator the relay should act on, if any.
    pub fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Absent => None,
            Self::Direct(loc) => Some(loc),
            Self::Structured { extracted, .. } => extracted.as_ref(),
        }
        .filter(|loc| loc.is_usable())
    }
}

#[derive(Deserialize)]
struct CaptureDocument {
    url: Option<String>,
}

/// Derive a [`PhotoReference`] from a raw capture result.  Never fails.
pub fn resolve(capture: Option<&str>) -> PhotoReference {
    let Some(raw) = capture.map(str::trim).filter(|s| !s.is_empty()) else {
        return PhotoReference::Absent;
    };

    if raw.starts_with('{') {
        let extracted = match serde_json::from_str::<CaptureDocument>(raw) {
            Ok(doc) => doc
                .url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(Locator::classify),
            Err(e) => {
                log::warn!("Relay: malformed capture document ({})", e);
                None
            }
        };
        return PhotoReference::Structured {
            raw: raw.to_owned(),
            extracted,
        };
    }

    PhotoReference::Direct(Locator::classify(raw))
}

/// Host portion of a URL: after `://` (if present) up to the first `/`,
/// with any port, userinfo, query or fragment removed.
pub fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    host_port.split(':').next().unwrap_or_default()
}

/// Literal string-prefix test against the reserved IPv4 ranges.
pub fn is_private_host(host: &str) -> bool {
    if host.starts_with("10.") || host.starts_with("192.168.") || host.starts_with("127.") {
        return true;
    }
    if let Some(rest) = host.strip_prefix("172.") {
        let second = rest.split('.').next().unwrap_or_default();
        return !second.is_empty()
            && rest.len() > second.len()
            && second.parse::<u8>().is_ok_and(|o| (16..=31).contains(&o));
    }
    false
}
