//! multipart/form-data body for the photo upload.
//!
//! ```text
//!   --B CRLF  name="chat_id"                          CRLF CRLF <chat id> CRLF
//!   --B CRLF  name="caption"                          CRLF CRLF <caption> CRLF
//!   --B CRLF  name="photo"; filename="image.jpg"
//!             Content-Type: image/jpeg                CRLF CRLF <jpeg>    CRLF
//!   --B-- CRLF
//! ```
//!
//! The body is a single contiguous allocation sized up front.  The boundary
//! is derived from uptime and re-derived with a suffix if it shows up
//! anywhere in the field contents.

use core::fmt::Write as _;

use super::buffer::FetchedImage;
use crate::error::AssembleError;

const BOUNDARY_PREFIX: &str = "----HomeWatchBoundary";
const MAX_BOUNDARY_TRIES: u8 = 8;

pub type Boundary = heapless::String<48>;

/// A fully built upload body.  Consumed once by the uploader.
#[derive(Debug)]
pub struct MultipartPayload {
    boundary: Boundary,
    content_type: String,
    body: Vec<u8>,
}

impl MultipartPayload {
    /// Copy the fields and `image` into one buffer.  `image` is released
    /// as soon as its bytes have been copied, whatever the outcome.
    pub fn assemble(
        chat_id: &str,
        caption: &str,
        image: FetchedImage,
        seed_ms: u64,
    ) -> Result<Self, AssembleError> {
        let boundary = pick_boundary(seed_ms, &[chat_id.as_bytes(), caption.as_bytes(), image.as_bytes()])?;

        let mut head = String::new();
        let _ = write!(
            head,
            "--{b}\r\nContent-Disposition: form-data; name=\"chat_id\"\r\n\r\n{chat_id}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\n{caption}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"image.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n",
            b = boundary,
        );
        let mut tail = String::new();
        let _ = write!(tail, "\r\n--{}--\r\n", boundary);

        let total = head.len() + image.len() + tail.len();
        let mut body = Vec::new();
        body.try_reserve_exact(total)
            .map_err(|_| AssembleError::AllocFailed { requested: total })?;
        body.extend_from_slice(head.as_bytes());
        body.extend_from_slice(image.as_bytes());
        drop(image);
        body.extend_from_slice(tail.as_bytes());

        let mut content_type = String::new();
        let _ = write!(content_type, "multipart/form-data; boundary={}", boundary);

        Ok(Self {
            boundary,
            content_type,
            body,
        })
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` request header.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

fn pick_boundary(seed_ms: u64, fields: &[&[u8]]) -> Result<Boundary, AssembleError> {
    for n in 0..MAX_BOUNDARY_TRIES {
        let mut candidate = Boundary::new();
        let _ = if n == 0 {
            write!(candidate, "{}{}", BOUNDARY_PREFIX, seed_ms)
        } else {
            write!(candidate, "{}{}-{}", BOUNDARY_PREFIX, seed_ms, n)
        };
        if !fields.iter().any(|f| contains(f, candidate.as_bytes())) {
            return Ok(candidate);
        }
        log::debug!("Relay: boundary '{}' collides with payload", candidate);
    }
    Err(AssembleError::BoundaryCollision)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}
