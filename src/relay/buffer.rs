//! Growable receive buffer for image downloads.
//!
//! Capacity is managed explicitly instead of relying on `Vec`'s amortised
//! growth so that every reservation can fail gracefully on a fragmented
//! heap: when the length is declared the buffer is sized once; otherwise
//! it starts at a default capacity and doubles (or jumps straight to the
//! required size, whichever is larger) whenever incoming data would not
//! fit.  Growth past the configured ceiling is an error, not a panic.
//!
//! Dropping an [`ImageBuffer`] or a [`FetchedImage`] frees the allocation;
//! there is no other release path to forget.

use crate::error::BufferError;

/// Partially received image.  Owned by a single fetch attempt.
#[derive(Debug)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl ImageBuffer {
    /// Reserve exactly `capacity` bytes up front.
    pub fn with_capacity(capacity: usize, limit: usize) -> Result<Self, BufferError> {
        if capacity > limit {
            return Err(BufferError::LimitExceeded { limit });
        }
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| BufferError::AllocFailed { requested: capacity })?;
        Ok(Self { bytes, limit })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Make room for `additional` more bytes, preserving current contents.
    pub fn ensure_room(&mut self, additional: usize) -> Result<(), BufferError> {
        let needed = self
            .bytes
            .len()
            .checked_add(additional)
            .ok_or(BufferError::LimitExceeded { limit: self.limit })?;
        if needed > self.limit {
            return Err(BufferError::LimitExceeded { limit: self.limit });
        }
        let capacity = self.bytes.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let target = capacity.saturating_mul(2).max(needed).min(self.limit);
        self.bytes
            .try_reserve_exact(target - self.bytes.len())
            .map_err(|_| BufferError::AllocFailed { requested: target })?;
        log::debug!("Relay: buffer grown {} -> {} bytes", capacity, self.bytes.capacity());
        Ok(())
    }

    /// Append bytes, growing first if necessary.
    pub fn extend_from_slice(&mut self, chunk: &[u8]) -> Result<(), BufferError> {
        self.ensure_room(chunk.len())?;
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    /// Seal a complete download.
    pub fn finish(self) -> FetchedImage {
        FetchedImage { bytes: self.bytes }
    }
}

/// A complete image, exclusively owned until the multipart assembler
/// consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct FetchedImage {
    bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Wrap bytes received by other means (tests, fuzzing).
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}
