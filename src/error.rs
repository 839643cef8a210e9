//! Unified error types for the HomeWatch firmware.
//!
//! Every variant is `Copy` so failures can be logged and carried inside
//! delivery outcomes without allocation.  Relay failures never leave a loop
//! iteration: the pipeline converts them into the next fallback tier.  Only
//! boot-time failures surface as [`Error`].

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Boot-time failures: peripheral bring-up and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

/// Transport-level failures reported by an [`HttpPort`](crate::app::ports::HttpPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    /// TCP connect was refused or the host was unreachable.
    ConnectFailed,
    /// Connect or socket read/write exceeded its timeout.
    Timeout,
    /// The request could not be written.
    WriteFailed,
    /// The response body could not be read.
    ReadFailed,
    /// The URL could not be handed to the HTTP client.
    InvalidUrl,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::WriteFailed => write!(f, "request write failed"),
            Self::ReadFailed => write!(f, "response read failed"),
            Self::InvalidUrl => write!(f, "invalid URL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// The allocator refused the requested capacity.
    AllocFailed { requested: usize },
    /// Growth would pass the configured image ceiling.
    LimitExceeded { limit: usize },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocFailed { requested } => write!(f, "allocation of {requested} bytes failed"),
            Self::LimitExceeded { limit } => write!(f, "image exceeds {limit} byte limit"),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Why a single download attempt (or the whole retry run) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    Net(NetError),
    /// Server answered with something other than 200.
    Status(u16),
    Buffer(BufferError),
    /// Stream ended before the declared length arrived.
    ShortRead { got: usize, expected: usize },
    /// Stream delivered more bytes than were asked for.
    Overrun,
    /// Stream ended cleanly without a single byte.
    Empty,
    /// No forward progress within the idle window.
    IdleTimeout { idle_ms: u64 },
    /// Every attempt failed; carries the last attempt's cause.
    Exhausted { attempts: u8, last: FetchFailure },
}

/// Non-recursive copy of the final per-attempt failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    Net(NetError),
    Status(u16),
    Buffer(BufferError),
    ShortRead,
    Overrun,
    Empty,
    IdleTimeout,
}

impl FetchError {
    pub(crate) fn failure(self) -> FetchFailure {
        match self {
            Self::Net(e) => FetchFailure::Net(e),
            Self::Status(code) => FetchFailure::Status(code),
            Self::Buffer(e) => FetchFailure::Buffer(e),
            Self::ShortRead { .. } => FetchFailure::ShortRead,
            Self::Overrun => FetchFailure::Overrun,
            Self::Empty => FetchFailure::Empty,
            Self::IdleTimeout { .. } => FetchFailure::IdleTimeout,
            Self::Exhausted { last, .. } => last,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Net(e) => write!(f, "{e}"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Buffer(e) => write!(f, "{e}"),
            Self::ShortRead { got, expected } => write!(f, "short read {got}/{expected}"),
            Self::Overrun => write!(f, "stream overran requested length"),
            Self::Empty => write!(f, "no data read from stream"),
            Self::IdleTimeout { idle_ms } => write!(f, "no progress for {idle_ms}ms"),
            Self::Exhausted { attempts, last } => {
                write!(f, "gave up after {attempts} attempts (last: {last:?})")
            }
        }
    }
}

impl From<NetError> for FetchError {
    fn from(e: NetError) -> Self {
        Self::Net(e)
    }
}

impl From<BufferError> for FetchError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}

// ---------------------------------------------------------------------------
// Multipart assembly errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleError {
    /// The contiguous body could not be allocated.
    AllocFailed { requested: usize },
    /// Every candidate boundary appeared inside the payload.
    BoundaryCollision,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocFailed { requested } => {
                write!(f, "multipart body allocation of {requested} bytes failed")
            }
            Self::BoundaryCollision => write!(f, "no collision-free boundary found"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
