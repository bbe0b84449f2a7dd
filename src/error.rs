//! Unified error types for the gateway daemon.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! event loop's error handling uniform. The split matters to the loop:
//! protocol and spawn failures abort one RPC attempt, transport and GPIO
//! failures abort the whole servicing cycle.

use std::fmt;

use crate::bus::codec::ApiType;

// ---------------------------------------------------------------------------
// Top-level daemon error
// ---------------------------------------------------------------------------

/// Every fallible operation in the daemon funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A bus frame or RPC payload was malformed.
    Protocol(BusProtocolError),
    /// The underlying bus transport failed.
    Transport(TransportError),
    /// The interrupt line could not be read.
    Gpio(GpioError),
    /// The host refused or failed to create a requested process.
    Spawn(ProcessSpawnError),
}

impl Error {
    /// Whether this error must abort the current servicing cycle.
    ///
    /// A dead bus or interrupt line means the loop cannot safely keep
    /// dispatching; a bad frame or a failed spawn only loses one RPC.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Gpio(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Spawn(e) => write!(f, "spawn: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus protocol errors
// ---------------------------------------------------------------------------

/// A frame or RPC payload that cannot be interpreted.
///
/// These abort only the RPC attempt they occurred in; the event loop logs
/// them and keeps draining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusProtocolError {
    /// Fewer bytes than a complete frame header.
    Truncated { needed: usize, got: usize },
    /// Declared payload length disagrees with the bytes available.
    LengthMismatch { declared: usize, available: usize },
    /// Payload exceeds the 255-byte bus read/write bound.
    PayloadTooLong(usize),
    /// Address byte outside the closed module set.
    InvalidAddress(u8),
    /// Unknown frame type tag.
    InvalidFrameType(u8),
    /// Unknown API category tag.
    InvalidApiType(u8),
    /// Message type tag not valid under its API category.
    InvalidMessageType { api: ApiType, tag: u8 },
    /// RPC argument bytes are not valid UTF-8.
    BadArgvEncoding,
}

impl fmt::Display for BusProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, got } => {
                write!(f, "truncated frame: need {needed} bytes, got {got}")
            }
            Self::LengthMismatch {
                declared,
                available,
            } => write!(
                f,
                "payload length mismatch: declared {declared}, available {available}"
            ),
            Self::PayloadTooLong(len) => write!(f, "payload too long: {len} bytes (max 255)"),
            Self::InvalidAddress(b) => write!(f, "invalid module address 0x{b:02x}"),
            Self::InvalidFrameType(b) => write!(f, "invalid frame type tag {b}"),
            Self::InvalidApiType(b) => write!(f, "invalid API category tag {b}"),
            Self::InvalidMessageType { api, tag } => {
                write!(f, "message type tag {tag} not valid under {api:?} API")
            }
            Self::BadArgvEncoding => write!(f, "RPC argv bytes are not valid UTF-8"),
        }
    }
}

impl std::error::Error for BusProtocolError {}

impl From<BusProtocolError> for Error {
    fn from(e: BusProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Underlying bus read/write failure. Never retried internally; retry policy
/// belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Addressed write to a peer failed.
    Write(String),
    /// Addressed read from a peer failed.
    Read(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(msg) => write!(f, "bus write failed: {msg}"),
            Self::Read(msg) => write!(f, "bus read failed: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

/// Interrupt line failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// Exporting or configuring the line failed.
    Setup(String),
    /// The line value could not be read.
    Unreadable(String),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(msg) => write!(f, "interrupt line setup failed: {msg}"),
            Self::Unreadable(msg) => write!(f, "interrupt line unreadable: {msg}"),
        }
    }
}

impl std::error::Error for GpioError {}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// Process spawn errors
// ---------------------------------------------------------------------------

/// The host refused or failed to create a process. The offending RPC is
/// dropped, not retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessSpawnError {
    /// The RPC descriptor carried no program to run.
    EmptyArgv,
    /// The host process-creation facility failed.
    Host { program: String, message: String },
}

impl fmt::Display for ProcessSpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyArgv => write!(f, "RPC descriptor has an empty argument vector"),
            Self::Host { program, message } => {
                write!(f, "failed to start '{program}': {message}")
            }
        }
    }
}

impl std::error::Error for ProcessSpawnError {}

impl From<ProcessSpawnError> for Error {
    fn from(e: ProcessSpawnError) -> Self {
        Self::Spawn(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Daemon-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
