//! Fixed-layout bus frame codec.
//!
//! Wire format:
//! ```text
//! ┌────────┬────────┬───────────┬─────────┬──────────┬────────┬─────────────┐
//! │ Source │ Dest   │ FrameType │ ApiType │ MsgType  │ Length │ Payload     │
//! │ 1 B    │ 1 B    │ 1 B       │ 1 B     │ 1 B      │ 1 B    │ 0–255 B     │
//! └────────┴────────┴───────────┴─────────┴──────────┴────────┴─────────────┘
//! ```
//!
//! All role and type tags are closed sets, matched exhaustively at decode
//! time. A message type tag is only meaningful under its owning API
//! category, so the (api, tag) pair is validated together, never
//! independently.

use serde::{Deserialize, Serialize};

use crate::error::BusProtocolError;

/// Maximum payload size per frame (the bus read/write bound).
pub const MAX_PAYLOAD: usize = 255;

/// Fixed header size: source, dest, frame type, API category, message type,
/// payload length.
pub const HEADER_LEN: usize = 6;

// ---------------------------------------------------------------------------
// Module addresses
// ---------------------------------------------------------------------------

/// Bus peer identities. Closed set, no dynamic registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModuleAddress {
    Controller = 0x20,
    Storage = 0x21,
    Radio = 0x22,
    /// The gateway's own default address.
    Gateway = 0x40,
}

impl ModuleAddress {
    /// Wire representation of this address.
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Parse an address byte. Anything outside the closed set is invalid.
    pub fn from_addr(b: u8) -> Result<Self, BusProtocolError> {
        match b {
            0x20 => Ok(Self::Controller),
            0x21 => Ok(Self::Storage),
            0x22 => Ok(Self::Radio),
            0x40 => Ok(Self::Gateway),
            other => Err(BusProtocolError::InvalidAddress(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame types
// ---------------------------------------------------------------------------

/// Frame semantics shared by all bus peers.
///
/// `Notification` carries no reply obligation; `Command`/`Response` form a
/// request/response pair; `Error` signals a protocol-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Notification = 0,
    Command = 1,
    Response = 2,
    Error = 3,
}

impl FrameType {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(b: u8) -> Result<Self, BusProtocolError> {
        match b {
            0 => Ok(Self::Notification),
            1 => Ok(Self::Command),
            2 => Ok(Self::Response),
            3 => Ok(Self::Error),
            other => Err(BusProtocolError::InvalidFrameType(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// API categories
// ---------------------------------------------------------------------------

/// Coarse API category. Scopes which message type tags are legal in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApiType {
    Initialization = 1,
    Storage = 2,
    Networking = 3,
    Processing = 4,
    Energy = 5,
    TimeLocation = 6,
    Edison = 7,
}

impl ApiType {
    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(b: u8) -> Result<Self, BusProtocolError> {
        match b {
            1 => Ok(Self::Initialization),
            2 => Ok(Self::Storage),
            3 => Ok(Self::Networking),
            4 => Ok(Self::Processing),
            5 => Ok(Self::Energy),
            6 => Ok(Self::TimeLocation),
            7 => Ok(Self::Edison),
            other => Err(BusProtocolError::InvalidApiType(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Message types (scoped per API category)
// ---------------------------------------------------------------------------

/// Message types under the Edison API category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EdisonMessage {
    /// Request a stored 8-byte handle.
    ReadHandle = 0,
    /// Request the pending RPC descriptor.
    ReadRpc = 1,
}

/// Message types under the Processing API category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessingMessage {
    /// Tells the storage peer to stage its RPC buffer before a raw read.
    RpcReadPrepare = 3,
    /// An RPC response is ready for collection.
    RpcResponseReady = 4,
}

/// A message type paired with its owning API category.
///
/// The pairing is the unit of validity: a bare tag means nothing without
/// its category, so construction and decoding always go through
/// [`MessageType::from_tag`] with both in hand. Categories the gateway does
/// not speak have no variants here and are rejected at decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Edison(EdisonMessage),
    Processing(ProcessingMessage),
}

impl MessageType {
    /// The API category that owns this message type.
    pub const fn api(self) -> ApiType {
        match self {
            Self::Edison(_) => ApiType::Edison,
            Self::Processing(_) => ApiType::Processing,
        }
    }

    /// Wire tag, meaningful only next to [`MessageType::api`].
    pub const fn tag(self) -> u8 {
        match self {
            Self::Edison(m) => m as u8,
            Self::Processing(m) => m as u8,
        }
    }

    /// Validate an (api, tag) pair together.
    pub fn from_tag(api: ApiType, tag: u8) -> Result<Self, BusProtocolError> {
        match (api, tag) {
            (ApiType::Edison, 0) => Ok(Self::Edison(EdisonMessage::ReadHandle)),
            (ApiType::Edison, 1) => Ok(Self::Edison(EdisonMessage::ReadRpc)),
            (ApiType::Processing, 3) => Ok(Self::Processing(ProcessingMessage::RpcReadPrepare)),
            (ApiType::Processing, 4) => Ok(Self::Processing(ProcessingMessage::RpcResponseReady)),
            (api, tag) => Err(BusProtocolError::InvalidMessageType { api, tag }),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One addressed bus message. Constructed per send, serialized immediately,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub source: ModuleAddress,
    pub dest: ModuleAddress,
    pub frame_type: FrameType,
    pub message_type: MessageType,
    /// Payload, bounded at [`MAX_PAYLOAD`] by construction.
    payload: heapless::Vec<u8, MAX_PAYLOAD>,
}

impl Message {
    /// Build a message, enforcing the payload bound up front. A payload
    /// over 255 bytes is rejected before it can reach the transport.
    pub fn new(
        source: ModuleAddress,
        dest: ModuleAddress,
        frame_type: FrameType,
        message_type: MessageType,
        payload: &[u8],
    ) -> Result<Self, BusProtocolError> {
        let payload = heapless::Vec::from_slice(payload)
            .map_err(|()| BusProtocolError::PayloadTooLong(payload.len()))?;
        Ok(Self {
            source,
            dest,
            frame_type,
            message_type,
            payload,
        })
    }

    /// API category, always consistent with the message type.
    pub const fn api_type(&self) -> ApiType {
        self.message_type.api()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serialize into one wire frame.
    ///
    /// Infallible: the payload bound is enforced at construction, so every
    /// `Message` that exists has a valid encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.push(self.source.addr());
        out.push(self.dest.addr());
        out.push(self.frame_type.tag());
        out.push(self.api_type().tag());
        out.push(self.message_type.tag());
        out.push(self.payload.len() as u8);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse one wire frame.
    ///
    /// Rejects truncated input and input whose declared payload length
    /// disagrees with the bytes actually present (in either direction).
    pub fn decode(bytes: &[u8]) -> Result<Self, BusProtocolError> {
        if bytes.len() < HEADER_LEN {
            return Err(BusProtocolError::Truncated {
                needed: HEADER_LEN,
                got: bytes.len(),
            });
        }

        let source = ModuleAddress::from_addr(bytes[0])?;
        let dest = ModuleAddress::from_addr(bytes[1])?;
        let frame_type = FrameType::from_tag(bytes[2])?;
        let api = ApiType::from_tag(bytes[3])?;
        let message_type = MessageType::from_tag(api, bytes[4])?;

        let declared = bytes[5] as usize;
        let available = bytes.len() - HEADER_LEN;
        if declared != available {
            return Err(BusProtocolError::LengthMismatch {
                declared,
                available,
            });
        }

        Self::new(
            source,
            dest,
            frame_type,
            message_type,
            &bytes[HEADER_LEN..],
        )
    }
}
