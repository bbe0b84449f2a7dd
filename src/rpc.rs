//! RPC read protocol — the two-step descriptor fetch from the storage peer.
//!
//! Step 1 sends a Notification (Processing / RpcReadPrepare, empty payload)
//! so the storage peer stages its buffer; there is no acknowledgment and
//! none is awaited. Step 2 performs the bounded raw read and parses the
//! bytes as an [`RpcDescriptor`].
//!
//! The protocol has no observable synchronization between the two steps.
//! The staging window is therefore an explicit, configured delay rather
//! than an incidental timing accident; see
//! [`GatewayConfig::stage_delay_ms`](crate::config::GatewayConfig).

use std::thread;
use std::time::Duration;

use crate::bus::client::BusClient;
use crate::bus::codec::{FrameType, MessageType, ModuleAddress, ProcessingMessage, MAX_PAYLOAD};
use crate::bus::transport::BusTransport;
use crate::error::{BusProtocolError, Result};

/// Separator between argv strings in an RPC payload.
const ARGV_SEPARATOR: u8 = 0;

// ---------------------------------------------------------------------------
// RPC descriptor
// ---------------------------------------------------------------------------

/// One decoded RPC request: who asked, and what to run.
///
/// Payload layout: first byte is the owning-user identifier, the remaining
/// bytes are NUL-separated UTF-8 argv strings. Never mutated after parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcDescriptor {
    /// Identifier attributing the spawned process to its bus requester.
    pub owning_user: u8,
    /// Program and arguments, in order. May be empty (see [`parse`]).
    ///
    /// [`parse`]: RpcDescriptor::parse
    pub argv: Vec<String>,
}

impl RpcDescriptor {
    /// Parse a raw RPC payload.
    ///
    /// An empty or single-byte payload yields an empty argv (owner 0 when
    /// even the owner byte is missing); whether that is actionable is the
    /// caller's decision. Non-UTF-8 argument bytes are a protocol error.
    pub fn parse(payload: &[u8]) -> std::result::Result<Self, BusProtocolError> {
        let (owning_user, args) = match payload.split_first() {
            Some((user, rest)) => (*user, rest),
            None => (0, &[][..]),
        };

        let mut argv = Vec::new();
        for chunk in args.split(|b| *b == ARGV_SEPARATOR) {
            if chunk.is_empty() {
                continue;
            }
            let arg = std::str::from_utf8(chunk)
                .map_err(|_| BusProtocolError::BadArgvEncoding)?;
            argv.push(arg.to_owned());
        }

        Ok(Self { owning_user, argv })
    }

    /// Serialize back to the payload layout. Used by peers and test
    /// fixtures; the gateway itself only parses.
    ///
    /// Rejects argv strings containing the NUL separator and payloads over
    /// the bus bound.
    pub fn encode(&self) -> std::result::Result<Vec<u8>, BusProtocolError> {
        let mut out = vec![self.owning_user];
        for (i, arg) in self.argv.iter().enumerate() {
            if arg.as_bytes().contains(&ARGV_SEPARATOR) {
                return Err(BusProtocolError::BadArgvEncoding);
            }
            if i > 0 {
                out.push(ARGV_SEPARATOR);
            }
            out.extend_from_slice(arg.as_bytes());
        }
        if out.len() > MAX_PAYLOAD {
            return Err(BusProtocolError::PayloadTooLong(out.len()));
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// The two-step read
// ---------------------------------------------------------------------------

/// Fetch the pending RPC descriptor from the storage peer.
///
/// The two steps are always performed together, never independently.
/// `stage_delay` is the documented buffer-staging window between the
/// prepare notification and the raw read; pass `Duration::ZERO` in tests.
pub fn read_rpc<T: BusTransport>(
    bus: &mut BusClient<T>,
    stage_delay: Duration,
) -> Result<RpcDescriptor> {
    // Step 1: let the storage peer stage its RPC buffer. Notification
    // frame, no reply to wait for.
    bus.send(
        ModuleAddress::Storage,
        FrameType::Notification,
        MessageType::Processing(ProcessingMessage::RpcReadPrepare),
        &[],
    )?;

    if !stage_delay.is_zero() {
        thread::sleep(stage_delay);
    }

    // Step 2: bounded raw read, interpreted as a descriptor.
    let mut buf = [0u8; MAX_PAYLOAD];
    let n = bus.read(ModuleAddress::Storage, &mut buf)?;
    Ok(RpcDescriptor::parse(&buf[..n])?)
}
