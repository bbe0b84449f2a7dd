//! Addressed, framed messaging on the internal module bus.
//!
//! Layering, bottom up:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ BusClient (addressed send)   │  bus::client
//! ├──────────────────────────────┤
//! │ Message codec (fixed frame)  │  bus::codec
//! ├──────────────────────────────┤
//! │ BusTransport (raw bytes)     │  bus::transport
//! └──────────────────────────────┘
//! ```

pub mod client;
pub mod codec;
pub mod transport;
