//! busgate — gateway-resident RPC relay for an addressed module bus.
//!
//! A compute module sleeps until a GPIO interrupt signals that a bus peer
//! has queued a remote-procedure-call request. On wake the gateway fetches
//! the RPC descriptor from the storage peer, launches the requested host
//! process on the requester's behalf, supervises it to completion, and
//! suspends the host again once no work remains.
//!
//! The domain core (codec, client, RPC read protocol, supervisor, event
//! loop) sits behind port traits; Linux-specific adapters are gated by the
//! `linux-hw` feature so the core builds and tests on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod bus;
pub mod config;
pub mod error;
pub mod ports;
pub mod rpc;
pub mod service;
pub mod supervisor;
