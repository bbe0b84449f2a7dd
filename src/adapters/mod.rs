//! Adapters — concrete port implementations for the gateway host.
//!
//! The I2C transport is generic over `embedded-hal` and compiles anywhere;
//! the sysfs GPIO adapter needs a Linux host and is gated behind the
//! `linux-hw` feature. Process and power adapters are plain std.

pub mod i2c;
pub mod power;
pub mod process;

#[cfg(feature = "linux-hw")]
pub mod gpio;
