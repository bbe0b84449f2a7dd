//! Bus transport abstraction — any addressed byte channel.
//!
//! Concrete implementations:
//! - I2C master on the gateway's internal module bus
//! - in-memory mocks for host tests
//!
//! The bus client is generic over `BusTransport`, so swapping the physical
//! bus requires zero changes to the protocol logic.

use crate::bus::codec::ModuleAddress;
use crate::error::TransportError;

/// Addressed byte-oriented bus channel.
///
/// Failures surface as [`TransportError`] and are not retried here; retry
/// policy belongs to the caller.
pub trait BusTransport {
    /// Transmit `frame` to the peer at `dest`.
    fn write(&mut self, dest: ModuleAddress, frame: &[u8]) -> Result<(), TransportError>;

    /// Raw bounded read from the peer at `from`, filling up to `buf.len()`
    /// bytes. Returns the number of bytes read. The bytes are not required
    /// to form a well-formed frame; interpretation belongs to higher layers.
    fn read(&mut self, from: ModuleAddress, buf: &mut [u8]) -> Result<usize, TransportError>;
}
