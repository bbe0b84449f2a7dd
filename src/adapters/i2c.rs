//! I2C bus transport adapter.
//!
//! The module bus is I2C with each peer at a fixed 7-bit address, so the
//! addressed write/read primitives map one-to-one onto master transfers.
//! Generic over `embedded_hal::i2c::I2c`; the daemon instantiates it with
//! `linux_embedded_hal::I2cdev`.

use core::fmt::Debug;

use embedded_hal::i2c::I2c;

use crate::bus::codec::ModuleAddress;
use crate::bus::transport::BusTransport;
use crate::error::TransportError;

/// Addressed bus transport over an I2C master.
pub struct I2cBusTransport<I> {
    i2c: I,
}

impl<I> I2cBusTransport<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }
}

impl<I> BusTransport for I2cBusTransport<I>
where
    I: I2c,
    I::Error: Debug,
{
    fn write(&mut self, dest: ModuleAddress, frame: &[u8]) -> Result<(), TransportError> {
        self.i2c
            .write(dest.addr(), frame)
            .map_err(|e| TransportError::Write(format!("{e:?}")))
    }

    fn read(&mut self, from: ModuleAddress, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.i2c
            .read(from.addr(), buf)
            .map_err(|e| TransportError::Read(format!("{e:?}")))?;
        // An I2C master read fills the whole buffer; shorter peers pad.
        Ok(buf.len())
    }
}
