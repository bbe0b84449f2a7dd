//! Bus client — addressed send/receive bound to one local module address.
//!
//! The local address is an explicit constructor argument taken from
//! configuration; there is no implicit module-level default client.

use crate::bus::codec::{EdisonMessage, FrameType, Message, MessageType, ModuleAddress};
use crate::bus::transport::BusTransport;
use crate::error::Result;

/// A bus endpoint owned by this gateway.
pub struct BusClient<T: BusTransport> {
    transport: T,
    local: ModuleAddress,
}

impl<T: BusTransport> BusClient<T> {
    pub fn new(transport: T, local: ModuleAddress) -> Self {
        Self { transport, local }
    }

    /// The address this client stamps as the source of every send.
    pub fn local_address(&self) -> ModuleAddress {
        self.local
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build, validate, encode and transmit one message to `dest`.
    ///
    /// The payload bound (255 bytes) is enforced before transmission;
    /// transport failures surface unchanged.
    pub fn send(
        &mut self,
        dest: ModuleAddress,
        frame_type: FrameType,
        message_type: MessageType,
        payload: &[u8],
    ) -> Result<()> {
        let msg = Message::new(self.local, dest, frame_type, message_type, payload)?;
        self.transport.write(dest, &msg.encode())?;
        Ok(())
    }

    /// Raw bounded read from the peer at `from`.
    ///
    /// Returns the number of bytes placed in `buf`. No framing is assumed
    /// at this layer; callers interpret the bytes.
    pub fn read(&mut self, from: ModuleAddress, buf: &mut [u8]) -> Result<usize> {
        Ok(self.transport.read(from, buf)?)
    }

    /// Notify `dest` of a stored handle it should read (Edison API).
    ///
    /// Sent as a Notification: the peer owes no reply.
    pub fn send_read_handle(&mut self, dest: ModuleAddress, handle: &[u8; 8]) -> Result<()> {
        self.send(
            dest,
            FrameType::Notification,
            MessageType::Edison(EdisonMessage::ReadHandle),
            handle,
        )
    }
}
