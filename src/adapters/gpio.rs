//! Sysfs GPIO interrupt line adapter.
//!
//! The carrier board routes the "RPC pending" signal to a GPIO the kernel
//! exposes through sysfs. The line is level-asserted while work is queued,
//! so Sleeping polls it at a relaxed interval rather than registering an
//! edge handler; the host is suspended between polls anyway.

use std::thread;
use std::time::Duration;

use linux_embedded_hal::sysfs_gpio::{Direction, Pin};

use crate::error::GpioError;
use crate::ports::InterruptPort;

/// RPC-pending interrupt line read through `/sys/class/gpio`.
pub struct SysfsInterruptLine {
    pin: Pin,
    poll_interval: Duration,
}

impl SysfsInterruptLine {
    /// Export and configure `line` as an input.
    pub fn new(line: u64, poll_interval: Duration) -> Result<Self, GpioError> {
        let pin = Pin::new(line);
        pin.export()
            .map_err(|e| GpioError::Setup(e.to_string()))?;
        pin.set_direction(Direction::In)
            .map_err(|e| GpioError::Setup(e.to_string()))?;
        Ok(Self { pin, poll_interval })
    }
}

impl InterruptPort for SysfsInterruptLine {
    fn is_asserted(&mut self) -> Result<bool, GpioError> {
        let value = self
            .pin
            .get_value()
            .map_err(|e| GpioError::Unreadable(e.to_string()))?;
        Ok(value != 0)
    }

    fn wait_for_assert(&mut self) -> Result<(), GpioError> {
        loop {
            if self.is_asserted()? {
                return Ok(());
            }
            thread::sleep(self.poll_interval);
        }
    }
}
