//! Gateway configuration.
//!
//! All tunable parameters for the daemon. Loaded from a JSON file when one
//! is given on the command line, otherwise defaults apply. The local bus
//! address lives here so client construction is explicit; there is no
//! hidden default client.

use serde::{Deserialize, Serialize};

use crate::bus::codec::ModuleAddress;

/// Core daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    // --- Bus ---
    /// Address this gateway binds on the module bus.
    pub local_address: ModuleAddress,
    /// I2C device node carrying the module bus.
    pub i2c_bus: String,

    // --- Interrupt ---
    /// GPIO line signalling "at least one RPC is pending".
    pub interrupt_gpio: u64,
    /// Poll interval while Sleeping (milliseconds).
    pub irq_poll_interval_ms: u64,

    // --- RPC read protocol ---
    /// Buffer-staging window between the prepare notification and the raw
    /// read (milliseconds). The protocol has no acknowledgment for staging;
    /// this delay is the explicit stand-in.
    pub stage_delay_ms: u64,

    // --- Event loop ---
    /// Backoff between Servicing iterations when no RPC is pending but
    /// processes are still running (milliseconds).
    pub idle_backoff_ms: u64,

    // --- Power ---
    /// Token written to the host power-state interface when idle.
    pub power_state: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            local_address: ModuleAddress::Gateway,
            i2c_bus: "/dev/i2c-1".to_owned(),

            // The pending-RPC line on the gateway carrier board.
            interrupt_gpio: 111,
            irq_poll_interval_ms: 100,

            stage_delay_ms: 5,
            idle_backoff_ms: 50,

            // Suspend-to-RAM.
            power_state: "mem".to_owned(),
        }
    }
}
