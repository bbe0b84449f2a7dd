//! Host power directive adapter.
//!
//! Entering low power is a single write of the configured state token to
//! the kernel's power-state interface (`echo mem > /sys/power/state`, as a
//! syscall). Fire-and-forget: there is no acknowledgment, and on resume
//! the write call simply returns.

use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::ports::PowerPort;

/// Kernel suspend interface.
pub const POWER_STATE_PATH: &str = "/sys/power/state";

/// Writes the suspend token to the kernel power-state file.
pub struct SysfsPowerControl {
    state_path: PathBuf,
    token: String,
}

impl SysfsPowerControl {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_path(POWER_STATE_PATH, token)
    }

    /// Alternate state file, for tests.
    pub fn with_path(path: impl Into<PathBuf>, token: impl Into<String>) -> Self {
        Self {
            state_path: path.into(),
            token: token.into(),
        }
    }
}

impl PowerPort for SysfsPowerControl {
    fn enter_low_power(&mut self) {
        // Failure is logged, never propagated: a gateway that cannot
        // suspend still services RPCs, it just draws more power.
        if let Err(e) = fs::write(&self.state_path, &self.token) {
            warn!(
                "power-down directive '{}' -> {} failed: {e}",
                self.token,
                self.state_path.display()
            );
        }
    }
}
