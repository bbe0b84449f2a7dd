//! Host process adapter over `std::process`.
//!
//! Spawns the requested argv directly as the daemon's own user. The
//! owning-user identity from the RPC descriptor is attribution only; no
//! privilege separation is applied. Known gap.

use std::process::{Child, Command};

use log::warn;

use crate::error::ProcessSpawnError;
use crate::ports::{ChildProcess, ProcessPort};

/// Spawns RPC processes via the host process-creation facility.
pub struct HostProcessSpawner;

impl ProcessPort for HostProcessSpawner {
    type Child = HostChild;

    fn spawn(&mut self, argv: &[String]) -> Result<HostChild, ProcessSpawnError> {
        let (program, args) = argv.split_first().ok_or(ProcessSpawnError::EmptyArgv)?;
        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|e| ProcessSpawnError::Host {
                program: program.clone(),
                message: e.to_string(),
            })?;
        Ok(HostChild(child))
    }
}

/// Handle to one spawned host process.
#[derive(Debug)]
pub struct HostChild(Child);

impl ChildProcess for HostChild {
    fn pid(&self) -> u32 {
        self.0.id()
    }

    fn try_wait(&mut self) -> Option<i32> {
        match self.0.try_wait() {
            Ok(Some(status)) => Some(status.code().unwrap_or(-1)),
            Ok(None) => None,
            Err(e) => {
                // Treated as still running; the next reap retries the poll.
                warn!("exit poll failed for pid {}: {e}", self.0.id());
                None
            }
        }
    }
}
