//! Gateway service — the interrupt-driven event loop.
//!
//! Two states:
//!
//! ```text
//!          interrupt asserted
//! Sleeping ──────────────────▶ Servicing
//!    ▲                            │
//!    └────────────────────────────┘
//!      active set empty AND no interrupt
//!      (side effect: host low-power directive)
//! ```
//!
//! While Servicing, the loop drains pending RPCs in the order their
//! interrupt assertions are observed, spawning one managed process per RPC,
//! and reaps finished processes. All I/O flows through ports injected at
//! the call sites, so the whole loop runs against mocks in host tests.

use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::bus::client::BusClient;
use crate::bus::transport::BusTransport;
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::ports::{ChildProcess, InterruptPort, PowerPort, ProcessPort};
use crate::rpc;
use crate::supervisor::{ProcState, ProcessSupervisor};

// ───────────────────────────────────────────────────────────────
// Cycle statistics
// ───────────────────────────────────────────────────────────────

/// Counters for one Servicing episode, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Processes spawned this cycle.
    pub spawned: usize,
    /// Processes observed exiting this cycle.
    pub reaped: usize,
    /// RPCs dropped (malformed, empty, or spawn-refused).
    pub dropped: usize,
}

// ───────────────────────────────────────────────────────────────
// GatewayService
// ───────────────────────────────────────────────────────────────

/// Owns the process supervisor and drives the Sleeping/Servicing cycle.
///
/// Single logical thread, cooperative polling: the only blocking point is
/// the Sleeping wait on the interrupt port. Everything else returns
/// promptly and runs synchronously within the loop.
pub struct GatewayService<P: ProcessPort> {
    supervisor: ProcessSupervisor<P>,
    /// Buffer-staging window between the RPC prepare notification and the
    /// raw read.
    stage_delay: Duration,
    /// Backoff between Servicing iterations when no RPC is pending but
    /// processes are still running. Keeps the loop off a tight spin.
    idle_backoff: Duration,
}

impl<P: ProcessPort> GatewayService<P> {
    pub fn new(spawner: P, config: &GatewayConfig) -> Self {
        Self {
            supervisor: ProcessSupervisor::new(spawner),
            stage_delay: Duration::from_millis(config.stage_delay_ms),
            idle_backoff: Duration::from_millis(config.idle_backoff_ms),
        }
    }

    /// The permanent daemon body. Never returns by itself; an `Err` means
    /// the bus or the interrupt line died and the outer supervisor should
    /// restart or abort.
    pub fn run(
        &mut self,
        bus: &mut BusClient<impl BusTransport>,
        irq: &mut impl InterruptPort,
        power: &mut impl PowerPort,
    ) -> Result<()> {
        loop {
            info!("sleeping, waiting for RPC interrupt");
            irq.wait_for_assert().map_err(Error::Gpio)?;
            info!("woke up, servicing RPCs");

            let stats = self.service(bus, irq)?;
            info!(
                "done servicing RPCs ({} spawned, {} reaped, {} dropped), going back to sleep",
                stats.spawned, stats.reaped, stats.dropped
            );

            power.enter_low_power();
        }
    }

    /// One Servicing episode.
    ///
    /// Repeats until the active process set is empty and no interrupt is
    /// asserted. Protocol and spawn failures drop one RPC and continue;
    /// transport and GPIO failures abort the episode.
    pub fn service(
        &mut self,
        bus: &mut BusClient<impl BusTransport>,
        irq: &mut impl InterruptPort,
    ) -> Result<CycleStats> {
        let mut stats = CycleStats::default();

        loop {
            // 1. Consume one pending RPC, if any.
            let pending = irq.is_asserted().map_err(Error::Gpio)?;
            if pending {
                self.dispatch_one(bus, &mut stats)?;
            }

            // 2. Reap processes that finished since the last check.
            for proc in self.supervisor.reap() {
                let code = match proc.state {
                    ProcState::Exited(code) => code,
                    ProcState::Running => continue, // reap never returns these
                };
                info!(
                    "process pid {} (user {}) finished with code {}, removing from list",
                    proc.handle.pid(),
                    proc.owning_user,
                    code
                );
                stats.reaped += 1;
            }

            // 3. Idle means back to sleep.
            if self.supervisor.is_empty() && !irq.is_asserted().map_err(Error::Gpio)? {
                return Ok(stats);
            }

            if !pending && !self.idle_backoff.is_zero() {
                thread::sleep(self.idle_backoff);
            }
        }
    }

    /// Fetch one RPC descriptor and hand it to the supervisor.
    ///
    /// Only fatal errors propagate; everything else is logged and counted
    /// as a dropped RPC.
    fn dispatch_one(
        &mut self,
        bus: &mut BusClient<impl BusTransport>,
        stats: &mut CycleStats,
    ) -> Result<()> {
        let desc = match rpc::read_rpc(bus, self.stage_delay) {
            Ok(desc) => desc,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("malformed RPC, skipping: {e}");
                stats.dropped += 1;
                return Ok(());
            }
        };

        if desc.argv.is_empty() {
            warn!("RPC from user {} has no arguments, dropping", desc.owning_user);
            stats.dropped += 1;
            return Ok(());
        }

        match self.supervisor.spawn(desc.owning_user, &desc.argv) {
            Ok(pid) => {
                info!(
                    "process {:?} started for user {} with pid {}",
                    desc.argv, desc.owning_user, pid
                );
                stats.spawned += 1;
            }
            Err(e) => {
                // Dropped, not retried. The process was never created.
                warn!("RPC from user {} dropped: {e}", desc.owning_user);
                stats.dropped += 1;
            }
        }
        Ok(())
    }

    /// Processes currently being supervised.
    pub fn active_processes(&self) -> usize {
        self.supervisor.active_count()
    }
}
