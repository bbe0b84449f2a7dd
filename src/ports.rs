//! Port traits — the boundary between the gateway core and the host.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GatewayService (domain)
//! ```
//!
//! Driven adapters (interrupt line, power control, process creation)
//! implement these traits. The event loop consumes them via generics, so
//! the core never touches hardware or the OS directly and runs unchanged
//! against mocks in host tests. The bus has its own port,
//! [`BusTransport`](crate::bus::transport::BusTransport).

use crate::error::{GpioError, ProcessSpawnError};

// ───────────────────────────────────────────────────────────────
// Interrupt port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The RPC-pending interrupt line.
///
/// Asserted means "at least one RPC is queued on the bus". The line stays
/// asserted while work is pending, so the loop can poll it level-wise to
/// drain a burst.
pub trait InterruptPort {
    /// Sample the line once, non-blocking.
    fn is_asserted(&mut self) -> Result<bool, GpioError>;

    /// Block until the line is asserted. This is the Sleeping state's only
    /// activity.
    fn wait_for_assert(&mut self) -> Result<(), GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Power port (driven adapter: domain → host power management)
// ───────────────────────────────────────────────────────────────

/// Host low-power control.
pub trait PowerPort {
    /// Issue the "enter low-power state" directive.
    ///
    /// Fire-and-forget with no acknowledgment; implementations log failures
    /// rather than propagate them, since the loop sleeps either way.
    fn enter_low_power(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Process port (driven adapter: domain → OS process control)
// ───────────────────────────────────────────────────────────────

/// Creates host processes on behalf of bus peers.
///
/// No sandboxing or privilege separation is applied here; the requester's
/// argv goes to the host process-creation facility as-is. Known gap.
pub trait ProcessPort {
    type Child: ChildProcess;

    /// Start `argv[0]` with the remaining elements as arguments.
    fn spawn(&mut self, argv: &[String]) -> Result<Self::Child, ProcessSpawnError>;
}

/// Handle to one spawned process.
pub trait ChildProcess {
    /// Host process identifier, for attribution in logs.
    fn pid(&self) -> u32;

    /// Non-blocking exit poll.
    ///
    /// `Some(code)` once the process has exited (`-1` when terminated by a
    /// signal), `None` while it is still running.
    fn try_wait(&mut self) -> Option<i32>;
}
