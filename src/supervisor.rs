//! Process supervisor — the active set of spawned RPC processes.
//!
//! The supervisor exclusively owns the active set. Only `spawn` inserts
//! (in request-arrival order) and only `reap` removes; `reap` rebuilds the
//! retained subset after a full traversal, so entries are never skipped or
//! visited twice while the set is being mutated.

use crate::error::ProcessSpawnError;
use crate::ports::{ChildProcess, ProcessPort};

// ---------------------------------------------------------------------------
// Managed process
// ---------------------------------------------------------------------------

/// Lifecycle of one managed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Running,
    /// Exit code, `-1` when the process was terminated by a signal.
    Exited(i32),
}

/// One spawned process and its attribution.
#[derive(Debug)]
pub struct ManagedProcess<H> {
    /// Identifier of the bus requester this process runs on behalf of.
    pub owning_user: u8,
    pub handle: H,
    pub state: ProcState,
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Tracks in-flight spawned processes keyed by owning requester identity.
pub struct ProcessSupervisor<P: ProcessPort> {
    spawner: P,
    active: Vec<ManagedProcess<P::Child>>,
}

impl<P: ProcessPort> ProcessSupervisor<P> {
    pub fn new(spawner: P) -> Self {
        Self {
            spawner,
            active: Vec::new(),
        }
    }

    /// Start a new process for `owning_user` and insert it into the active
    /// set. Returns the host pid for logging.
    pub fn spawn(&mut self, owning_user: u8, argv: &[String]) -> Result<u32, ProcessSpawnError> {
        let handle = self.spawner.spawn(argv)?;
        let pid = handle.pid();
        self.active.push(ManagedProcess {
            owning_user,
            handle,
            state: ProcState::Running,
        });
        Ok(pid)
    }

    /// Poll every active entry non-blockingly and remove the finished ones.
    ///
    /// Returns exactly the entries that transitioned to `Exited` during this
    /// call, in their spawn order. Safe to call with nothing pending; a
    /// given process appears in the result of at most one `reap` ever,
    /// because removal happens in the same call that observes the exit.
    pub fn reap(&mut self) -> Vec<ManagedProcess<P::Child>> {
        let mut finished = Vec::new();
        let mut retained = Vec::with_capacity(self.active.len());

        for mut proc in self.active.drain(..) {
            match proc.handle.try_wait() {
                Some(code) => {
                    proc.state = ProcState::Exited(code);
                    finished.push(proc);
                }
                None => retained.push(proc),
            }
        }

        self.active = retained;
        finished
    }

    /// Number of processes still running.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
