//! Machine-level fault channel and host collaborator interface.
//!
//! The spindle link never surfaces bus-level detail to the rest of the
//! machine; only the coarse [`FaultKind`] crosses this boundary. The host
//! firmware implements [`SystemHook`] to wire the link into its alarm
//! handling, abort/job state and speed override.

/// Coarse fault conditions raised across the subsystem boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaultKind {
    /// A critical spindle command exhausted its retries; the machine is
    /// expected to halt motion and alarm.
    SpindleComm = 1,
}

/// Host firmware collaborator interface.
///
/// Implementations must be cheap and non-blocking: `raise_fault` is called
/// from the background bus task, the query methods from the foreground
/// control path on every spindle command.
pub trait SystemHook: Send + Sync {
    /// Raise a machine-level fault condition. Fire-and-forget.
    fn raise_fault(&self, kind: FaultKind);

    /// True while a system abort is in progress; spindle state changes are
    /// blocked during abort.
    fn abort_active(&self) -> bool {
        false
    }

    /// True while a job/cycle is running; mode changes issued mid-job are
    /// marked critical.
    fn job_running(&self) -> bool {
        false
    }

    /// Current spindle speed override in integer percent (100 = no scaling).
    fn speed_override_pct(&self) -> u16 {
        100
    }
}

/// Hook that swallows faults; for bench rigs and the simulation binary.
#[derive(Debug, Default)]
pub struct NullHook;

impl SystemHook for NullHook {
    fn raise_fault(&self, kind: FaultKind) {
        tracing::debug!("fault {kind:?} ignored (no machine attached)");
    }
}
