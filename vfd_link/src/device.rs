//! Cached device state shared between the foreground API and the bus task.
//!
//! All fields are single-word atomics: the foreground setters write
//! optimistically, the background executor writes on confirmed replies, and
//! last-write-wins is acceptable because staleness is already part of the
//! `get_state` contract.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use vfd_common::state::SpindleState;

/// Cached spindle/drive state.
///
/// Created at spindle configuration time and shared for the process
/// lifetime; re-initialization resets fields but never replaces the
/// instance.
#[derive(Debug, Default)]
pub struct DeviceState {
    /// Lowest usable RPM (from configuration).
    min_rpm: AtomicU32,
    /// Highest usable RPM (configuration seed, capability discovery may
    /// overwrite it with the device's own value).
    max_rpm: AtomicU32,
    /// Last RPM sent (or confirmed by a poll).
    current_rpm: AtomicU32,
    /// Last *requested* state; intent, not confirmed hardware state.
    current_state: AtomicU8,
    /// True only after bus configuration succeeded.
    initialized: AtomicBool,
    /// Debounced communication fault flag.
    unresponsive: AtomicBool,
    /// Guards single creation of the background task.
    task_running: AtomicBool,
}

impl DeviceState {
    /// Fresh state with all fields zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the RPM clamp window from configuration and reset the cache.
    ///
    /// Called from the (re-)initialization entry point only.
    pub fn reset(&self, min_rpm: u32, max_rpm: u32) {
        self.min_rpm.store(min_rpm, Ordering::SeqCst);
        self.max_rpm.store(max_rpm, Ordering::SeqCst);
        self.current_rpm.store(0, Ordering::SeqCst);
        self.current_state
            .store(SpindleState::Disabled as u8, Ordering::SeqCst);
        self.unresponsive.store(false, Ordering::SeqCst);
    }

    /// Clamp a requested RPM into the usable window.
    ///
    /// Degenerate windows (`min >= max`) force `max`; nonzero requests
    /// below the floor are raised to it; zero stays zero.
    pub fn clamp_rpm(&self, rpm: u32) -> u32 {
        let min = self.min_rpm.load(Ordering::SeqCst);
        let max = self.max_rpm.load(Ordering::SeqCst);

        if min >= max || rpm >= max {
            max
        } else if rpm != 0 && rpm <= min {
            min
        } else {
            rpm
        }
    }

    /// Lowest usable RPM.
    pub fn min_rpm(&self) -> u32 {
        self.min_rpm.load(Ordering::SeqCst)
    }

    /// Highest usable RPM; zero means capability discovery has not
    /// completed yet.
    pub fn max_rpm(&self) -> u32 {
        self.max_rpm.load(Ordering::SeqCst)
    }

    /// Record the drive-reported maximum speed (capability discovery).
    pub fn set_max_rpm(&self, rpm: u32) {
        self.max_rpm.store(rpm, Ordering::SeqCst);
    }

    /// Cached RPM.
    pub fn current_rpm(&self) -> u32 {
        self.current_rpm.load(Ordering::SeqCst)
    }

    /// Update the cached RPM (optimistic on send, confirmed on poll).
    pub fn set_current_rpm(&self, rpm: u32) {
        self.current_rpm.store(rpm, Ordering::SeqCst);
    }

    /// Cached (last requested) state.
    pub fn current_state(&self) -> SpindleState {
        SpindleState::from_u8(self.current_state.load(Ordering::SeqCst))
            .unwrap_or(SpindleState::Disabled)
    }

    /// Update the cached state.
    pub fn set_current_state(&self, state: SpindleState) {
        self.current_state.store(state as u8, Ordering::SeqCst);
    }

    /// True after a successful init and until a config change fails one.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Flip the initialized flag.
    pub fn set_initialized(&self, value: bool) {
        self.initialized.store(value, Ordering::SeqCst);
    }

    /// Debounced communication fault flag.
    pub fn is_unresponsive(&self) -> bool {
        self.unresponsive.load(Ordering::SeqCst)
    }

    /// Set the fault flag, returning the previous value so callers can log
    /// on the transition edge only.
    pub fn set_unresponsive(&self, value: bool) -> bool {
        self.unresponsive.swap(value, Ordering::SeqCst)
    }

    /// Claim the right to spawn the background task. Returns `true` exactly
    /// once per process.
    pub fn claim_task(&self) -> bool {
        !self.task_running.swap(true, Ordering::SeqCst)
    }

    /// Whether the background task has been started.
    pub fn task_running(&self) -> bool {
        self.task_running.load(Ordering::SeqCst)
    }
}
