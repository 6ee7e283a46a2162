//! Shared test rig: a controller wired to the simulated drive with a
//! fault-counting host hook and fast bus timing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

use vfd_common::config::{LinkSettings, Parity, SpindleConfig};
use vfd_common::fault::{FaultKind, SystemHook};
use vfd_link::SpindleController;
use vfd_link::executor::TransactionExecutor;
use vfd_link::link::{SimHandle, SimulatedVfd};
use vfd_link::vendor::builtin_registry;

/// Host hook that counts fault-channel invocations and exposes switchable
/// abort/job/override state.
#[derive(Debug, Default)]
pub struct CountingHook {
    pub faults: AtomicU32,
    pub abort: AtomicBool,
    pub job: AtomicBool,
    pub override_pct: AtomicU16,
}

impl CountingHook {
    pub fn new() -> Arc<Self> {
        let hook = Self::default();
        hook.override_pct.store(100, Ordering::SeqCst);
        Arc::new(hook)
    }

    pub fn fault_count(&self) -> u32 {
        self.faults.load(Ordering::SeqCst)
    }
}

impl SystemHook for CountingHook {
    fn raise_fault(&self, _kind: FaultKind) {
        self.faults.fetch_add(1, Ordering::SeqCst);
    }

    fn abort_active(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    fn job_running(&self) -> bool {
        self.job.load(Ordering::SeqCst)
    }

    fn speed_override_pct(&self) -> u16 {
        self.override_pct.load(Ordering::SeqCst)
    }
}

/// Millisecond-scale bus timing so retry paths run fast.
pub fn fast_config(min_rpm: u32, max_rpm: u32) -> SpindleConfig {
    SpindleConfig {
        min_rpm,
        max_rpm,
        spinup_dwell_ms: 0,
        spindown_dwell_ms: 0,
        poll_interval_ms: 1,
        response_wait_ms: 5,
        max_retries: 3,
        ..Default::default()
    }
}

pub fn link_settings() -> LinkSettings {
    LinkSettings {
        device: "sim".to_string(),
        baud_rate: 9600,
        data_bits: 8,
        stop_bits: 1,
        parity: Parity::None,
        bus_address: 0x01,
    }
}

/// A controller over the simulated drive.
pub struct Rig {
    pub controller: SpindleController,
    pub sim: SimHandle,
    pub hook: Arc<CountingHook>,
}

impl Rig {
    /// Build a rig. The device state is primed directly (no background
    /// task) so tests can step the executor deterministically.
    pub fn primed(config: SpindleConfig) -> Self {
        let rig = Self::unprimed(config.clone());
        rig.controller.device().reset(config.min_rpm, config.max_rpm);
        rig.controller.device().set_initialized(true);
        rig
    }

    /// Build a rig without touching the device state; `init()` has not
    /// run, so the device is uninitialized.
    pub fn unprimed(config: SpindleConfig) -> Self {
        let drive = SimulatedVfd::new();
        let sim = drive.handle();
        let hook = CountingHook::new();
        let registry = builtin_registry();
        let protocol = registry.create(&config.vendor).expect("vendor profile");

        let controller = SpindleController::new(
            config,
            link_settings(),
            protocol,
            Box::new(drive),
            Arc::<CountingHook>::clone(&hook) as Arc<dyn SystemHook>,
        );

        Self {
            controller,
            sim,
            hook,
        }
    }

    /// Deterministic executor over this rig's parts.
    pub fn executor(&self) -> TransactionExecutor {
        self.controller.build_executor()
    }
}
