//! Public spindle API.
//!
//! `SpindleController` translates desired machine behaviour into command
//! envelopes: it enforces override scaling and RPM clamping, suppresses
//! redundant commands, clears stale work when stopping, and sequences the
//! mechanical dwells around state transitions. All operations are
//! best-effort and asynchronous with respect to hardware confirmation;
//! they never block on bus I/O, only on the configured dwells.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use vfd_common::config::{LinkSettings, SpindleConfig};
use vfd_common::fault::SystemHook;
use vfd_common::state::SpindleState;

use crate::device::DeviceState;
use crate::error::LinkError;
use crate::executor::TransactionExecutor;
use crate::link::SerialLink;
use crate::queue::CommandQueue;
use crate::vendor::VfdProtocol;

/// The spindle as seen by the rest of the machine.
pub struct SpindleController {
    config: SpindleConfig,
    link_settings: LinkSettings,
    device: Arc<DeviceState>,
    queue: Arc<CommandQueue>,
    link: Arc<Mutex<Box<dyn SerialLink>>>,
    protocol: Arc<dyn VfdProtocol>,
    hook: Arc<dyn SystemHook>,
}

impl SpindleController {
    /// Assemble a controller over a vendor profile and a serial link.
    ///
    /// Nothing touches the bus until [`init`](Self::init) succeeds.
    pub fn new(
        config: SpindleConfig,
        link_settings: LinkSettings,
        protocol: Box<dyn VfdProtocol>,
        link: Box<dyn SerialLink>,
        hook: Arc<dyn SystemHook>,
    ) -> Self {
        Self {
            config,
            link_settings,
            device: Arc::new(DeviceState::new()),
            queue: Arc::new(CommandQueue::new()),
            link: Arc::new(Mutex::new(link)),
            protocol: Arc::from(protocol),
            hook,
        }
    }

    /// (Re)initialize the link: validate configuration, reconfigure the
    /// bus, reset the cached device state and start the background task.
    ///
    /// May be called again after a settings change; the background task is
    /// started at most once per process. On error the device is left
    /// uninitialized and every public operation silently no-ops.
    ///
    /// # Errors
    /// Returns `LinkError::Config` for rejected configuration and
    /// `LinkError::Setup` when the serial device cannot be configured.
    pub fn init(&self) -> Result<(), LinkError> {
        self.device.set_initialized(false);

        info!("initializing spindle link");

        if let Err(e) = self.link_settings.validate() {
            warn!("spindle link configuration rejected: {e}");
            return Err(LinkError::Config(e.to_string()));
        }
        if let Err(e) = self.config.validate() {
            warn!("spindle configuration rejected: {e}");
            return Err(LinkError::Config(e.to_string()));
        }

        {
            let mut link = self.link.lock().expect("serial link lock poisoned");
            link.configure(&self.link_settings)?;
        }

        self.device.reset(self.config.min_rpm, self.config.max_rpm);
        self.device.set_initialized(true);

        // Init can happen many times; only one bus task may ever run.
        if self.device.claim_task() {
            let executor = self.build_executor();
            std::thread::Builder::new()
                .name("vfd-bus".to_string())
                .spawn(move || executor.run())
                .map_err(|e| LinkError::Setup(format!("failed to spawn bus task: {e}")))?;
        }

        info!(
            "spindle link ready: {} at {} baud, bus address {}, vendor '{}'",
            self.link_settings.device,
            self.link_settings.baud_rate,
            self.link_settings.bus_address,
            self.protocol.name()
        );

        Ok(())
    }

    /// Build a transaction executor over this controller's parts.
    ///
    /// `init` uses this for the background task; embedders with their own
    /// scheduling can instead drive [`TransactionExecutor::run_once`]
    /// themselves.
    pub fn build_executor(&self) -> TransactionExecutor {
        TransactionExecutor::new(
            Arc::clone(&self.link),
            Arc::clone(&self.queue),
            Arc::clone(&self.device),
            Arc::clone(&self.protocol),
            Arc::clone(&self.hook),
            self.config.clone(),
            self.link_settings.bus_address,
        )
    }

    /// Request a spindle state and speed.
    ///
    /// No-op during a system abort or while uninitialized. Mode commands
    /// are only issued when the requested state differs from the cached
    /// one, since this is invoked frequently. A transition into an enabled
    /// state blocks the caller for the spin-up dwell, a transition into
    /// disable for the spin-down dwell; the bus task is never blocked.
    pub fn set_state(&self, state: SpindleState, rpm: u32) {
        if self.hook.abort_active() {
            return;
        }
        if !self.device.is_initialized() {
            return;
        }

        let previous = self.device.current_state();
        if previous != state {
            // Critical when a job is running, and always when enabling.
            let critical = self.hook.job_running() || state.is_enabled();
            self.send_mode(state, critical);

            if state.is_enabled() {
                self.set_rpm(rpm);
                self.dwell(self.config.spinup_dwell());
            } else {
                // The stop command implies zero speed; queuing a speed
                // envelope behind it would only be discarded by the next
                // queue clear.
                self.device.set_current_rpm(0);
                self.dwell(self.config.spindown_dwell());
            }
        } else if self.device.current_rpm() != rpm {
            self.set_rpm(rpm);
        }
    }

    /// Request a spindle speed.
    ///
    /// The request is scaled by the host speed override, clamped into the
    /// usable window and suppressed when it matches the cached value
    /// (continuous jog and override changes must not flood the bus).
    /// Returns the effective RPM, 0 while uninitialized.
    pub fn set_rpm(&self, rpm: u32) -> u32 {
        if !self.device.is_initialized() {
            return 0;
        }

        let scaled = scale_by_override(rpm, self.hook.speed_override_pct());
        let clamped = self.device.clamp_rpm(scaled);

        if clamped == self.device.current_rpm() {
            return clamped;
        }
        self.device.set_current_rpm(clamped);

        match self
            .protocol
            .speed_command(self.link_settings.bus_address, clamped)
        {
            Some(envelope) => {
                // Speed commands are never critical.
                if self.queue.enqueue(envelope).is_err() {
                    info!("spindle queue full, speed command dropped");
                }
            }
            None => warn!("vendor '{}' built no speed command", self.protocol.name()),
        }

        clamped
    }

    /// Cached spindle state; never blocks, never touches the bus, may be
    /// stale by one transaction.
    pub fn get_state(&self) -> SpindleState {
        self.device.current_state()
    }

    /// Stop the spindle: a non-critical disable without the job-tied dwell
    /// semantics of [`set_state`](Self::set_state).
    pub fn stop(&self) {
        if !self.device.is_initialized() {
            return;
        }
        self.send_mode(SpindleState::Disabled, false);
        self.device.set_current_rpm(0);
    }

    /// Debounced communication fault flag, for the reporting subsystem.
    pub fn is_unresponsive(&self) -> bool {
        self.device.is_unresponsive()
    }

    /// Shared device state handle.
    pub fn device(&self) -> Arc<DeviceState> {
        Arc::clone(&self.device)
    }

    /// Shared command queue handle.
    pub fn queue(&self) -> Arc<CommandQueue> {
        Arc::clone(&self.queue)
    }

    /// Enqueue a mode-change envelope, clearing stale work first when the
    /// target state is disable. Updates the cached state optimistically.
    fn send_mode(&self, state: SpindleState, critical: bool) {
        let Some(mut envelope) = self
            .protocol
            .direction_command(self.link_settings.bus_address, state)
        else {
            warn!("vendor '{}' built no mode command", self.protocol.name());
            return;
        };

        if state == SpindleState::Disabled {
            let dropped = self.queue.clear();
            if dropped > 0 {
                debug!("discarded {dropped} stale spindle commands before disable");
            }
        }

        envelope.set_critical(critical);
        self.device.set_current_state(state);

        if self.queue.enqueue(envelope).is_err() {
            info!("spindle queue full, mode command dropped");
        }
    }

    /// Block the calling context for a mechanical settling pause.
    fn dwell(&self, duration: std::time::Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Scale a requested RPM by an integer override percentage.
fn scale_by_override(rpm: u32, pct: u16) -> u32 {
    let scaled = u64::from(rpm) * u64::from(pct) / 100;
    scaled.min(u64::from(u32::MAX)) as u32
}
