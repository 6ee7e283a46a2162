//! Background transaction engine.
//!
//! One long-lived task owns all transactional use of the serial link. Each
//! iteration it obtains an envelope (forced capability discovery, then the
//! command queue, then the polling cycle), appends the checksum, transmits,
//! and validates the framed reply. Failures are retried up to the ceiling
//! with one poll interval between attempts; exhausting the ceiling marks
//! the device unresponsive (debounced) and, for critical envelopes, raises
//! a machine-level fault. The task sleeps one poll interval after every
//! iteration, bounding bus utilization and giving the drive recovery time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use vfd_common::config::SpindleConfig;
use vfd_common::consts::MAX_FRAME_LEN;
use vfd_common::fault::{FaultKind, SystemHook};

use crate::crc;
use crate::device::DeviceState;
use crate::error::FrameError;
use crate::frame::{CommandEnvelope, ReplyKind};
use crate::link::SerialLink;
use crate::poll::{self, PollTask};
use crate::queue::CommandQueue;
use crate::vendor::{VendorCaps, VfdProtocol};

// ─── Link Health Tracker ────────────────────────────────────────────

/// Two-state debounce for the unresponsive flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LinkHealth {
    /// Replies are coming back.
    #[default]
    Recovered,
    /// Sustained failure; already reported.
    Faulted,
}

/// Tracks fault transitions so logging and escalation happen exactly once
/// per transition edge, not per iteration.
#[derive(Debug, Default)]
struct FaultTracker {
    state: LinkHealth,
}

impl FaultTracker {
    /// Note a successful transaction. Returns `true` on the
    /// Faulted → Recovered edge.
    fn recover(&mut self) -> bool {
        let was = self.state;
        self.state = LinkHealth::Recovered;
        was == LinkHealth::Faulted
    }

    /// Note a sustained failure. Returns `true` on the
    /// Recovered → Faulted edge.
    fn fail(&mut self) -> bool {
        let was = self.state;
        self.state = LinkHealth::Faulted;
        was == LinkHealth::Recovered
    }
}

// ─── Transaction Executor ───────────────────────────────────────────

/// The single owner of transactional serial I/O.
pub struct TransactionExecutor {
    link: Arc<Mutex<Box<dyn SerialLink>>>,
    queue: Arc<CommandQueue>,
    device: Arc<DeviceState>,
    protocol: Arc<dyn VfdProtocol>,
    hook: Arc<dyn SystemHook>,
    config: SpindleConfig,
    address: u8,
    caps: VendorCaps,
    poll: PollTask,
    discovery_done: bool,
    fault: FaultTracker,
    /// Transient-fault counter for rate-limited logging.
    transient_faults: u64,
}

impl TransactionExecutor {
    /// Build an executor. Vendor capabilities are probed once here.
    pub fn new(
        link: Arc<Mutex<Box<dyn SerialLink>>>,
        queue: Arc<CommandQueue>,
        device: Arc<DeviceState>,
        protocol: Arc<dyn VfdProtocol>,
        hook: Arc<dyn SystemHook>,
        config: SpindleConfig,
        address: u8,
    ) -> Self {
        let caps = VendorCaps::probe(protocol.as_ref(), address);
        debug!(
            "vendor '{}' polls: max_rpm={} rpm={} direction={} health={}",
            protocol.name(),
            caps.max_rpm,
            caps.rpm,
            caps.direction,
            caps.health
        );
        Self {
            link,
            queue,
            device,
            protocol,
            hook,
            config,
            address,
            caps,
            poll: PollTask::default(),
            discovery_done: false,
            fault: FaultTracker::default(),
            transient_faults: 0,
        }
    }

    /// Run forever; the body of the background task.
    pub fn run(mut self) {
        info!("spindle bus task started");
        loop {
            self.run_once();
            std::thread::sleep(self.config.poll_interval());
        }
    }

    /// One executor iteration without the trailing pacing sleep.
    ///
    /// Exposed so tests can drive the engine deterministically.
    pub fn run_once(&mut self) {
        if let Some(envelope) = self.next_envelope() {
            self.transact(envelope);
        }
    }

    /// Pick the next envelope: forced discovery, then the queue, then the
    /// polling cycle. `None` means idle this interval.
    fn next_envelope(&mut self) -> Option<CommandEnvelope> {
        // Capability discovery preempts everything while the clamp window
        // is unknown, and is always marked critical.
        if self.caps.max_rpm && (!self.discovery_done || self.device.max_rpm() == 0) {
            let mut envelope = self.protocol.max_rpm_request(self.address)?;
            envelope.set_critical(true);
            return Some(envelope);
        }

        if let Some(envelope) = self.queue.dequeue_timeout(Duration::ZERO) {
            return Some(envelope);
        }

        let (selected, next) = poll::advance(self.poll, &self.caps);
        self.poll = next;
        match selected? {
            PollTask::Rpm => self.protocol.rpm_request(self.address),
            PollTask::Direction => self.protocol.direction_request(self.address),
            PollTask::Health => self.protocol.health_request(self.address),
        }
    }

    /// Send one envelope with retries, validate the reply, dispatch the
    /// interpretation and maintain the fault state.
    fn transact(&mut self, envelope: CommandEnvelope) {
        let Some(frame) = envelope.wire_frame() else {
            warn!("command frame exceeds {MAX_FRAME_LEN} bytes, dropped");
            return;
        };
        if envelope.wire_reply_len() > MAX_FRAME_LEN {
            warn!("expected reply exceeds {MAX_FRAME_LEN} bytes, dropped");
            return;
        }

        let mut rx = [0u8; MAX_FRAME_LEN];

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.config.poll_interval());
            }

            match self.attempt(&frame, envelope.wire_reply_len(), &mut rx) {
                Ok(reply_len) => {
                    if self.fault.recover() {
                        info!("spindle link recovered");
                    }
                    self.device.set_unresponsive(false);

                    if let Some(kind) = envelope.reply_kind() {
                        if !self.interpret(kind, &rx[..reply_len]) {
                            // Semantic failure: the frame was well-formed,
                            // the content was not. Retrying the same frame
                            // would fail the same way.
                            info!("spindle drive did not give a satisfying response");
                            self.sustained_fault(envelope.is_critical());
                        }
                    }
                    return;
                }
                Err(err) => self.log_transient(&err),
            }
        }

        self.sustained_fault(envelope.is_critical());
    }

    /// One wire exchange under the link lock.
    fn attempt(
        &mut self,
        frame: &[u8],
        expected: usize,
        rx: &mut [u8; MAX_FRAME_LEN],
    ) -> Result<usize, FrameError> {
        let mut link = self.link.lock().expect("serial link lock poisoned");

        link.flush_input();
        link.send(frame).map_err(|e| {
            trace!("link write failed: {e}");
            FrameError::NoResponse
        })?;

        if expected == 0 {
            // Fire-and-forget envelope; nothing to validate.
            return Ok(0);
        }

        let got = link.recv(&mut rx[..expected], self.config.response_wait());
        drop(link);

        if got == 0 {
            return Err(FrameError::NoResponse);
        }
        if got < expected {
            return Err(FrameError::ShortReply { expected, got });
        }

        let reply = &rx[..got];
        if reply[0] != self.address {
            return Err(FrameError::AddressMismatch {
                expected: self.address,
                got: reply[0],
            });
        }
        if !crc::validate(reply) {
            return Err(FrameError::CrcMismatch);
        }

        Ok(got)
    }

    /// Dispatch a validated reply to the vendor profile's typed decoder.
    /// Returns `false` for content the profile could not interpret.
    fn interpret(&mut self, kind: ReplyKind, reply: &[u8]) -> bool {
        match kind {
            ReplyKind::MaxRpm => match self.protocol.decode_max_rpm(reply) {
                Some(rpm) => {
                    self.device.set_max_rpm(rpm);
                    self.discovery_done = true;
                    info!("drive reports {rpm} RPM maximum");
                    true
                }
                None => false,
            },
            ReplyKind::Rpm => match self.protocol.decode_rpm(reply) {
                Some(rpm) => {
                    self.device.set_current_rpm(rpm);
                    true
                }
                None => false,
            },
            ReplyKind::Direction => match self.protocol.decode_direction(reply) {
                Some(state) => {
                    self.device.set_current_state(state);
                    true
                }
                None => false,
            },
            ReplyKind::Health => self.protocol.decode_health(reply),
        }
    }

    /// Retry ceiling exhausted (or semantic failure): debounced transition
    /// into unresponsive, escalating critical envelopes exactly once per
    /// transition.
    fn sustained_fault(&mut self, critical: bool) {
        self.device.set_unresponsive(true);
        if self.fault.fail() {
            warn!("spindle drive unresponsive");
            if critical {
                warn!("critical spindle command failed, raising alarm");
                self.hook.raise_fault(FaultKind::SpindleComm);
            }
        }
    }

    /// Per-occurrence transient log line, rate-limited so a sustained
    /// fault cannot flood the sink.
    fn log_transient(&mut self, err: &FrameError) {
        self.transient_faults += 1;
        if self.transient_faults <= 5 || self.transient_faults % 100 == 0 {
            debug!("bus transaction fault #{}: {err}", self.transient_faults);
        }
    }
}
