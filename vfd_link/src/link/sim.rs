//! Software-simulated drive.
//!
//! `SimulatedVfd` implements [`SerialLink`] by emulating a device speaking
//! the generic profile's register layout. It answers immediately (a missing
//! reply is simulated as an instant empty read), keeps a write log, and
//! supports fault injection so tests can exercise the retry and escalation
//! paths deterministically.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::trace;
use vfd_common::config::LinkSettings;

use crate::crc;
use crate::error::LinkError;
use crate::link::SerialLink;
use crate::vendor::generic as map;

/// Emulated device registers and injection switches.
#[derive(Debug)]
struct SimState {
    /// Bus address the device answers to.
    address: u8,
    /// Capability register value.
    max_rpm: u16,
    /// Output speed register value.
    rpm: u16,
    /// Direction register value (0 stop, 1 forward, 2 reverse).
    direction: u16,
    /// Fault code register value (0 = healthy).
    fault_code: u16,
    /// Last written control word.
    control: u16,
    /// Reply bytes waiting to be read.
    pending: Vec<u8>,
    /// Log of register writes as (register, value).
    writes: Vec<(u16, u16)>,
    /// Swallow all replies while set.
    mute: bool,
    /// Swallow the next N replies.
    drop_next: u32,
    /// Flip a bit in the next N replies.
    corrupt_next: u32,
    /// Answer the next N replies from a different bus address.
    misaddress_next: u32,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            address: 0x01,
            max_rpm: 24_000,
            rpm: 0,
            direction: 0,
            fault_code: 0,
            control: 0,
            pending: Vec::new(),
            writes: Vec::new(),
            mute: false,
            drop_next: 0,
            corrupt_next: 0,
            misaddress_next: 0,
        }
    }
}

impl SimState {
    fn register_value(&self, register: u16) -> u16 {
        match register {
            map::REG_MAX_RPM => self.max_rpm,
            map::REG_RPM => self.rpm,
            map::REG_DIRECTION => self.direction,
            map::REG_FAULT => self.fault_code,
            _ => 0,
        }
    }

    fn write_register(&mut self, register: u16, value: u16) {
        self.writes.push((register, value));
        match register {
            map::REG_CONTROL => {
                self.control = value;
                self.direction = match value {
                    map::CMD_RUN_FORWARD => 1,
                    map::CMD_RUN_REVERSE => 2,
                    _ => 0,
                };
                if value == map::CMD_STOP {
                    self.rpm = 0;
                }
            }
            map::REG_SPEED => self.rpm = value,
            _ => {}
        }
    }

    /// Build the reply for one validated request, honouring injections.
    fn respond(&mut self, request: &[u8]) {
        if self.mute {
            return;
        }
        if self.drop_next > 0 {
            self.drop_next -= 1;
            return;
        }

        let function = request[1];
        let register = u16::from_be_bytes([request[2], request[3]]);

        let mut reply: Vec<u8> = match function {
            map::FN_WRITE => {
                let value = u16::from_be_bytes([request[4], request[5]]);
                self.write_register(register, value);
                // Echo the six request bytes.
                request[..6].to_vec()
            }
            map::FN_READ => {
                let value = self.register_value(register).to_be_bytes();
                vec![self.address, map::FN_READ, 0x02, value[0], value[1]]
            }
            _ => return, // Unknown function: stay silent like a real drive.
        };

        if self.misaddress_next > 0 {
            self.misaddress_next -= 1;
            reply[0] = self.address.wrapping_add(1);
        }

        let crc = crc::crc16(&reply);
        reply.push((crc & 0x00FF) as u8);
        reply.push((crc >> 8) as u8);

        if self.corrupt_next > 0 {
            self.corrupt_next -= 1;
            reply[2] ^= 0x40;
        }

        self.pending = reply;
    }
}

/// Simulated drive speaking the generic register layout.
pub struct SimulatedVfd {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedVfd {
    /// Fresh healthy device at bus address 1.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Inspection/injection handle for tests; clones share the device.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SimulatedVfd {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for SimulatedVfd {
    fn configure(&mut self, settings: &LinkSettings) -> Result<(), LinkError> {
        let mut state = self.state.lock().expect("sim state lock poisoned");
        state.address = settings.bus_address;
        state.pending.clear();
        trace!(
            "simulated drive configured: address {}, {} baud",
            settings.bus_address, settings.baud_rate
        );
        Ok(())
    }

    fn flush_input(&mut self) {
        self.state
            .lock()
            .expect("sim state lock poisoned")
            .pending
            .clear();
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        let mut state = self.state.lock().expect("sim state lock poisoned");
        // A real drive ignores frames that fail its own validation.
        if frame.len() >= 8 && frame[0] == state.address && crc::validate(frame) {
            state.respond(&frame[..frame.len() - 2]);
        }
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8], _deadline: Duration) -> usize {
        // The simulated device answers instantly; an empty buffer models a
        // reply that never arrives within the deadline.
        let mut state = self.state.lock().expect("sim state lock poisoned");
        let n = state.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&state.pending[..n]);
        state.pending.drain(..n);
        n
    }
}

/// Shared inspection/injection handle onto a [`SimulatedVfd`].
#[derive(Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    /// Set the capability register.
    pub fn set_max_rpm(&self, rpm: u16) {
        self.state.lock().expect("sim state lock poisoned").max_rpm = rpm;
    }

    /// Set the fault code register (0 = healthy).
    pub fn set_fault_code(&self, code: u16) {
        self.state.lock().expect("sim state lock poisoned").fault_code = code;
    }

    /// Overwrite the output speed register, as if the drive changed speed
    /// on its own.
    pub fn set_reported_rpm(&self, rpm: u16) {
        self.state.lock().expect("sim state lock poisoned").rpm = rpm;
    }

    /// Overwrite the direction register (0 stop, 1 forward, 2 reverse).
    pub fn set_reported_direction(&self, direction: u16) {
        self.state
            .lock()
            .expect("sim state lock poisoned")
            .direction = direction;
    }

    /// Swallow every reply while `true` (device unplugged).
    pub fn set_mute(&self, mute: bool) {
        self.state.lock().expect("sim state lock poisoned").mute = mute;
    }

    /// Swallow exactly the next `n` replies.
    pub fn drop_next(&self, n: u32) {
        self.state.lock().expect("sim state lock poisoned").drop_next = n;
    }

    /// Corrupt exactly the next `n` replies.
    pub fn corrupt_next(&self, n: u32) {
        self.state.lock().expect("sim state lock poisoned").corrupt_next = n;
    }

    /// Answer the next `n` replies from a foreign bus address.
    pub fn misaddress_next(&self, n: u32) {
        self.state
            .lock()
            .expect("sim state lock poisoned")
            .misaddress_next = n;
    }

    /// Last written control word.
    pub fn control_word(&self) -> u16 {
        self.state.lock().expect("sim state lock poisoned").control
    }

    /// Current speed register value.
    pub fn speed(&self) -> u16 {
        self.state.lock().expect("sim state lock poisoned").rpm
    }

    /// All register writes seen so far, as (register, value).
    pub fn write_log(&self) -> Vec<(u16, u16)> {
        self.state
            .lock()
            .expect("sim state lock poisoned")
            .writes
            .clone()
    }
}
