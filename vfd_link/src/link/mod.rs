//! Serial bus boundary.
//!
//! The physical half-duplex UART is provided by the host runtime; this
//! module only defines the seam the transaction executor drives, plus a
//! software-simulated drive for development and testing without hardware.

pub mod sim;

pub use sim::{SimHandle, SimulatedVfd};

use std::time::Duration;

use vfd_common::config::LinkSettings;

use crate::error::LinkError;

/// Half-duplex serial link as seen by the transaction executor.
///
/// One request/reply exchange at a time; the executor is the only
/// transactional user. Implementations must bound every receive by the
/// given deadline, so the bus task never blocks indefinitely.
pub trait SerialLink: Send {
    /// (Re)configure the bus parameters. Called from the initialization
    /// entry point, possibly again after a settings change.
    fn configure(&mut self, settings: &LinkSettings) -> Result<(), LinkError>;

    /// Drop any stale bytes sitting in the receive buffer.
    fn flush_input(&mut self);

    /// Transmit one frame.
    ///
    /// # Errors
    /// A failed write is treated by the executor like a lost reply and
    /// retried.
    fn send(&mut self, frame: &[u8]) -> Result<(), LinkError>;

    /// Read up to `buf.len()` bytes, waiting at most `deadline`.
    ///
    /// Returns the number of bytes actually received; fewer than requested
    /// means the deadline expired.
    fn recv(&mut self, buf: &mut [u8], deadline: Duration) -> usize;
}
