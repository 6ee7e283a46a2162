//! Error types for the VFD link.
//!
//! Transaction-level detail (`FrameError`) never crosses the subsystem
//! boundary; it is consumed inside the executor and collapses into the
//! debounced unresponsive flag plus, for critical envelopes, a machine
//! fault. `LinkError` covers initialization and vendor lookup.

use thiserror::Error;

/// Transient fault for one transaction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Nothing received within the reply deadline.
    #[error("no response")]
    NoResponse,

    /// Reply shorter than expected; indistinguishable from no response.
    #[error("short reply: expected {expected}, got {got}")]
    ShortReply {
        /// Expected wire length, checksum included.
        expected: usize,
        /// Bytes actually received.
        got: usize,
    },

    /// Well-formed frame from a different bus address (foreign-device
    /// collision, not a checksum failure).
    #[error("reply from other bus device: expected {expected:#04x}, got {got:#04x}")]
    AddressMismatch {
        /// Our configured bus address.
        expected: u8,
        /// Address byte actually received.
        got: u8,
    },

    /// Checksum validation failed.
    #[error("checksum mismatch")]
    CrcMismatch,

    /// Frame well-formed but the content did not decode to anything the
    /// vendor profile expected.
    #[error("reply did not decode to a satisfying value")]
    BadReply,
}

/// Failure to hand a command to the bus task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The bounded queue is at capacity; the command is dropped. Never
    /// fatal to the caller: the polling cycle or the next identical
    /// command re-attempts the same effect.
    #[error("command queue full")]
    Full,
}

/// Initialization and lookup errors for the link itself.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// Configuration rejected; the device stays uninitialized.
    #[error("configuration error: {0}")]
    Config(String),

    /// No vendor profile registered under the requested name.
    #[error("vendor profile not found: {0}")]
    VendorNotFound(String),

    /// The serial device could not be configured.
    #[error("link setup failed: {0}")]
    Setup(String),
}
