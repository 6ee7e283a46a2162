//! # VFD Link Library
//!
//! Serial (RS-485, Modbus-RTU-style framing) link to an external
//! variable-frequency-drive spindle, plus the spindle state model used by
//! the surrounding motion controller.
//!
//! # Module Structure
//!
//! - [`crc`] - Frame checksum codec
//! - [`frame`] - Command envelope and reply-kind dispatch
//! - [`queue`] - Bounded command queue between API callers and the bus task
//! - [`poll`] - Queue-empty polling cycle state machine
//! - [`executor`] - Background transaction engine owning the serial link
//! - [`controller`] - Public spindle API (`set_state`, `set_rpm`, …)
//! - [`vendor`] - Pluggable vendor profile trait and registry
//! - [`link`] - Serial bus boundary trait and the simulated device
//! - [`device`] - Cached device state shared across tasks
//! - [`error`] - Error taxonomy
//!
//! # Architecture
//!
//! ```text
//! callers ──► SpindleController ──► CommandQueue ──► TransactionExecutor
//!                    ▲                                   │  (one thread,
//!                    │         cached DeviceState        │   owns the bus)
//!                    └───────────────◄───────────────────┘
//! ```
//!
//! Data flows one direction under normal operation; the polling cycle only
//! activates when the queue is empty, so read-only status requests
//! interleave with caller-issued commands without starving them.

pub mod controller;
pub mod crc;
pub mod device;
pub mod error;
pub mod executor;
pub mod frame;
pub mod link;
pub mod poll;
pub mod queue;
pub mod vendor;

// Re-export key types for convenience
pub use crate::controller::SpindleController;
pub use crate::device::DeviceState;
pub use crate::frame::{CommandEnvelope, ReplyKind};
pub use crate::link::SerialLink;
pub use crate::queue::CommandQueue;
pub use crate::vendor::{VendorRegistry, VfdProtocol};
