//! Prelude module for common re-exports.
//!
//! Consumers can do `use vfd_common::prelude::*;` and get the most
//! important types without listing individual paths.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, LinkSettings, Parity, SharedConfig, SpindleConfig, VfdLinkConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_FRAME_LEN, MAX_RETRIES, POLL_INTERVAL, QUEUE_CAPACITY};

// ─── State & Faults ─────────────────────────────────────────────────
pub use crate::fault::{FaultKind, NullHook, SystemHook};
pub use crate::state::SpindleState;
