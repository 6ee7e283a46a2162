//! System-wide constants for the VFD link workspace.
//!
//! Single source of truth for all bus tuning values and size limits.
//! Imported by all crates — no duplication permitted.

use std::time::Duration;

/// Number of commands that can be queued up for the bus task.
pub const QUEUE_CAPACITY: usize = 10;

/// Pause between bus transactions, and the retry backoff unit.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long to wait for a framed reply before treating it as lost.
pub const RESPONSE_WAIT: Duration = Duration::from_millis(250);

/// Attempts per envelope before the device is declared unresponsive.
pub const MAX_RETRIES: u32 = 5;

/// Upper bound on a single frame, checksum included.
pub const MAX_FRAME_LEN: usize = 16;

/// Bus-wide device address used for every frame unless overridden in config.
pub const DEFAULT_BUS_ADDRESS: u8 = 0x01;

/// Sane default for most drives: 9600 baud.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Speed override range accepted from the host (integer percent).
pub const OVERRIDE_PCT_MAX: u16 = 200;
