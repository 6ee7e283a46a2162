//! Spindle state model.
//!
//! `SpindleState` uses `#[repr(u8)]` so the cached state can live in a single
//! atomic word shared between the foreground API and the background
//! transaction task.

use serde::{Deserialize, Serialize};

/// Requested spindle drive state.
///
/// The cached value reflects the *last requested* state, set before the bus
/// confirms it. Readers see intent, not confirmed hardware state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SpindleState {
    /// Drive off, output stage disabled.
    #[default]
    Disabled = 0,
    /// Drive on, forward rotation.
    EnabledClockwise = 1,
    /// Drive on, reverse rotation.
    EnabledCounterClockwise = 2,
}

impl SpindleState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disabled),
            1 => Some(Self::EnabledClockwise),
            2 => Some(Self::EnabledCounterClockwise),
            _ => None,
        }
    }

    /// True for either enabled direction.
    #[inline]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}
