//! Queue-empty polling cycle.
//!
//! When no caller-issued command is pending, the bus task keeps the link
//! alive with read-only status requests cycling `Rpm → Direction → Health`.
//! The transition function is pure: it picks the first supported read at or
//! after the current position in the same activation (no wasted interval on
//! unsupported reads), with `Health` as the terminal floor. Only when even
//! the health check is unsupported does the task idle for one interval.
//!
//! Capability discovery (max RPM) is not part of the cycle: the executor
//! forces it, marked critical, until it succeeds.

use crate::vendor::VendorCaps;

/// Position in the read-only polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollTask {
    /// Output speed read-back.
    #[default]
    Rpm,
    /// Rotation direction read-back.
    Direction,
    /// Generic health check; the weakest poll, the terminal fallback.
    Health,
}

/// Select the poll to run now and the cycle position for the next
/// activation.
///
/// Returns `(None, Rpm)` when the profile supports no poll at all; the
/// caller idles one interval and retries the full cycle.
pub fn advance(task: PollTask, caps: &VendorCaps) -> (Option<PollTask>, PollTask) {
    let mut current = task;
    loop {
        match current {
            PollTask::Rpm if caps.rpm => return (Some(PollTask::Rpm), PollTask::Direction),
            PollTask::Rpm => current = PollTask::Direction,
            PollTask::Direction if caps.direction => {
                return (Some(PollTask::Direction), PollTask::Health);
            }
            PollTask::Direction => current = PollTask::Health,
            PollTask::Health if caps.health => return (Some(PollTask::Health), PollTask::Rpm),
            PollTask::Health => return (None, PollTask::Rpm),
        }
    }
}
