//! Integration test: controller API against the command queue.
//!
//! No bus task runs here; the tests assert exactly which envelopes the
//! public operations produce.

use std::sync::atomic::Ordering;
use std::time::Duration;

use vfd_common::state::SpindleState;

use super::rig::{Rig, fast_config};

fn dequeue(rig: &Rig) -> vfd_link::CommandEnvelope {
    rig.controller
        .queue()
        .dequeue_timeout(Duration::ZERO)
        .expect("envelope expected")
}

#[test]
fn set_rpm_is_idempotent() {
    let rig = Rig::primed(fast_config(100, 1000));

    rig.controller.set_rpm(500);
    rig.controller.set_rpm(500);

    assert_eq!(rig.controller.queue().len(), 1);
}

#[test]
fn set_rpm_clamps_into_window() {
    let rig = Rig::primed(fast_config(100, 1000));

    // Below the floor: raised to min_rpm.
    assert_eq!(rig.controller.set_rpm(50), 100);

    let envelope = dequeue(&rig);
    assert_eq!(envelope.payload(), &[0x01, 0x06, 0x20, 0x01, 0x00, 100]);
    assert!(!envelope.is_critical());
    assert!(rig.controller.queue().is_empty());

    // Above the ceiling: lowered to max_rpm.
    assert_eq!(rig.controller.set_rpm(99_999), 1000);
    let envelope = dequeue(&rig);
    assert_eq!(&envelope.payload()[4..6], &1000u16.to_be_bytes());
}

#[test]
fn set_rpm_zero_is_suppressed_while_cached_zero() {
    let rig = Rig::primed(fast_config(100, 1000));
    assert_eq!(rig.controller.set_rpm(0), 0);
    assert!(rig.controller.queue().is_empty());
}

#[test]
fn override_scales_before_clamping() {
    let rig = Rig::primed(fast_config(0, 10_000));

    rig.hook.override_pct.store(50, Ordering::SeqCst);
    assert_eq!(rig.controller.set_rpm(1000), 500);
    let envelope = dequeue(&rig);
    assert_eq!(&envelope.payload()[4..6], &500u16.to_be_bytes());

    rig.hook.override_pct.store(200, Ordering::SeqCst);
    assert_eq!(rig.controller.set_rpm(1000), 2000);
    let envelope = dequeue(&rig);
    assert_eq!(&envelope.payload()[4..6], &2000u16.to_be_bytes());
}

#[test]
fn disable_clears_stale_commands() {
    let rig = Rig::primed(fast_config(100, 1000));

    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    rig.controller.set_rpm(600);
    rig.controller.set_rpm(700);
    rig.controller.set_rpm(800);
    assert!(rig.controller.queue().len() >= 4);

    rig.controller.set_state(SpindleState::Disabled, 0);

    // Exactly the disable envelope survives.
    assert_eq!(rig.controller.queue().len(), 1);
    let envelope = dequeue(&rig);
    assert_eq!(envelope.payload(), &[0x01, 0x06, 0x20, 0x00, 0x00, 0x06]);
    assert_eq!(rig.controller.get_state(), SpindleState::Disabled);
    assert_eq!(rig.controller.device().current_rpm(), 0);
}

#[test]
fn enable_is_critical_disable_is_not() {
    let rig = Rig::primed(fast_config(100, 1000));

    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    let mode = dequeue(&rig);
    assert!(mode.is_critical());

    rig.controller.set_state(SpindleState::Disabled, 0);
    let mode = dequeue(&rig);
    assert!(!mode.is_critical());
}

#[test]
fn disable_during_job_is_critical() {
    let rig = Rig::primed(fast_config(100, 1000));
    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    rig.controller.queue().clear();

    rig.hook.job.store(true, Ordering::SeqCst);
    rig.controller.set_state(SpindleState::Disabled, 0);

    let mode = dequeue(&rig);
    assert!(mode.is_critical());
}

#[test]
fn redundant_mode_commands_are_suppressed() {
    let rig = Rig::primed(fast_config(100, 1000));

    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    assert_eq!(rig.controller.queue().len(), 2); // mode + speed

    // Same state, same speed: nothing new on the bus.
    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    assert_eq!(rig.controller.queue().len(), 2);

    // Same state, new speed: speed envelope only.
    rig.controller.set_state(SpindleState::EnabledClockwise, 700);
    assert_eq!(rig.controller.queue().len(), 3);
}

#[test]
fn uninitialized_device_produces_no_bus_activity() {
    let rig = Rig::unprimed(fast_config(100, 1000));

    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    assert_eq!(rig.controller.set_rpm(500), 0);
    rig.controller.stop();

    assert!(rig.controller.queue().is_empty());
    assert_eq!(rig.controller.get_state(), SpindleState::Disabled);
    assert!(rig.sim.write_log().is_empty());
}

#[test]
fn abort_blocks_state_changes() {
    let rig = Rig::primed(fast_config(100, 1000));
    rig.hook.abort.store(true, Ordering::SeqCst);

    rig.controller.set_state(SpindleState::EnabledClockwise, 500);

    assert!(rig.controller.queue().is_empty());
    assert_eq!(rig.controller.get_state(), SpindleState::Disabled);
}

#[test]
fn stop_is_a_noncritical_disable() {
    let rig = Rig::primed(fast_config(100, 1000));
    rig.controller.set_state(SpindleState::EnabledCounterClockwise, 500);
    rig.controller.queue().clear();

    rig.hook.job.store(true, Ordering::SeqCst); // even mid-job
    rig.controller.stop();

    let envelope = dequeue(&rig);
    assert!(!envelope.is_critical());
    assert_eq!(envelope.payload()[5], 0x06);
    assert_eq!(rig.controller.get_state(), SpindleState::Disabled);
}

#[test]
fn get_state_reflects_intent_immediately() {
    let rig = Rig::primed(fast_config(100, 1000));

    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    // No transaction has run, yet the cached state already reads enabled.
    assert_eq!(rig.controller.get_state(), SpindleState::EnabledClockwise);
    assert!(!rig.sim.write_log().iter().any(|(reg, _)| *reg == 0x2000));
}

#[test]
fn queue_overflow_drops_commands_without_failing_caller() {
    let rig = Rig::primed(fast_config(0, 100_000));

    // Distinct speeds, more than the queue holds.
    for rpm in 1..=20u32 {
        rig.controller.set_rpm(rpm * 10);
    }

    assert_eq!(rig.controller.queue().len(), 10);
    // The cache still tracks the last request optimistically.
    assert_eq!(rig.controller.device().current_rpm(), 200);
}
