//! Integration test: retry, escalation and recovery paths.
//!
//! The executor is stepped manually so every transaction is deterministic:
//! one `run_once` call processes exactly one envelope (or one idle poll).

use vfd_common::state::SpindleState;

use super::rig::{Rig, fast_config};

#[test]
fn capability_discovery_updates_clamp_window() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();

    rig.sim.set_max_rpm(12_000);
    executor.run_once();

    assert_eq!(rig.controller.device().max_rpm(), 12_000);
    assert!(!rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 0);
}

#[test]
fn retry_ceiling_raises_exactly_one_fault() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();
    executor.run_once(); // discovery succeeds

    rig.sim.set_mute(true);
    rig.controller.set_state(SpindleState::EnabledClockwise, 500);

    // Mode envelope (critical): retries exhaust, one fault.
    executor.run_once();
    assert!(rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 1);

    // Speed envelope (non-critical) fails too: still one fault.
    executor.run_once();
    assert_eq!(rig.hook.fault_count(), 1);

    // Another critical failure while already unresponsive: debounced.
    rig.controller
        .set_state(SpindleState::EnabledCounterClockwise, 500);
    executor.run_once();
    assert_eq!(rig.hook.fault_count(), 1);
    assert!(rig.controller.is_unresponsive());
}

#[test]
fn successful_frame_clears_unresponsive_and_rearms_escalation() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();
    executor.run_once(); // discovery

    rig.sim.set_mute(true);
    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    executor.run_once();
    assert!(rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 1);

    // Link comes back: the next poll clears the flag.
    rig.sim.set_mute(false);
    rig.controller.queue().clear();
    executor.run_once();
    assert!(!rig.controller.is_unresponsive());

    // A fresh critical failure escalates again.
    rig.sim.set_mute(true);
    rig.controller
        .set_state(SpindleState::EnabledCounterClockwise, 500);
    executor.run_once();
    assert_eq!(rig.hook.fault_count(), 2);
}

#[test]
fn noncritical_timeouts_flag_unresponsive_without_fault() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();
    executor.run_once(); // discovery

    // Three consecutive lost replies on a read-only poll: the retry
    // ceiling (3) is exhausted without escalation.
    rig.sim.drop_next(3);
    executor.run_once();
    assert!(rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 0);

    // The next successful frame clears the flag.
    executor.run_once();
    assert!(!rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 0);
}

#[test]
fn corrupt_replies_are_retried_within_one_transaction() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();
    executor.run_once(); // discovery

    // Two corrupted replies, the third attempt gets through.
    rig.sim.corrupt_next(2);
    executor.run_once();
    assert!(!rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 0);
}

#[test]
fn foreign_address_replies_are_transient() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();
    executor.run_once(); // discovery

    rig.sim.misaddress_next(2);
    executor.run_once();
    assert!(!rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 0);
}

#[test]
fn semantic_fault_on_noncritical_poll_does_not_escalate() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();
    executor.run_once(); // discovery
    executor.run_once(); // rpm poll
    executor.run_once(); // direction poll

    // The health register now reports a drive fault: the frame is
    // well-formed but the content is unsatisfying.
    rig.sim.set_fault_code(9);
    executor.run_once(); // health poll
    assert!(rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 0);

    rig.sim.set_fault_code(0);
    executor.run_once(); // back to rpm poll
    assert!(!rig.controller.is_unresponsive());
}

#[test]
fn poll_cycle_confirms_drive_state() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();
    executor.run_once(); // discovery

    rig.sim.set_reported_rpm(777);
    rig.sim.set_reported_direction(2);

    executor.run_once(); // rpm poll
    assert_eq!(rig.controller.device().current_rpm(), 777);

    executor.run_once(); // direction poll
    assert_eq!(
        rig.controller.get_state(),
        SpindleState::EnabledCounterClockwise
    );
}

#[test]
fn unsatisfying_discovery_repeats_until_answered() {
    let rig = Rig::primed(fast_config(100, 1000));
    let mut executor = rig.executor();

    // A zero capability answer leaves the window unknown; discovery is
    // critical, so the semantic failure escalates once.
    rig.sim.set_max_rpm(0);
    executor.run_once();
    assert!(rig.controller.is_unresponsive());
    assert_eq!(rig.hook.fault_count(), 1);
    // The configured seed still bounds clamping meanwhile.
    assert_eq!(rig.controller.device().max_rpm(), 1000);

    // Once the drive answers, discovery completes and the link recovers.
    rig.sim.set_max_rpm(8_000);
    executor.run_once();
    assert_eq!(rig.controller.device().max_rpm(), 8_000);
    assert!(!rig.controller.is_unresponsive());
}
