//! Integration test: the whole stack with a live background bus task.
//!
//! `init()` spawns the real transaction thread; assertions poll the
//! simulated drive's registers until they converge.

use std::time::{Duration, Instant};

use vfd_common::config::SpindleConfig;
use vfd_common::state::SpindleState;

use super::rig::{Rig, fast_config};

/// Poll `condition` for up to two seconds.
fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn enable_run_and_stop_reach_the_drive() {
    let rig = Rig::unprimed(fast_config(100, 10_000));
    rig.sim.set_max_rpm(10_000);

    rig.controller.init().expect("init");
    assert!(rig.controller.device().is_initialized());

    // Capability discovery lands first.
    assert!(
        wait_until(|| rig.controller.device().max_rpm() == 10_000),
        "discovery never completed"
    );

    rig.controller.set_state(SpindleState::EnabledClockwise, 6000);
    assert!(
        wait_until(|| rig.sim.control_word() == 0x0001),
        "run command never reached the drive"
    );
    assert!(
        wait_until(|| rig.sim.speed() == 6000),
        "speed command never reached the drive"
    );
    assert_eq!(rig.controller.get_state(), SpindleState::EnabledClockwise);
    assert!(!rig.controller.is_unresponsive());

    rig.controller.stop();
    assert!(
        wait_until(|| rig.sim.control_word() == 0x0006),
        "stop command never reached the drive"
    );
    assert!(wait_until(|| rig.sim.speed() == 0));
    assert_eq!(rig.controller.get_state(), SpindleState::Disabled);
    assert_eq!(rig.hook.fault_count(), 0);
}

#[test]
fn reinit_keeps_a_single_bus_task() {
    let rig = Rig::unprimed(fast_config(100, 10_000));

    rig.controller.init().expect("first init");
    assert!(rig.controller.device().task_running());

    // Settings change path: init again; the task must not double up and
    // the link must keep working.
    rig.controller.init().expect("second init");
    assert!(rig.controller.device().task_running());

    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    assert!(wait_until(|| rig.sim.control_word() == 0x0001));
}

#[test]
fn laser_mode_conflict_aborts_init() {
    let config = SpindleConfig {
        laser_mode: true,
        ..fast_config(100, 10_000)
    };
    let rig = Rig::unprimed(config);

    assert!(rig.controller.init().is_err());
    assert!(!rig.controller.device().is_initialized());

    // All public operations silently no-op until re-initialized.
    rig.controller.set_state(SpindleState::EnabledClockwise, 500);
    assert_eq!(rig.controller.set_rpm(500), 0);
    assert!(rig.controller.queue().is_empty());
    assert!(rig.sim.write_log().is_empty());
}
