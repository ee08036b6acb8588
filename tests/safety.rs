//! Cliff interlock against every state

mod common;

use bottle_toppler::behavior::hunt::Hunt;
use bottle_toppler::behavior::state::BehaviorState;
use common::*;
use embassy_time::Duration;

/// Runs one cycle over a drop-off and checks the escape ran instead of the state
fn assert_escapes(rig: &Rig, hunt: &mut Hunt<TestRobot>) {
    let escapes = hunt.stats().escapes;
    let captures = rig.captures.get();
    let start = rig.mark();
    let seen = rig.checkpoint();
    rig.floor.set(DROP_OFF);

    cycle(hunt);
    rig.floor.set(SAFE_FLOOR);

    assert_eq!(hunt.state(), BehaviorState::initial());
    assert_eq!(hunt.stats().escapes, escapes + 1);
    assert_eq!(rig.captures.get(), captures, "no frame is grabbed on a cliff");

    let outputs = rig.outputs_from(seen);
    assert_eq!(outputs[0], Output::Drive(-1.0));
    assert!(
        outputs.contains(&Output::Steer(40.0)) || outputs.contains(&Output::Steer(-40.0)),
        "escape turns: {:?}",
        outputs
    );
    assert!(outputs.contains(&Output::Drive(1.0)));
    assert!(rig.now().as_micros() - start >= Duration::from_millis(1900).as_micros());

    let drive = hunt.actuation().drive_state();
    assert_eq!((drive.power, drive.steering_angle), (0.0, 0.0));
    let aim = hunt.actuation().aim();
    assert_eq!((aim.pan, aim.tilt), (0.0, 0.0));
}

#[test]
fn cliff_during_sweep() {
    let rig = Rig::default();
    let mut hunt = armed(&rig);
    cycle(&mut hunt);
    assert_ne!(hunt.state(), BehaviorState::initial());

    assert_escapes(&rig, &mut hunt);
}

#[test]
fn cliff_during_track() {
    let rig = Rig::default();
    rig.see(&[centred(BOTTLE)]);
    let mut hunt = armed(&rig);
    cycle(&mut hunt);
    assert_eq!(hunt.state(), BehaviorState::Track);

    assert_escapes(&rig, &mut hunt);
}

#[test]
fn cliff_during_approach() {
    let rig = Rig::default();
    rig.see(&[centred(BOTTLE)]);
    let mut hunt = armed(&rig);
    cycle(&mut hunt);
    cycle(&mut hunt);
    assert_eq!(hunt.state(), BehaviorState::Approach { lost_frames: 0 });

    assert_escapes(&rig, &mut hunt);
    assert_eq!(hunt.stats().give_ups, 0);
}

#[test]
fn cliff_during_wait() {
    let rig = Rig::default();
    rig.see(&[centred(BOTTLE)]);
    rig.range_cm.set(10.0);
    let mut hunt = armed(&rig);
    cycle(&mut hunt);
    cycle(&mut hunt);
    cycle(&mut hunt);
    assert!(matches!(hunt.state(), BehaviorState::Wait { .. }));

    assert_escapes(&rig, &mut hunt);
    assert_eq!(hunt.stats().knocks, 0);
}

#[test]
fn cliff_during_backup() {
    let rig = Rig::default();
    rig.see(&[centred(BOTTLE)]);
    rig.range_cm.set(10.0);
    let mut hunt = armed(&rig);
    cycle(&mut hunt);
    cycle(&mut hunt);
    cycle(&mut hunt);
    rig.see(&[centred(PERSON)]);
    cycle(&mut hunt);
    assert!(matches!(hunt.state(), BehaviorState::Backup { .. }));

    assert_escapes(&rig, &mut hunt);
    assert_eq!(hunt.stats().knocks, 1);
}

#[test]
fn cliff_in_the_middle_of_a_burst() {
    let rig = Rig::default();
    rig.see(&[centred(BOTTLE)]);
    rig.range_cm.set(50.0);
    let mut hunt = armed(&rig);
    cycle(&mut hunt);
    cycle(&mut hunt);
    assert_eq!(hunt.state(), BehaviorState::Approach { lost_frames: 0 });

    // first read passes the cycle's own check, the second lands mid-burst
    rig.floor_script
        .borrow_mut()
        .extend([SAFE_FLOOR, DROP_OFF]);
    let seen = rig.checkpoint();
    cycle(&mut hunt);

    assert_eq!(hunt.state(), BehaviorState::initial());
    assert_eq!(hunt.stats().escapes, 1);
    let outputs = rig.outputs_from(seen);
    let burst = outputs
        .iter()
        .position(|o| *o == Output::Drive(0.5))
        .expect("burst started");
    assert_eq!(outputs[burst + 1], Output::Drive(-1.0));
    let drive = hunt.actuation().drive_state();
    assert_eq!((drive.power, drive.steering_angle), (0.0, 0.0));
}

#[test]
fn every_escape_turns_by_the_configured_angle() {
    let rig = Rig::default();
    let mut hunt = armed(&rig);
    let seen = rig.checkpoint();
    rig.floor.set(DROP_OFF);
    for _ in 0..8 {
        cycle(&mut hunt);
    }

    let turns: Vec<f32> = rig
        .outputs_from(seen)
        .into_iter()
        .filter_map(|o| match o {
            Output::Steer(deg) if deg != 0.0 => Some(deg),
            _ => None,
        })
        .collect();
    assert_eq!(turns.len(), 8);
    assert!(turns.iter().all(|deg| deg.abs() == 40.0));
    assert_eq!(hunt.stats().escapes, 8);
}

#[test]
fn safe_floor_never_trips() {
    let rig = Rig::default();
    let mut hunt = armed(&rig);
    for _ in 0..10 {
        cycle(&mut hunt);
    }
    assert_eq!(hunt.stats().escapes, 0);
    assert_eq!(hunt.stats().cycles, 10);
}
