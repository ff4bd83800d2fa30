// tests/sequence_tests.rs
// Drives the recording core through whole playback runs with scripted outcomes.

use rstest::rstest;
use std::time::Duration;
use waypoint_recorder::core::state::{DWELL_PAUSE, FIRST_VISIT_PAUSE};
use waypoint_recorder::core::{Core, Directive, GoalTicket, SequenceState};
use waypoint_recorder::{GoalOutcome, Orientation, Position, RecorderError};

fn recorded(count: usize) -> Core {
    let mut core = Core::new();
    for i in 0..count {
        core.on_pose_sample(Position::new(i as f64, -(i as f64), 0.0), Orientation::identity());
        assert_eq!(core.record().unwrap(), i);
    }
    core
}

/// A step of playback as seen from outside: a goal sent or a dwell scheduled.
#[derive(Debug, PartialEq)]
enum Step {
    Goal(usize),
    Pause(Duration),
}

// Succeeds every goal and fires every dwell until `limit` goals were sent.
fn play(core: &mut Core, limit: usize) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut directive = core.start().unwrap();
    let mut goals = 0;
    loop {
        directive = match directive {
            Directive::SendGoal { ticket, index, .. } => {
                steps.push(Step::Goal(index));
                goals += 1;
                if goals == limit {
                    return steps;
                }
                core.on_result(ticket, GoalOutcome::Succeeded).unwrap()
            }
            Directive::Dwell { ticket, pause, .. } => {
                steps.push(Step::Pause(pause));
                core.on_dwell_elapsed(ticket).unwrap()
            }
            _ => return steps,
        };
    }
}

fn ticket_of(directive: &Directive) -> GoalTicket {
    match directive {
        Directive::SendGoal { ticket, .. } => *ticket,
        other => panic!("expected a goal, got {:?}", other),
    }
}

#[test]
fn records_keep_call_order() {
    let core = recorded(4);
    let store = core.waypoints();
    assert_eq!(store.len(), 4);
    for i in 0..4 {
        let waypoint = store.get(i).unwrap();
        assert_eq!(waypoint.position, Position::new(i as f64, -(i as f64), 0.0));
    }
}

#[test]
fn record_before_any_pose_fails_and_leaves_store_empty() {
    let mut core = Core::new();
    assert!(matches!(core.record(), Err(RecorderError::NoPoseAvailable)));
    assert!(core.waypoints().is_empty());
}

#[test]
fn start_on_empty_store_stays_idle() {
    let mut core = Core::new();
    assert!(matches!(core.start(), Err(RecorderError::NoWaypointsRecorded)));
    assert_eq!(core.sequence().state(), SequenceState::Idle);
    assert!(!core.sequence().is_active());
    assert!(!core.waypoints().is_frozen());
}

#[test]
fn recording_is_rejected_once_playback_started() {
    let mut core = recorded(2);
    core.start().unwrap();
    assert!(matches!(core.record(), Err(RecorderError::StoreFrozen)));
    assert_eq!(core.waypoints().len(), 2);
}

#[test]
fn ten_waypoints_dwell_at_six_and_eight_then_wrap_to_eight() {
    let mut core = recorded(10);
    let steps = play(&mut core, 40);

    let mut expected: Vec<Step> = (0..=6).map(Step::Goal).collect();
    expected.push(Step::Pause(DWELL_PAUSE));
    expected.extend([Step::Goal(7), Step::Goal(8), Step::Pause(FIRST_VISIT_PAUSE), Step::Goal(9)]);
    while expected.iter().filter(|s| matches!(s, Step::Goal(_))).count() < 40 {
        expected.push(Step::Goal(8));
        expected.push(Step::Goal(9));
    }
    expected.truncate(steps.len());

    assert_eq!(steps, expected);
    let first_visit_pauses = steps
        .iter()
        .filter(|s| **s == Step::Pause(FIRST_VISIT_PAUSE))
        .count();
    assert_eq!(first_visit_pauses, 1);
    assert!(core.sequence().first_visit_pause_fired());
}

#[test]
fn single_waypoint_holds_after_first_success() {
    let mut core = recorded(1);
    let first = core.start().unwrap();
    let next = core.on_result(ticket_of(&first), GoalOutcome::Succeeded).unwrap();

    assert_eq!(next, Directive::Hold { index: 0 });
    assert_eq!(core.sequence().state(), SequenceState::Holding { index: 0 });
    assert!(!core.sequence().is_active());
}

#[test]
fn five_waypoints_wrap_to_zero() {
    let mut core = recorded(5);
    let steps = play(&mut core, 8);
    let goals: Vec<_> = steps
        .into_iter()
        .map(|s| match s {
            Step::Goal(i) => i,
            Step::Pause(p) => panic!("unexpected pause {:?}", p),
        })
        .collect();
    assert_eq!(goals, vec![0, 1, 2, 3, 4, 0, 1, 2]);
}

#[test]
fn nine_waypoints_wrap_to_zero_after_first_visit_pause() {
    let mut core = recorded(9);
    let steps = play(&mut core, 11);
    assert_eq!(
        steps,
        vec![
            Step::Goal(0),
            Step::Goal(1),
            Step::Goal(2),
            Step::Goal(3),
            Step::Goal(4),
            Step::Goal(5),
            Step::Goal(6),
            Step::Pause(DWELL_PAUSE),
            Step::Goal(7),
            Step::Goal(8),
            Step::Pause(FIRST_VISIT_PAUSE),
            Step::Goal(0),
            Step::Goal(1),
        ]
    );
}

#[rstest]
#[case(GoalOutcome::Aborted)]
#[case(GoalOutcome::Canceled)]
#[case(GoalOutcome::Unknown("Executing".into()))]
fn failed_goal_halts_and_restart_begins_at_zero(#[case] failure: GoalOutcome) {
    let mut core = recorded(4);
    let first = core.start().unwrap();
    let second = core.on_result(ticket_of(&first), GoalOutcome::Succeeded).unwrap();

    let halted = core.on_result(ticket_of(&second), failure.clone()).unwrap();
    assert_eq!(halted, Directive::Halt { index: 1, outcome: failure });
    assert_eq!(core.sequence().state(), SequenceState::Idle);
    assert!(!core.sequence().is_active());

    let restarted = core.start().unwrap();
    assert!(matches!(restarted, Directive::SendGoal { index: 0, .. }));
    assert!(core.sequence().is_active());
    assert_eq!(core.sequence().current_index(), 0);
}

#[test]
fn first_visit_pause_survives_restart() {
    let mut core = recorded(10);
    let steps = play(&mut core, 10);
    assert!(steps.contains(&Step::Pause(FIRST_VISIT_PAUSE)));

    // Abort goal #9 then replay from the top.
    let SequenceState::GoalInFlight { ticket, index: 9 } = core.sequence().state() else {
        panic!("expected goal #9 in flight, got {:?}", core.sequence().state());
    };
    core.on_result(ticket, GoalOutcome::Aborted).unwrap();

    let replay = play(&mut core, 12);
    assert!(!replay.contains(&Step::Pause(FIRST_VISIT_PAUSE)));
    assert!(replay.contains(&Step::Pause(DWELL_PAUSE)));
}
