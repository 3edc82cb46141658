use blaze_board::detector::{DetectorCell, Transition, detect};
use blaze_board::state::AggregateCounters;

fn counters(kills: u64, deaths: u64) -> AggregateCounters {
    AggregateCounters { kills, deaths }
}

#[test]
fn starts_from_zero() {
    let cell = DetectorCell::new();
    assert_eq!(cell.last(), counters(0, 0));
}

#[test]
fn one_kill_event_per_cycle_regardless_of_jump() {
    let mut cell = DetectorCell::new();
    let mut kill_events = 0;
    for (cycle, kills) in [1u64, 4, 5, 12, 40].into_iter().enumerate() {
        let detection = detect(&mut cell, counters(kills, 0));
        assert_eq!(detection.transition, Transition::Kill, "cycle {cycle}");
        if detection.transition.has_kill() {
            kill_events += 1;
        }
    }
    assert_eq!(kill_events, 5);
}

#[test]
fn burst_of_kills_reports_delta_but_single_transition() {
    let mut cell = DetectorCell::new();
    detect(&mut cell, counters(10, 2));
    let detection = detect(&mut cell, counters(13, 2));
    assert_eq!(detection.transition, Transition::Kill);
    assert_eq!(detection.kill_delta, 3);
    assert_eq!(detection.death_delta, 0);
    assert!(!detection.reset);
}

#[test]
fn unchanged_counters_emit_nothing() {
    let mut cell = DetectorCell::new();
    detect(&mut cell, counters(6, 3));
    for _ in 0..5 {
        let detection = detect(&mut cell, counters(6, 3));
        assert_eq!(detection.transition, Transition::NoChange);
        assert!(!detection.transition.has_kill());
        assert!(!detection.transition.has_death());
    }
}

#[test]
fn kill_and_death_in_one_cycle() {
    let mut cell = DetectorCell::new();
    let detection = detect(&mut cell, counters(1, 1));
    assert_eq!(detection.transition, Transition::Both);
    assert!(detection.transition.has_kill());
    assert!(detection.transition.has_death());

    let detection = detect(&mut cell, counters(1, 2));
    assert_eq!(detection.transition, Transition::Death);
}

#[test]
fn decrease_is_a_silent_reset_that_still_commits() {
    let mut cell = DetectorCell::new();
    detect(&mut cell, counters(20, 15));

    let detection = detect(&mut cell, counters(0, 0));
    assert_eq!(detection.transition, Transition::NoChange);
    assert_eq!(detection.kill_delta, 0);
    assert!(detection.reset);
    assert_eq!(cell.last(), counters(0, 0));

    // The next kill after the reset is measured from the lowered baseline.
    let detection = detect(&mut cell, counters(1, 0));
    assert_eq!(detection.transition, Transition::Kill);
    assert_eq!(detection.kill_delta, 1);
}

#[test]
fn partial_decrease_still_reports_the_other_counter() {
    let mut cell = DetectorCell::new();
    detect(&mut cell, counters(8, 8));
    let detection = detect(&mut cell, counters(3, 9));
    assert_eq!(detection.transition, Transition::Death);
    assert!(detection.reset);
    assert_eq!(cell.last(), counters(3, 9));
}
