use std::time::{Duration, Instant};

use blaze_board::detector::{Detection, Transition};
use blaze_board::effects::{EffectKind, EffectRegistry};
use blaze_board::state::{
    BoardState, Delta, MatchSnapshot, MatchStatus, PlayerRecord, PollKind, Screen, apply_delta,
};
use blaze_board::victory::Winner;

fn player(rfid: &str, name: &str, kills: u32, deaths: u32) -> PlayerRecord {
    PlayerRecord {
        rfid: rfid.to_string(),
        name: name.to_string(),
        kills,
        deaths,
    }
}

fn snapshot(h1_kills: u32, s1_deaths: u32) -> MatchSnapshot {
    MatchSnapshot {
        team1: vec![
            player("RFID001", "Ace", h1_kills, 1),
            player("RFID002", "Blaze", 2, 0),
        ],
        team2: vec![
            player("RFID005", "Cobra", 1, s1_deaths),
            player("RFID006", "Dash", 0, 2),
        ],
    }
}

fn detection(transition: Transition) -> Detection {
    Detection {
        transition,
        kill_delta: u64::from(transition.has_kill()),
        death_delta: u64::from(transition.has_death()),
        reset: false,
    }
}

fn snapshot_delta(seq: u64, snapshot: MatchSnapshot, transition: Transition) -> Delta {
    Delta::Snapshot {
        seq,
        snapshot,
        detection: detection(transition),
    }
}

fn seeded_state() -> BoardState {
    BoardState::with_effects(EffectRegistry::with_seed(7))
}

#[test]
fn kill_snapshot_spawns_effects_and_reranks() {
    let now = Instant::now();
    let mut state = seeded_state();

    apply_delta(&mut state, snapshot_delta(0, snapshot(4, 2), Transition::Kill), now);

    assert_eq!(state.accepted_cycles, 1);
    assert_eq!(state.kill_events, 1);
    assert_eq!(state.death_events, 0);
    assert_eq!(state.last_transition, Some(Transition::Kill));
    assert_eq!(state.effects.live(now).count(), 9);
    assert!(state.effects.burst_active(now));
    assert_eq!(state.rankings.team1[0].player.name, "Ace");
    assert_eq!(state.rankings.team2[0].player.name, "Cobra");
    assert_eq!(state.screen, Screen::Board);
}

#[test]
fn unchanged_snapshot_only_refreshes_the_table() {
    let now = Instant::now();
    let mut state = seeded_state();

    apply_delta(&mut state, snapshot_delta(0, snapshot(1, 2), Transition::NoChange), now);
    assert_eq!(state.effects.stored(), 0);
    assert_eq!(state.rankings.team1[0].player.name, "Blaze");

    // Ace overtakes Blaze without any transition being reported.
    apply_delta(&mut state, snapshot_delta(1, snapshot(3, 2), Transition::NoChange), now);
    assert_eq!(state.rankings.team1[0].player.name, "Ace");
    assert_eq!(state.accepted_cycles, 2);
    assert_eq!(state.kill_events, 0);
}

#[test]
fn death_snapshot_spawns_a_flash() {
    let now = Instant::now();
    let mut state = seeded_state();
    apply_delta(&mut state, snapshot_delta(0, snapshot(1, 3), Transition::Death), now);
    assert_eq!(state.death_events, 1);
    assert_eq!(state.effects.count_live(now, EffectKind::is_flash), 1);
    assert!(!state.effects.shake_active(now));
}

#[test]
fn reset_is_logged_without_effects() {
    let now = Instant::now();
    let mut state = seeded_state();
    let delta = Delta::Snapshot {
        seq: 4,
        snapshot: MatchSnapshot::default(),
        detection: Detection {
            transition: Transition::NoChange,
            kill_delta: 0,
            death_delta: 0,
            reset: true,
        },
    };
    apply_delta(&mut state, delta, now);
    assert_eq!(state.effects.stored(), 0);
    assert!(state.rankings.is_empty());
    assert!(state.logs.back().is_some_and(|line| line.contains("cycle 4")));
}

#[test]
fn skipped_cycle_keeps_last_snapshot() {
    let now = Instant::now();
    let mut state = seeded_state();
    apply_delta(&mut state, snapshot_delta(0, snapshot(4, 2), Transition::Kill), now);
    let before = state.snapshot.clone();

    apply_delta(
        &mut state,
        Delta::CycleSkipped {
            poll: PollKind::Snapshot,
            reason: "connection refused".to_string(),
        },
        now,
    );
    apply_delta(
        &mut state,
        Delta::CycleSkipped {
            poll: PollKind::Status,
            reason: "timeout".to_string(),
        },
        now,
    );

    assert_eq!(state.snapshot, before);
    assert_eq!(state.skipped_snapshot_cycles, 1);
    assert_eq!(state.skipped_status_cycles, 1);
    assert_eq!(state.accepted_cycles, 1);
    assert!(
        state
            .logs
            .back()
            .is_some_and(|line| line.contains("[WARN] Status poll skipped: timeout"))
    );
}

#[test]
fn match_end_switches_to_victory_and_back() {
    let now = Instant::now();
    let mut state = seeded_state();
    apply_delta(&mut state, snapshot_delta(0, snapshot(4, 2), Transition::Kill), now);

    apply_delta(&mut state, Delta::MatchStatus(MatchStatus { ended: false }), now);
    assert_eq!(state.screen, Screen::Board);
    assert!(state.victory.is_none());

    apply_delta(&mut state, Delta::MatchStatus(MatchStatus { ended: true }), now);
    assert_eq!(state.screen, Screen::Victory);
    let summary = state.victory.as_ref().expect("summary should be set");
    assert_eq!(summary.winner, Winner::Team1);
    assert_eq!(summary.team1_score, 6);
    assert_eq!(summary.team2_score, 1);
    assert_eq!(summary.mvp.as_ref().map(|p| p.name.as_str()), Some("Ace"));

    // Repeated end flags do not re-log or reset the screen.
    let logs = state.logs.len();
    state.toggle_victory();
    apply_delta(&mut state, Delta::MatchStatus(MatchStatus { ended: true }), now);
    assert_eq!(state.screen, Screen::Board);
    assert_eq!(state.logs.len(), logs);

    apply_delta(&mut state, Delta::MatchStatus(MatchStatus { ended: false }), now);
    assert_eq!(state.screen, Screen::Board);
    assert!(state.victory.is_none());
    assert!(!state.match_ended);
}

#[test]
fn match_end_before_any_snapshot_is_a_tie() {
    let mut state = seeded_state();
    apply_delta(
        &mut state,
        Delta::MatchStatus(MatchStatus { ended: true }),
        Instant::now(),
    );
    let summary = state.victory.as_ref().expect("summary should be set");
    assert_eq!(summary.winner, Winner::Tie);
    assert!(summary.mvp.is_none());
    assert_eq!(state.team_name(summary.winner), "NO VICTOR");
}

#[test]
fn late_snapshot_refreshes_the_victory_summary() {
    let now = Instant::now();
    let mut state = seeded_state();
    apply_delta(&mut state, Delta::MatchStatus(MatchStatus { ended: true }), now);
    apply_delta(&mut state, snapshot_delta(0, snapshot(0, 2), Transition::NoChange), now);
    let summary = state.victory.as_ref().expect("summary should be set");
    assert_eq!(summary.team1_score, 2);
    assert_eq!(summary.team2_score, 1);
}

#[test]
fn deltas_after_tear_down_are_ignored() {
    let now = Instant::now();
    let mut state = seeded_state();
    apply_delta(&mut state, snapshot_delta(0, snapshot(4, 2), Transition::Kill), now);
    state.tear_down();
    assert_eq!(state.effects.stored(), 0);

    let later = now + Duration::from_millis(100);
    apply_delta(&mut state, snapshot_delta(1, snapshot(9, 2), Transition::Kill), later);
    apply_delta(&mut state, Delta::MatchStatus(MatchStatus { ended: true }), later);
    apply_delta(&mut state, Delta::Log("late".to_string()), later);

    assert_eq!(state.accepted_cycles, 1);
    assert_eq!(state.kill_events, 1);
    assert_eq!(state.effects.stored(), 0);
    assert_eq!(state.screen, Screen::Board);
    assert!(state.logs.iter().all(|line| !line.ends_with("late")));
}

#[test]
fn log_ring_is_capped() {
    let mut state = seeded_state();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("line {i}")), Instant::now());
    }
    assert_eq!(state.logs.len(), 200);
    assert!(state.logs.back().is_some_and(|line| line.ends_with("line 249")));
}
