use std::collections::VecDeque;
use std::time::Instant;

use chrono::Local;
use serde::Deserialize;

use crate::detector::{Detection, Transition};
use crate::effects::EffectRegistry;
use crate::ranking::RankingView;
use crate::victory::{self, VictorySummary};

pub const DEFAULT_TEAM1_NAME: &str = "TEAM HEARTS";
pub const DEFAULT_TEAM2_NAME: &str = "TEAM SPADES";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub rfid: String,
    #[serde(default = "unknown_name")]
    pub name: String,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
}

fn unknown_name() -> String {
    "Unknown".to_string()
}

pub type TeamSnapshot = Vec<PlayerRecord>;

/// Both teams as read in a single poll of `/api/players`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MatchSnapshot {
    pub team1: TeamSnapshot,
    pub team2: TeamSnapshot,
}

impl MatchSnapshot {
    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.team1.iter().chain(self.team2.iter())
    }

    pub fn counters(&self) -> AggregateCounters {
        self.players().fold(AggregateCounters::default(), |acc, p| {
            AggregateCounters {
                kills: acc.kills + u64::from(p.kills),
                deaths: acc.deaths + u64::from(p.deaths),
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateCounters {
    pub kills: u64,
    pub deaths: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MatchStatus {
    pub ended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Board,
    Victory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Snapshot,
    Status,
}

#[derive(Debug, Clone)]
pub enum Delta {
    Snapshot {
        seq: u64,
        snapshot: MatchSnapshot,
        detection: Detection,
    },
    MatchStatus(MatchStatus),
    CycleSkipped {
        poll: PollKind,
        reason: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub struct BoardState {
    pub screen: Screen,
    pub team1_name: String,
    pub team2_name: String,
    pub source_label: String,
    pub snapshot: Option<MatchSnapshot>,
    pub rankings: RankingView,
    pub effects: EffectRegistry,
    pub last_transition: Option<Transition>,
    pub match_ended: bool,
    pub victory: Option<VictorySummary>,
    pub accepted_cycles: u64,
    pub skipped_snapshot_cycles: u64,
    pub skipped_status_cycles: u64,
    pub kill_events: u64,
    pub death_events: u64,
    pub logs: VecDeque<String>,
    pub console_visible: bool,
    pub help_overlay: bool,
    pub torn_down: bool,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    pub fn new() -> Self {
        Self::with_effects(EffectRegistry::new())
    }

    pub fn with_effects(effects: EffectRegistry) -> Self {
        Self {
            screen: Screen::Board,
            team1_name: DEFAULT_TEAM1_NAME.to_string(),
            team2_name: DEFAULT_TEAM2_NAME.to_string(),
            source_label: String::new(),
            snapshot: None,
            rankings: RankingView::default(),
            effects,
            last_transition: None,
            match_ended: false,
            victory: None,
            accepted_cycles: 0,
            skipped_snapshot_cycles: 0,
            skipped_status_cycles: 0,
            kill_events: 0,
            death_events: 0,
            logs: VecDeque::new(),
            console_visible: false,
            help_overlay: false,
            torn_down: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        let line = format!("{} {}", Local::now().format("%H:%M:%S"), msg.into());
        self.logs.push_back(line);
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Marks the view as unmounted. Deltas that arrive afterwards are dropped.
    pub fn tear_down(&mut self) {
        self.torn_down = true;
        self.effects.clear();
    }

    pub fn toggle_victory(&mut self) {
        self.screen = match self.screen {
            Screen::Board if self.victory.is_some() => Screen::Victory,
            _ => Screen::Board,
        };
    }

    pub fn team_name(&self, winner: victory::Winner) -> &str {
        match winner {
            victory::Winner::Team1 => &self.team1_name,
            victory::Winner::Team2 => &self.team2_name,
            victory::Winner::Tie => "NO VICTOR",
        }
    }
}

pub fn apply_delta(state: &mut BoardState, delta: Delta, now: Instant) {
    if state.torn_down {
        return;
    }
    match delta {
        Delta::Snapshot {
            seq,
            snapshot,
            detection,
        } => {
            if detection.reset {
                state.push_log(format!(
                    "[INFO] Counters dropped at cycle {seq}, treating as new match"
                ));
            }
            if detection.transition != Transition::NoChange {
                state.effects.on_transition(detection.transition, now);
            }
            if detection.transition.has_kill() {
                state.kill_events += 1;
            }
            if detection.transition.has_death() {
                state.death_events += 1;
            }

            state.rankings = RankingView::from_snapshot(&snapshot);
            if state.match_ended {
                state.victory = Some(victory::summarize(&snapshot));
            }
            state.snapshot = Some(snapshot);
            state.last_transition = Some(detection.transition);
            state.accepted_cycles += 1;
        }
        Delta::MatchStatus(status) => {
            if status.ended && !state.match_ended {
                state.match_ended = true;
                let summary = state.snapshot.as_ref().map(victory::summarize).unwrap_or_default();
                let msg = format!(
                    "[INFO] Match ended: {} ({}-{})",
                    state.team_name(summary.winner),
                    summary.team1_score,
                    summary.team2_score
                );
                state.push_log(msg);
                state.victory = Some(summary);
                state.screen = Screen::Victory;
            } else if !status.ended && state.match_ended {
                state.match_ended = false;
                state.victory = None;
                state.screen = Screen::Board;
                state.push_log("[INFO] Match reopened");
            }
        }
        Delta::CycleSkipped { poll, reason } => {
            match poll {
                PollKind::Snapshot => state.skipped_snapshot_cycles += 1,
                PollKind::Status => state.skipped_status_cycles += 1,
            }
            let label = match poll {
                PollKind::Snapshot => "Scoreboard",
                PollKind::Status => "Status",
            };
            state.push_log(format!("[WARN] {label} poll skipped: {reason}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
