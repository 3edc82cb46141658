use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::source::ScoreSource;
use crate::state::{MatchSnapshot, MatchStatus, PlayerRecord};

const ROSTER: [(&str, Team); 8] = [
    ("H1", Team::One),
    ("H2", Team::One),
    ("H3", Team::One),
    ("H4", Team::One),
    ("S1", Team::Two),
    ("S2", Team::Two),
    ("BlahBlah", Team::Two),
    ("S4", Team::Two),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Team {
    One,
    Two,
}

#[derive(Debug)]
struct SimGame {
    players: Vec<(Team, PlayerRecord)>,
    started: Instant,
    duration: Duration,
    next_event_at: Instant,
    min_gap: Duration,
    max_gap: Duration,
    rng: StdRng,
}

impl SimGame {
    fn advance(&mut self, now: Instant) {
        let end = self.started + self.duration;
        while self.next_event_at <= now && self.next_event_at < end {
            let killer = self.rng.gen_range(0..self.players.len());
            let victim = self.rng.gen_range(0..self.players.len());
            if killer != victim {
                self.players[killer].1.kills += 1;
                self.players[victim].1.deaths += 1;
            }
            let gap_ms = self
                .rng
                .gen_range(self.min_gap.as_millis() as u64..=self.max_gap.as_millis() as u64);
            self.next_event_at += Duration::from_millis(gap_ms.max(1));
        }
    }

    fn snapshot(&self) -> MatchSnapshot {
        let team = |side: Team| {
            self.players
                .iter()
                .filter(|(t, _)| *t == side)
                .map(|(_, p)| p.clone())
                .collect::<Vec<_>>()
        };
        MatchSnapshot {
            team1: team(Team::One),
            team2: team(Team::Two),
        }
    }

    fn ended(&self, now: Instant) -> bool {
        now.duration_since(self.started) >= self.duration
    }
}

/// An in-process match with eight registered tags. Each read advances the game clock,
/// applying random kill/death pairs at 2-4 second intervals until the match time is up.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    game: Arc<Mutex<SimGame>>,
}

impl SimulatedSource {
    pub fn new(duration: Duration) -> Self {
        Self::build(
            StdRng::from_entropy(),
            Instant::now(),
            duration,
            Duration::from_secs(2),
            Duration::from_secs(4),
        )
    }

    /// Deterministic game for tests and demos. Events fire every `gap` starting at `started`.
    pub fn seeded(seed: u64, started: Instant, duration: Duration, gap: Duration) -> Self {
        Self::build(StdRng::seed_from_u64(seed), started, duration, gap, gap)
    }

    fn build(
        rng: StdRng,
        started: Instant,
        duration: Duration,
        min_gap: Duration,
        max_gap: Duration,
    ) -> Self {
        let players = ROSTER
            .iter()
            .enumerate()
            .map(|(idx, (name, team))| {
                (
                    *team,
                    PlayerRecord {
                        rfid: format!("RFID{:03}", idx + 1),
                        name: (*name).to_string(),
                        kills: 0,
                        deaths: 0,
                    },
                )
            })
            .collect();
        let game = SimGame {
            players,
            started,
            duration,
            next_event_at: started + min_gap,
            min_gap,
            max_gap,
            rng,
        };
        Self {
            game: Arc::new(Mutex::new(game)),
        }
    }

    pub fn snapshot_at(&self, now: Instant) -> Result<MatchSnapshot> {
        let mut game = self
            .game
            .lock()
            .map_err(|_| anyhow!("simulated game lock poisoned"))?;
        game.advance(now);
        Ok(game.snapshot())
    }

    pub fn status_at(&self, now: Instant) -> Result<MatchStatus> {
        let game = self
            .game
            .lock()
            .map_err(|_| anyhow!("simulated game lock poisoned"))?;
        Ok(MatchStatus {
            ended: game.ended(now),
        })
    }
}

impl ScoreSource for SimulatedSource {
    async fn fetch_snapshot(&self) -> Result<MatchSnapshot> {
        self.snapshot_at(Instant::now())
    }

    async fn fetch_status(&self) -> Result<MatchStatus> {
        self.status_at(Instant::now())
    }

    fn describe(&self) -> String {
        "simulated match".to_string()
    }
}
