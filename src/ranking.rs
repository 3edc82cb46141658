use crate::state::{MatchSnapshot, PlayerRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPlayer {
    /// 1-based position within the team.
    pub rank: usize,
    pub ratio: f64,
    pub player: PlayerRecord,
}

/// Per-team rankings for one accepted snapshot. Rebuilt from scratch every cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingView {
    pub team1: Vec<RankedPlayer>,
    pub team2: Vec<RankedPlayer>,
}

impl RankingView {
    pub fn from_snapshot(snapshot: &MatchSnapshot) -> Self {
        Self {
            team1: rank_team(&snapshot.team1),
            team2: rank_team(&snapshot.team2),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.team1.is_empty() && self.team2.is_empty()
    }
}

/// Kill/death ratio. A player without deaths scores their raw kill count.
pub fn kd_ratio(kills: u32, deaths: u32) -> f64 {
    if deaths == 0 {
        f64::from(kills)
    } else {
        f64::from(kills) / f64::from(deaths)
    }
}

pub fn format_ratio(ratio: f64) -> String {
    format!("{ratio:.2}")
}

/// Orders a team by descending K/D. The sort is stable, so equal ratios keep the order the
/// backend listed them in.
pub fn rank_team(players: &[PlayerRecord]) -> Vec<RankedPlayer> {
    let mut scored: Vec<(f64, &PlayerRecord)> = players
        .iter()
        .map(|p| (kd_ratio(p.kills, p.deaths), p))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (ratio, player))| RankedPlayer {
            rank: idx + 1,
            ratio,
            player: player.clone(),
        })
        .collect()
}
