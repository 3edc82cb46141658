use crate::state::{MatchSnapshot, PlayerRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Winner {
    Team1,
    Team2,
    #[default]
    Tie,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VictorySummary {
    pub winner: Winner,
    pub team1_score: u64,
    pub team2_score: u64,
    pub mvp: Option<PlayerRecord>,
    /// Players of the winning side (everyone on a tie), most kills first.
    pub winners: Vec<PlayerRecord>,
}

pub fn summarize(snapshot: &MatchSnapshot) -> VictorySummary {
    let team1_score = team_score(&snapshot.team1);
    let team2_score = team_score(&snapshot.team2);
    let winner = if team1_score > team2_score {
        Winner::Team1
    } else if team2_score > team1_score {
        Winner::Team2
    } else {
        Winner::Tie
    };

    // First player with the highest kill count wins MVP.
    let mvp = snapshot
        .players()
        .fold(None::<&PlayerRecord>, |best, p| match best {
            Some(b) if b.kills >= p.kills => Some(b),
            _ => Some(p),
        })
        .cloned();

    let mut winners: Vec<PlayerRecord> = match winner {
        Winner::Team1 => snapshot.team1.clone(),
        Winner::Team2 => snapshot.team2.clone(),
        Winner::Tie => snapshot.players().cloned().collect(),
    };
    winners.sort_by(|a, b| b.kills.cmp(&a.kills));

    VictorySummary {
        winner,
        team1_score,
        team2_score,
        mvp,
        winners,
    }
}

fn team_score(team: &[PlayerRecord]) -> u64 {
    team.iter().map(|p| u64::from(p.kills)).sum()
}
