use crate::state::AggregateCounters;

/// Classification of one accepted snapshot against the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    NoChange,
    Kill,
    Death,
    Both,
}

impl Transition {
    fn from_flags(kill: bool, death: bool) -> Self {
        match (kill, death) {
            (false, false) => Transition::NoChange,
            (true, false) => Transition::Kill,
            (false, true) => Transition::Death,
            (true, true) => Transition::Both,
        }
    }

    pub fn has_kill(self) -> bool {
        matches!(self, Transition::Kill | Transition::Both)
    }

    pub fn has_death(self) -> bool {
        matches!(self, Transition::Death | Transition::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub transition: Transition,
    pub kill_delta: u64,
    pub death_delta: u64,
    /// True when at least one counter went down, i.e. the backend started a new match.
    pub reset: bool,
}

/// The last accepted counters. Owned by the snapshot poller and only ever written by
/// [`detect`].
#[derive(Debug, Clone, Default)]
pub struct DetectorCell {
    last: AggregateCounters,
}

impl DetectorCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> AggregateCounters {
        self.last
    }
}

/// Compares `incoming` with the cell and commits it. A burst of several kills between two
/// polls yields a single kill transition; a drop in either counter yields no event.
pub fn detect(cell: &mut DetectorCell, incoming: AggregateCounters) -> Detection {
    let last = cell.last;
    let kill_delta = incoming.kills.saturating_sub(last.kills);
    let death_delta = incoming.deaths.saturating_sub(last.deaths);
    let reset = incoming.kills < last.kills || incoming.deaths < last.deaths;

    let detection = Detection {
        transition: Transition::from_flags(kill_delta > 0, death_delta > 0),
        kill_delta,
        death_delta,
        reset,
    };
    cell.last = incoming;
    detection
}
