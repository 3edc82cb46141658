use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::source::ScoreSource;
use crate::state::{Delta, PollKind};

/// Polls the match-ended flag on its own period. It has no state of its own beyond the
/// ticker and shares nothing with the scoreboard poller except the stop signal. A fetch
/// that outlasts the period simply causes the missed ticks to be skipped.
pub async fn run_status_watcher<S: ScoreSource>(
    source: S,
    period: Duration,
    tx: mpsc::UnboundedSender<Delta>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !*stop.borrow() {
        tokio::select! {
            biased;

            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let result = tokio::select! {
                    biased;
                    _ = stop.changed() => break,
                    result = source.fetch_status() => result,
                };
                if *stop.borrow() {
                    break;
                }
                let delta = match result {
                    Ok(status) => Delta::MatchStatus(status),
                    Err(err) => Delta::CycleSkipped {
                        poll: PollKind::Status,
                        reason: format!("{err:#}"),
                    },
                };
                if tx.send(delta).is_err() {
                    break;
                }
            }
        }
    }
}
