use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::config::BoardConfig;
use crate::detector::{self, DetectorCell};
use crate::source::ScoreSource;
use crate::state::{Delta, MatchSnapshot, PollKind};
use crate::status_watch::run_status_watcher;

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub period: Duration,
    pub inflight_max: usize,
}

impl From<&BoardConfig> for PollerConfig {
    fn from(config: &BoardConfig) -> Self {
        Self {
            period: config.snapshot_period,
            inflight_max: config.inflight_max,
        }
    }
}

/// Polls the scoreboard on a fixed period.
///
/// Every tick starts its fetch as a separate task, so a slow response never holds back the
/// next cycle. Completed fetches are handled one at a time in this loop: the detector cell
/// lives here and is only touched between two awaits, so detections never interleave.
/// Responses carry the sequence number of the tick that started them and anything older
/// than the newest accepted snapshot is dropped.
///
/// The loop ends when `stop` flips to true (or its sender goes away) or the view hangs up.
/// In-flight fetches are aborted on the way out and a response completing after stop is
/// never forwarded.
pub async fn run_snapshot_poller<S: ScoreSource>(
    source: S,
    config: PollerConfig,
    tx: mpsc::UnboundedSender<Delta>,
    mut stop: watch::Receiver<bool>,
) {
    let mut cell = DetectorCell::new();
    let mut ticker = tokio::time::interval(config.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut inflight: JoinSet<(u64, Result<MatchSnapshot>)> = JoinSet::new();
    let mut next_seq: u64 = 0;
    let mut newest_accepted: Option<u64> = None;

    while !*stop.borrow() {
        tokio::select! {
            biased;

            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                if *stop.borrow() {
                    break;
                }
                let (seq, result) = match joined {
                    Ok(done) => done,
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Scoreboard fetch task failed: {err}")));
                        continue;
                    }
                };
                let snapshot = match result {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        let _ = tx.send(Delta::CycleSkipped {
                            poll: PollKind::Snapshot,
                            reason: format!("{err:#}"),
                        });
                        continue;
                    }
                };
                if newest_accepted.is_some_and(|newest| seq < newest) {
                    let _ = tx.send(Delta::Log(format!("[INFO] Dropped stale scoreboard response #{seq}")));
                    continue;
                }
                newest_accepted = Some(seq);
                let detection = detector::detect(&mut cell, snapshot.counters());
                if tx.send(Delta::Snapshot { seq, snapshot, detection }).is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if tx.is_closed() {
                    break;
                }
                if inflight.len() >= config.inflight_max {
                    let _ = tx.send(Delta::CycleSkipped {
                        poll: PollKind::Snapshot,
                        reason: format!("{} fetches still in flight", inflight.len()),
                    });
                    continue;
                }
                let seq = next_seq;
                next_seq += 1;
                let source = source.clone();
                inflight.spawn(async move { (seq, source.fetch_snapshot().await) });
            }
        }
    }

    inflight.abort_all();
}

/// Both polling loops of a mounted board, sharing one stop signal.
pub struct PollerHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    /// Signals both loops to stop. Nothing they produce afterwards reaches the view.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Stops both loops and waits for them to wind down.
    pub async fn shutdown(self) {
        self.stop();
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Mounts the scoreboard poller and the match-status watcher on the current runtime.
pub fn spawn_board_tasks<S: ScoreSource>(
    source: S,
    config: &BoardConfig,
    tx: mpsc::UnboundedSender<Delta>,
) -> PollerHandle {
    let (stop_tx, stop_rx) = watch::channel(false);
    let snapshot_task = tokio::spawn(run_snapshot_poller(
        source.clone(),
        PollerConfig::from(config),
        tx.clone(),
        stop_rx.clone(),
    ));
    let status_task = tokio::spawn(run_status_watcher(
        source,
        config.status_period,
        tx,
        stop_rx,
    ));
    PollerHandle {
        stop_tx,
        tasks: vec![snapshot_task, status_task],
    }
}
