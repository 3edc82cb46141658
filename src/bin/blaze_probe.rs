use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;

use blaze_board::config::{BoardConfig, SourceKind};
use blaze_board::detector::Transition;
use blaze_board::fetch::HttpSource;
use blaze_board::poller::spawn_board_tasks;
use blaze_board::ranking::{format_ratio, rank_team};
use blaze_board::sim_feed::SimulatedSource;
use blaze_board::source::ScoreSource;
use blaze_board::state::{BoardState, Delta, apply_delta};

const DEFAULT_RUN_SECS: u64 = 20;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut config = BoardConfig::from_env();
    if has_flag("--sim") {
        config.source = SourceKind::Sim;
    }
    if let Some(url) = parse_string_arg("--url") {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    let run_for = Duration::from_secs(parse_u64_arg("--secs").unwrap_or(DEFAULT_RUN_SECS).max(1));

    let summary = match config.source {
        SourceKind::Http => {
            let source = HttpSource::new(&config.api_url, config.request_timeout);
            probe(source, &config, run_for).await
        }
        SourceKind::Sim => {
            probe(SimulatedSource::new(config.sim_duration), &config, run_for).await
        }
    };

    println!("Probe complete");
    println!("Accepted cycles: {}", summary.accepted_cycles);
    println!(
        "Skipped cycles: {} scoreboard, {} status",
        summary.skipped_snapshot_cycles, summary.skipped_status_cycles
    );
    println!(
        "Events: {} kill, {} death",
        summary.kill_events, summary.death_events
    );
    Ok(())
}

async fn probe<S: ScoreSource>(source: S, config: &BoardConfig, run_for: Duration) -> BoardState {
    println!("Probing {} for {}s", source.describe(), run_for.as_secs());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_board_tasks(source, config, tx);
    let mut state = BoardState::new();
    state.team1_name = config.team1_name.clone();
    state.team2_name = config.team2_name.clone();

    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            delta = rx.recv() => {
                let Some(delta) = delta else { break };
                report(&state, &delta);
                let now = Instant::now();
                apply_delta(&mut state, delta, now);
                state.effects.sweep(now);
            }
        }
    }

    handle.shutdown().await;
    state.tear_down();
    state
}

fn report(state: &BoardState, delta: &Delta) {
    match delta {
        Delta::Snapshot {
            seq,
            snapshot,
            detection,
        } => {
            let counters = snapshot.counters();
            let label = match detection.transition {
                Transition::NoChange => return,
                Transition::Kill => "KILL",
                Transition::Death => "DEATH",
                Transition::Both => "KILL+DEATH",
            };
            let leader = rank_team(&snapshot.team1)
                .into_iter()
                .chain(rank_team(&snapshot.team2))
                .max_by(|a, b| a.ratio.total_cmp(&b.ratio))
                .map(|top| format!("{} {}", top.player.name, format_ratio(top.ratio)))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "#{seq:<4} {label:<10} kills {:>3} (+{}) deaths {:>3} (+{}) leader {leader}",
                counters.kills, detection.kill_delta, counters.deaths, detection.death_delta
            );
        }
        Delta::MatchStatus(status) => {
            if status.ended != state.match_ended {
                println!("match ended: {}", status.ended);
            }
        }
        Delta::CycleSkipped { reason, .. } => println!("skip: {reason}"),
        Delta::Log(_) => {}
    }
}

fn has_flag(name: &str) -> bool {
    std::env::args().any(|arg| arg == name)
}

fn parse_string_arg(name: &str) -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if arg == name {
            return args.next();
        }
        if let Some(value) = arg.strip_prefix(&format!("{name}=")) {
            return Some(value.to_string());
        }
    }
    None
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    parse_string_arg(name).and_then(|val| val.parse::<u64>().ok())
}
