use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tokio::sync::mpsc;

use blaze_board::config::{BoardConfig, SourceKind};
use blaze_board::effects::EffectKind;
use blaze_board::fetch::HttpSource;
use blaze_board::poller::{PollerHandle, spawn_board_tasks};
use blaze_board::ranking::{RankedPlayer, format_ratio};
use blaze_board::sim_feed::SimulatedSource;
use blaze_board::source::ScoreSource;
use blaze_board::state::{BoardState, Delta, Screen, apply_delta};
use blaze_board::victory::Winner;

const TICK_RATE: Duration = Duration::from_millis(100);

struct App {
    state: BoardState,
    should_quit: bool,
}

impl App {
    fn new(config: &BoardConfig, source_label: String) -> Self {
        let mut state = BoardState::new();
        state.team1_name = config.team1_name.clone();
        state.team2_name = config.team2_name.clone();
        state.source_label = source_label;
        Self {
            state,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.state.help_overlay {
                    self.state.help_overlay = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('v') | KeyCode::Char('V') => self.state.toggle_victory(),
            KeyCode::Char('b') | KeyCode::Char('B') => self.state.screen = Screen::Board,
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.state.console_visible = !self.state.console_visible
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = BoardConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let (handle, label) = match config.source {
        SourceKind::Http => mount(HttpSource::new(&config.api_url, config.request_timeout), &config, tx),
        SourceKind::Sim => mount(SimulatedSource::new(config.sim_duration), &config, tx),
    };

    let mut app = App::new(&config, label);
    app.state.push_log(format!("[INFO] Polling {}", app.state.source_label));
    let res = run_app(&mut terminal, &mut app, rx).await;

    handle.shutdown().await;
    app.state.tear_down();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn mount<S: ScoreSource>(
    source: S,
    config: &BoardConfig,
    tx: mpsc::UnboundedSender<Delta>,
) -> (PollerHandle, String) {
    let label = source.describe();
    (spawn_board_tasks(source, config, tx), label)
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut rx: mpsc::UnboundedReceiver<Delta>,
) -> io::Result<()> {
    let mut ticker = tokio::time::interval(TICK_RATE);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let now = Instant::now();

        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta, now);
        }
        app.state.effects.sweep(now);

        terminal.draw(|f| ui(f, &app.state, now))?;

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &BoardState, now: Instant) {
    let console_height = if state.console_visible { 8 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(console_height),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.screen {
        Screen::Board => {
            let body = shaken(chunks[1], state, now);
            render_board(frame, body, state, now);
            render_effects(frame, body, state, now);
        }
        Screen::Victory => render_victory(frame, chunks[1], state),
    }

    if state.console_visible {
        render_console(frame, chunks[2], state);
    }

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &BoardState) -> String {
    let status = if state.match_ended {
        "MATCH OVER"
    } else if state.snapshot.is_some() {
        "LIVE"
    } else {
        "CONNECTING"
    };
    format!(
        "⚡ BLAZE ⚡  {status}\nKills {}  Deaths {}",
        state.snapshot.as_ref().map(|s| s.counters().kills).unwrap_or(0),
        state.snapshot.as_ref().map(|s| s.counters().deaths).unwrap_or(0),
    )
}

fn footer_text(state: &BoardState) -> String {
    match state.screen {
        Screen::Board => {
            if state.victory.is_some() {
                "v Victory | c Console | ? Help | q Quit".to_string()
            } else {
                "c Console | ? Help | q Quit".to_string()
            }
        }
        Screen::Victory => "b Board | c Console | ? Help | q Quit".to_string(),
    }
}

/// Nudges the board sideways while a shake window is open.
fn shaken(area: Rect, state: &BoardState, now: Instant) -> Rect {
    let Some(elapsed) = state.effects.shake_elapsed(now) else {
        return area;
    };
    const OFFSETS: [i16; 6] = [0, -2, 2, -1, 1, 0];
    let phase = (elapsed.as_millis() / 100) as usize % OFFSETS.len();
    let dx = OFFSETS[phase];
    if area.width < 4 {
        return area;
    }
    if dx < 0 {
        Rect {
            width: area.width - dx.unsigned_abs(),
            ..area
        }
    } else {
        Rect {
            x: area.x + dx as u16,
            width: area.width - dx as u16,
            ..area
        }
    }
}

fn render_board(frame: &mut Frame, area: Rect, state: &BoardState, now: Instant) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let border_style = if state.effects.burst_active(now) {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    render_team(
        frame,
        columns[0],
        &state.team1_name,
        &state.rankings.team1,
        border_style,
    );
    render_team(
        frame,
        columns[1],
        &state.team2_name,
        &state.rankings.team2,
        border_style,
    );
}

fn team_columns() -> [Constraint; 5] {
    [
        Constraint::Length(4),
        Constraint::Min(10),
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(7),
    ]
}

fn render_team(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    ranked: &[RankedPlayer],
    border_style: Style,
) {
    let block = Block::default()
        .title(format!(" {title} "))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 || inner.width == 0 {
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    render_team_header(frame, sections[0]);

    let list_area = sections[1];
    if ranked.is_empty() {
        let empty = Paragraph::new("Waiting for players...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = list_area.height as usize;
    for (i, entry) in ranked.iter().take(visible).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let row_style = if entry.rank == 1 {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(team_columns())
            .split(row_area);

        render_cell_text(frame, cols[0], &format!("{:>2}", entry.rank), rank_style(entry.rank));
        render_cell_text(frame, cols[1], &entry.player.name, row_style);
        render_cell_text(
            frame,
            cols[2],
            &entry.player.kills.to_string(),
            Style::default().fg(Color::Green),
        );
        render_cell_text(
            frame,
            cols[3],
            &entry.player.deaths.to_string(),
            Style::default().fg(Color::Red),
        );
        render_cell_text(
            frame,
            cols[4],
            &format_ratio(entry.ratio),
            Style::default().fg(Color::Yellow),
        );
    }
}

fn render_team_header(frame: &mut Frame, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(team_columns())
        .split(area);
    let style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "#", style);
    render_cell_text(frame, cols[1], "Player", style);
    render_cell_text(frame, cols[2], "Kills", style);
    render_cell_text(frame, cols[3], "Deaths", style);
    render_cell_text(frame, cols[4], "K/D", style);
}

fn rank_style(rank: usize) -> Style {
    match rank {
        1 => Style::default().fg(Color::Black).bg(Color::Yellow),
        2 => Style::default().fg(Color::Black).bg(Color::Gray),
        3 => Style::default().fg(Color::White).bg(Color::LightRed),
        _ => Style::default().fg(Color::White).bg(Color::Red),
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn render_effects(frame: &mut Frame, area: Rect, state: &BoardState, now: Instant) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let splat = Style::default().bg(Color::Red);

    for effect in state.effects.live(now) {
        match effect.kind {
            EffectKind::LinearTrail { left_pct } => {
                if !effect.is_started(now) {
                    continue;
                }
                // Trails run down the full height over the first two thirds of their life.
                let reach = (effect.progress(now) * 1.5).min(1.0);
                let height = ((f32::from(area.height) * reach).ceil() as u16).clamp(1, area.height);
                let offset = ((f32::from(area.width - 1) * left_pct / 100.0) as u16)
                    .min(area.width - 1);
                let drip = Rect {
                    x: area.x + offset,
                    y: area.y,
                    width: 1,
                    height,
                };
                frame.render_widget(Block::default().style(Style::default().bg(Color::Red)), drip);
            }
            EffectKind::ImpactBurst => {
                for corner in corners(area, 8, 3) {
                    frame.render_widget(Block::default().style(splat), corner);
                }
                let banner_area = centered_rect(40, 20, area);
                frame.render_widget(Clear, banner_area);
                let banner = Paragraph::new("\nKILL CONFIRMED")
                    .alignment(Alignment::Center)
                    .style(
                        Style::default()
                            .fg(Color::White)
                            .bg(Color::Red)
                            .add_modifier(Modifier::BOLD),
                    );
                frame.render_widget(banner, banner_area);
            }
            EffectKind::DirectionalFlash { angle_deg } => {
                let (sin, cos) = angle_deg.to_radians().sin_cos();
                let (dx, dy) = (f64::from(cos), f64::from(sin));
                let color = if effect.progress(now) < 0.5 {
                    Color::LightRed
                } else {
                    Color::Red
                };
                let beam = Canvas::default()
                    .x_bounds([-1.0, 1.0])
                    .y_bounds([-1.0, 1.0])
                    .paint(move |ctx| {
                        ctx.draw(&CanvasLine {
                            x1: -dx * 2.0,
                            y1: -dy * 2.0,
                            x2: dx * 2.0,
                            y2: dy * 2.0,
                            color,
                        });
                    });
                frame.render_widget(beam, area);
            }
        }
    }
}

fn corners(area: Rect, width: u16, height: u16) -> Vec<Rect> {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let right = area.x + area.width - width;
    let bottom = area.y + area.height - height;
    [
        (area.x, area.y),
        (right, area.y),
        (area.x, bottom),
        (right, bottom),
    ]
    .into_iter()
    .map(|(x, y)| Rect {
        x,
        y,
        width,
        height,
    })
    .collect()
}

fn render_victory(frame: &mut Frame, area: Rect, state: &BoardState) {
    let block = Block::default()
        .title(" RESULTS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(summary) = &state.victory else {
        let waiting = Paragraph::new("PROCESSING RESULTS...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Red));
        frame.render_widget(waiting, inner);
        return;
    };

    let headline = match summary.winner {
        Winner::Tie => "DRAW - NO VICTOR".to_string(),
        winner => format!("{} WINS", state.team_name(winner)),
    };
    let mut lines = vec![
        headline,
        String::new(),
        format!(
            "{} {}  -  {} {}",
            state.team1_name, summary.team1_score, summary.team2_score, state.team2_name
        ),
        String::new(),
    ];
    match &summary.mvp {
        Some(mvp) => lines.push(format!("MVP: {} ({} kills)", mvp.name, mvp.kills)),
        None => lines.push("MVP: N/A".to_string()),
    }
    lines.push(String::new());
    for (idx, player) in summary.winners.iter().enumerate() {
        lines.push(format!(
            "{:>2}. {:<16} {:>3} K {:>3} D",
            idx + 1,
            player.name,
            player.kills,
            player.deaths
        ));
    }

    let text = Paragraph::new(lines.join("\n"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::White));
    frame.render_widget(text, inner);
}

fn render_console(frame: &mut Frame, area: Rect, state: &BoardState) {
    let title = format!(
        "Console | {} | ok {} | skipped {}/{} | kills {} deaths {}",
        state.source_label,
        state.accepted_cycles,
        state.skipped_snapshot_cycles,
        state.skipped_status_cycles,
        state.kill_events,
        state.death_events
    );
    let lines = area.height.saturating_sub(2) as usize;
    let text = if state.logs.is_empty() {
        "No alerts yet".to_string()
    } else {
        let start = state.logs.len().saturating_sub(lines);
        state
            .logs
            .iter()
            .skip(start)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    };
    let console = Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 50, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Blaze Board - Help",
        "",
        "  v            Victory screen (after match end)",
        "  b            Back to board",
        "  c            Toggle console",
        "  ?            Toggle help",
        "  q / Esc      Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
