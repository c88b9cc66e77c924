use std::fs::{self, OpenOptions};
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
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
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph,
    Wrap,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use energy_guessr::analytics::sink_from_config;
use energy_guessr::config::Config;
use energy_guessr::countries;
use energy_guessr::dataset::{EnergyProfile, EnergySource, HttpTableSource, Source, SourceMix};
use energy_guessr::http_cache::app_cache_dir;
use energy_guessr::loader::spawn_loader;
use energy_guessr::results::ScoreTier;
use energy_guessr::round::{ChartKind, RevealLevel};
use energy_guessr::state::{AppState, Delta, LoaderCommand, Screen, apply_delta};

const LOG_FILE: &str = "energy_guessr.log";

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<LoaderCommand>,
}

impl App {
    fn new(state: AppState, cmd_tx: mpsc::Sender<LoaderCommand>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('?') {
            self.state.help_overlay = !self.state.help_overlay;
            return;
        }
        match self.state.screen {
            Screen::Welcome => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Enter | KeyCode::Char('s') => self.start_game(false),
                KeyCode::Char('a') => self.state.set_screen(Screen::About),
                _ => {}
            },
            Screen::About => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('b') | KeyCode::Esc => self.state.set_screen(Screen::Welcome),
                _ => {}
            },
            Screen::Loading => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('b') | KeyCode::Esc => self.state.abandon(),
                _ => {}
            },
            Screen::LoadError => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('r') | KeyCode::Enter => self.start_game(true),
                KeyCode::Char('b') | KeyCode::Esc => self.state.abandon(),
                _ => {}
            },
            Screen::Game => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('b') | KeyCode::Esc => self.state.abandon(),
                KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
                KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
                KeyCode::Char(' ') => self.state.pick_highlighted(),
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    self.state.pick(index);
                }
                KeyCode::Char('r') => self.state.reveal_next(),
                KeyCode::Char('g') | KeyCode::Enter => self.state.submit_guess(Instant::now()),
                _ => {}
            },
            Screen::Results => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('p') | KeyCode::Enter => self.start_game(false),
                KeyCode::Char('b') | KeyCode::Esc => self.state.abandon(),
                _ => {}
            },
        }
    }

    fn start_game(&mut self, force: bool) {
        self.state.request_start();
        if self.cmd_tx.send(LoaderCommand::Load { force }).is_err() {
            apply_delta(
                &mut self.state,
                Delta::LoadFailed {
                    message: "data loader is not running".to_string(),
                    retryable: false,
                },
            );
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    init_tracing();
    let config = Config::from_env();
    tracing::info!(rounds = config.rounds, "energy guessr starting");

    let source = HttpTableSource::new(config.http_timeout)?;
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let loader = spawn_loader(
        source,
        config.dataset.clone(),
        config.cache_ttl,
        tx,
        cmd_rx,
    );

    let game = energy_guessr::round::GameConfig {
        rounds: config.rounds,
        ..Default::default()
    };
    let state = AppState::with_config(game, config.result_pause, sink_from_config(&config));
    let mut app = App::new(state, cmd_tx.clone());

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let _ = cmd_tx.send(LoaderCommand::Shutdown);
    drop(app);
    let _ = loader.join();

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("energy_guessr=info"));
    let writer = app_cache_dir()
        .and_then(|dir| {
            fs::create_dir_all(&dir).ok()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))
                .ok()
        })
        .map(|file| BoxMakeWriter::new(std::sync::Mutex::new(file)))
        .unwrap_or_else(|| BoxMakeWriter::new(io::sink));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.tick(Instant::now());

        terminal.draw(|f| ui(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.screen {
        Screen::Welcome => render_welcome(frame, chunks[1], state),
        Screen::About => render_about(frame, chunks[1]),
        Screen::Loading => render_loading(frame, chunks[1]),
        Screen::LoadError => render_load_error(frame, chunks[1], state),
        Screen::Game => render_game(frame, chunks[1], state),
        Screen::Results => render_results(frame, chunks[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match (&state.screen, state.engine.as_ref()) {
        (Screen::Game, Some(engine)) => {
            let round = (engine.round_index() + 1).min(engine.config().rounds);
            let score: u32 = engine.results().iter().map(|r| r.points_awarded).sum();
            format!(
                "ENERGY GUESSR | Round {} of {} | Score {} | Worth {} pts",
                round,
                engine.config().rounds,
                score,
                engine.potential_points()
            )
        }
        (screen, _) => format!("ENERGY GUESSR | {}", screen.title()),
    };
    format!("  ~⚡~  {title}\n  Guess the country from its energy data")
}

fn footer_text(state: &AppState) -> &'static str {
    match state.screen {
        Screen::Welcome => "Enter/s Start | a About | ? Help | q Quit",
        Screen::About => "b/Esc Back | ? Help | q Quit",
        Screen::Loading => "b/Esc Back | q Quit",
        Screen::LoadError => "r/Enter Retry | b/Esc Back | q Quit",
        Screen::Game => {
            "1-4 Pick | j/k Move | Space Pick | r Reveal | g/Enter Guess | b Menu | ? Help | q Quit"
        }
        Screen::Results => "p/Enter Play again | b/Esc Menu | q Quit",
    }
}

fn render_welcome(frame: &mut Frame, area: Rect, state: &AppState) {
    let table = state.game.score_table;
    let mut lines = vec![
        Line::from(Span::styled(
            "How to Play",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("1. Choose your country: four countries are shown, one matches the data."),
        Line::from("2. Analyse the data: up to four energy visualisations can be unlocked."),
        Line::from("3. Strategic guessing: guess early for more points, reveal more for accuracy."),
        Line::from(format!(
            "4. Score points: complete {} rounds for up to {} points.",
            state.game.rounds,
            state.game.max_score()
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Charts (in unlock order)",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    for kind in ChartKind::ALL {
        lines.push(Line::from(format!(
            "  {}  {} pts",
            kind.title(),
            table.points_for(kind.unlocked_at())
        )));
    }
    let welcome = Paragraph::new(lines)
        .block(Block::default().title("Welcome").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(welcome, area);
}

fn render_about(frame: &mut Frame, area: Rect) {
    let text = [
        "Energy Guessr uses public energy statistics from Our World in Data.",
        "",
        "Energy consumption: primary energy by source, in terawatt-hours.",
        "Electricity production: generation by source, in terawatt-hours.",
        "Imports & exports: net energy imports as a share of energy use.",
        "  Negative values mean the country is a net exporter.",
        "Energy mix over time: the consumption breakdown year by year.",
        "",
        "Data is cached locally and refreshed once a day.",
    ]
    .join("\n");
    let about = Paragraph::new(text)
        .block(Block::default().title("About").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(about, area);
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let loading = Paragraph::new("Fetching energy data...")
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().title("Loading").borders(Borders::ALL));
    frame.render_widget(loading, area);
}

fn render_load_error(frame: &mut Frame, area: Rect, state: &AppState) {
    let (message, hint) = match state.load_error.as_ref() {
        Some(err) if err.retryable => (err.message.as_str(), "Press r to retry."),
        Some(err) => (
            err.message.as_str(),
            "Retrying may not help; check the data source settings.",
        ),
        None => ("Unknown error", "Press r to retry."),
    };
    let text = format!("Could not start the game.\n\n{message}\n\n{hint}");
    let error = Paragraph::new(text)
        .style(Style::default().fg(Color::Red))
        .block(Block::default().title("Error").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(error, area);
}

fn render_game(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(engine) = state.engine.as_ref() else {
        render_loading(frame, area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(1)])
        .split(columns[0]);

    let mut lines = Vec::new();
    for (idx, country) in engine.candidates().iter().enumerate() {
        let chosen = engine.selection() == Some(country.code.as_str());
        let marker = if chosen { "●" } else { "○" };
        let prefix = if idx == state.cursor { ">" } else { " " };
        let style = if chosen {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{prefix} {} {marker} {} {}",
                idx + 1,
                country.flag_glyph,
                country.display_name
            ),
            style,
        )));
    }
    let options = Paragraph::new(lines)
        .block(Block::default().title("Which country?").borders(Borders::ALL));
    frame.render_widget(options, left[0]);

    let status = match state.last_result.as_ref() {
        Some(result) if result.is_correct => Paragraph::new(format!(
            "Correct! {} {}\n+{} points",
            result.flag_glyph, result.display_name, result.points_awarded
        ))
        .style(Style::default().fg(Color::Green)),
        Some(result) => Paragraph::new(format!(
            "Wrong. It was {} {}\n+0 points",
            result.flag_glyph, result.display_name
        ))
        .style(Style::default().fg(Color::Red)),
        None if engine.reveal_level().is_last() => Paragraph::new(format!(
            "All charts revealed\nCorrect guess now: {} pts",
            engine.potential_points()
        )),
        None => Paragraph::new(format!(
            "Charts revealed: {}/{}\nCorrect guess now: {} pts",
            engine.reveal_level().get(),
            RevealLevel::LAST.get(),
            engine.potential_points()
        )),
    };
    frame.render_widget(
        status
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Status").borders(Borders::ALL)),
        left[1],
    );

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);
    let mut panels = Vec::new();
    for row in rows.iter() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row);
        panels.extend(cols.iter().copied());
    }

    let profile = engine.current_profile();
    let reveal = engine.reveal_level();
    for (kind, panel) in ChartKind::ALL.into_iter().zip(panels) {
        let block = Block::default()
            .title(format!(
                "{}. {}",
                kind.unlocked_at().get(),
                chart_title(kind)
            ))
            .borders(Borders::ALL);
        if kind.unlocked_at() > reveal {
            let locked = Paragraph::new(format!(
                "Locked\nPress r to reveal (worth {} pts after)",
                state.game.score_table.points_for(kind.unlocked_at())
            ))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
            frame.render_widget(locked, panel);
            continue;
        }
        let Some(profile) = profile else {
            frame.render_widget(Paragraph::new("No data").block(block), panel);
            continue;
        };
        match kind {
            ChartKind::Consumption => {
                render_mix_bars(frame, panel, block, &profile.consumption)
            }
            ChartKind::Production => render_mix_bars(frame, panel, block, &profile.production),
            ChartKind::Trade => render_trade(frame, panel, block, profile),
            ChartKind::TimeSeries => render_time_series(frame, panel, block, profile),
        }
    }
}

fn chart_title(kind: ChartKind) -> String {
    match kind {
        ChartKind::Trade => format!("{} (% of use)", kind.title()),
        _ => format!("{} (TWh)", kind.title()),
    }
}

fn render_mix_bars<S: Source>(frame: &mut Frame, area: Rect, block: Block, mix: &SourceMix<S>) {
    let bars: Vec<Bar> = mix
        .iter()
        .enumerate()
        .map(|(idx, (source, twh))| {
            Bar::default()
                .value(twh.round().max(0.0) as u64)
                .label(Line::from(source.label()))
                .text_value(format!("{twh:.0}"))
                .style(Style::default().fg(source_color(idx)))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(chart, area);
}

fn render_trade(frame: &mut Frame, area: Rect, block: Block, profile: &EnergyProfile) {
    if profile.trade.is_empty() {
        frame.render_widget(Paragraph::new("No trade data").block(block), area);
        return;
    }
    let points: Vec<(f64, f64)> = profile
        .trade
        .iter()
        .map(|p| (f64::from(p.year), p.import_percentage))
        .collect();
    let (x_min, x_max) = year_bounds(points.iter().map(|p| p.0));
    let (y_min, y_max) = value_bounds(points.iter().map(|p| p.1), true);
    let zero: Vec<(f64, f64)> = vec![(x_min, 0.0), (x_max, 0.0)];

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&zero),
        Dataset::default()
            .name("net imports")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
    ];
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{x_min:.0}")),
                    Span::raw(format!("{x_max:.0}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{y_min:.0}%")),
                    Span::raw(format!("{y_max:.0}%")),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_time_series(frame: &mut Frame, area: Rect, block: Block, profile: &EnergyProfile) {
    if profile.time_series.is_empty() {
        frame.render_widget(Paragraph::new("No history").block(block), area);
        return;
    }
    let series: Vec<(EnergySource, Vec<(f64, f64)>)> = EnergySource::ALL
        .iter()
        .map(|source| {
            let points = profile
                .time_series
                .iter()
                .map(|snap| (f64::from(snap.year), snap.consumption.get(*source)))
                .collect();
            (*source, points)
        })
        .collect();

    let (x_min, x_max) = year_bounds(profile.time_series.iter().map(|s| f64::from(s.year)));
    let (y_min, y_max) = value_bounds(
        series.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.1)),
        false,
    );
    let datasets = series
        .iter()
        .enumerate()
        .filter(|(_, (_, pts))| pts.iter().any(|p| p.1 > 0.0))
        .map(|(idx, (source, pts))| {
            Dataset::default()
                .name(source.label())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(source_color(idx)))
                .data(pts)
        })
        .collect::<Vec<_>>();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{x_min:.0}")),
                    Span::raw(format!("{x_max:.0}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{y_max:.0}"))]),
        );
    frame.render_widget(chart, area);
}

fn year_bounds(years: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = years.fold((f64::MAX, f64::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if min > max {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    (min, max)
}

fn value_bounds(values: impl Iterator<Item = f64>, include_negative: bool) -> (f64, f64) {
    let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let min = if include_negative { min } else { 0.0 };
    if max - min < f64::EPSILON {
        return (min, min + 1.0);
    }
    (min, max)
}

fn source_color(idx: usize) -> Color {
    const PALETTE: [Color; 9] = [
        Color::Rgb(139, 69, 19),
        Color::Rgb(47, 79, 79),
        Color::Rgb(255, 99, 71),
        Color::Rgb(255, 215, 0),
        Color::Rgb(65, 105, 225),
        Color::Rgb(135, 206, 235),
        Color::Rgb(255, 165, 0),
        Color::Rgb(34, 139, 34),
        Color::Rgb(50, 205, 50),
    ];
    PALETTE[idx % PALETTE.len()]
}

fn render_results(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(summary) = state.summary.as_ref() else {
        frame.render_widget(Paragraph::new("No results yet"), area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(1)])
        .split(area);

    let tier_color = match summary.band.tier() {
        ScoreTier::High => Color::Green,
        ScoreTier::Mid => Color::Yellow,
        ScoreTier::Low => Color::Red,
    };
    let overview = vec![
        Line::from(Span::styled(
            format!("{}/{}", summary.total_score, summary.max_score),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{} out of {} correct guesses",
            summary.correct_count, summary.rounds
        )),
        Line::from(Span::styled(
            summary.band.message(),
            Style::default().fg(tier_color),
        )),
        Line::from(format!(
            "Charts viewed: {} | Accuracy: {}%",
            summary.total_charts_viewed, summary.accuracy_percent
        )),
    ];
    frame.render_widget(
        Paragraph::new(overview)
            .block(Block::default().title("Your Final Score").borders(Borders::ALL)),
        rows[0],
    );

    let mut lines = Vec::new();
    for (idx, result) in state.final_results.iter().enumerate() {
        let verdict = if result.is_correct { "✓ Correct" } else { "✗ Incorrect" };
        let plural = if result.charts_revealed_at_guess > 1 { "s" } else { "" };
        let style = if result.is_correct {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };
        lines.push(Line::from(Span::styled(
            format!(
                "Round {}: {} {}  {} pts  {} ({} chart{plural})",
                idx + 1,
                result.flag_glyph,
                result.display_name,
                result.points_awarded,
                verdict,
                result.charts_revealed_at_guess
            ),
            style,
        )));
        if let Some(fact) = countries::fact_for(&result.country_code) {
            lines.push(Line::from(Span::styled(
                format!("    Did you know? {fact}"),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Round by Round").borders(Borders::ALL)),
        rows[1],
    );
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(2)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Energy Guessr - Help",
        "",
        "Menu:",
        "  Enter / s    Start game",
        "  a            About the data",
        "",
        "Game:",
        "  1-4          Pick a country",
        "  j/k or ↑/↓   Move highlight",
        "  Space        Pick highlighted",
        "  r            Reveal next chart",
        "  g / Enter    Submit guess",
        "  b / Esc      Back to menu",
        "",
        "  ?            Toggle help",
        "  q            Quit",
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
