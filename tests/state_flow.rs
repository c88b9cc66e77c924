use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use energy_guessr::analytics::{AnalyticsEvent, AnalyticsSink};
use energy_guessr::countries;
use energy_guessr::dataset::{EnergyDataMap, EnergyProfile};
use energy_guessr::results::ScoreBand;
use energy_guessr::round::GameConfig;
use energy_guessr::state::{AppState, Delta, Screen, apply_delta};

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingSink {
    fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .expect("sink lock")
            .iter()
            .filter(|e| **e == name)
            .count()
    }
}

impl AnalyticsSink for RecordingSink {
    fn track(&self, event: &AnalyticsEvent) {
        self.events.lock().expect("sink lock").push(event.name());
    }
}

const PAUSE: Duration = Duration::from_millis(1000);

fn dataset(count: usize) -> Arc<EnergyDataMap> {
    let data: HashMap<String, EnergyProfile> = countries::all()
        .iter()
        .take(count)
        .map(|c| {
            (
                c.code.clone(),
                EnergyProfile {
                    code: c.code.clone(),
                    entity: c.display_name.clone(),
                    consumption: Default::default(),
                    production: Default::default(),
                    trade: Vec::new(),
                    time_series: Vec::new(),
                },
            )
        })
        .collect();
    Arc::new(data)
}

fn state_with_sink() -> (AppState, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let state = AppState::with_config(GameConfig::default(), PAUSE, sink.clone()).with_seed(17);
    (state, sink)
}

fn correct_index(state: &AppState) -> usize {
    let engine = state.engine.as_ref().expect("game running");
    let code = &engine.correct_country().expect("round active").code;
    state
        .candidates()
        .iter()
        .position(|c| &c.code == code)
        .expect("answer among candidates")
}

fn loaded(count: usize) -> Delta {
    Delta::DataLoaded {
        data: dataset(count),
        from_cache: false,
    }
}

#[test]
fn loaded_data_starts_the_game() {
    let (mut state, sink) = state_with_sink();
    state.request_start();
    assert_eq!(state.screen, Screen::Loading);

    apply_delta(&mut state, loaded(10));
    assert_eq!(state.screen, Screen::Game);
    assert_eq!(state.candidates().len(), 4);
    assert_eq!(sink.count("game_start"), 1);
    assert!(state.logs.iter().any(|l| l.contains("10 countries")));
}

#[test]
fn data_outside_loading_is_only_logged() {
    let (mut state, _) = state_with_sink();
    apply_delta(&mut state, loaded(10));
    assert_eq!(state.screen, Screen::Welcome);
    assert!(state.engine.is_none());
    assert_eq!(state.logs.len(), 1);
}

#[test]
fn load_failure_shows_retryable_error() {
    let (mut state, sink) = state_with_sink();
    state.request_start();
    apply_delta(
        &mut state,
        Delta::LoadFailed {
            message: "http 503 fetching consumption".to_string(),
            retryable: true,
        },
    );
    assert_eq!(state.screen, Screen::LoadError);
    let err = state.load_error.as_ref().expect("error recorded");
    assert!(err.retryable);
    assert_eq!(sink.count("dataset_error"), 1);

    state.request_start();
    assert!(state.load_error.is_none());
    assert_eq!(state.screen, Screen::Loading);
}

#[test]
fn too_little_data_is_not_retryable() {
    let (mut state, _) = state_with_sink();
    state.request_start();
    apply_delta(&mut state, loaded(3));
    assert_eq!(state.screen, Screen::LoadError);
    let err = state.load_error.as_ref().expect("error recorded");
    assert!(!err.retryable);
    assert!(state.engine.is_none());
}

#[test]
fn result_pause_delays_the_next_round() {
    let (mut state, _) = state_with_sink();
    state.request_start();
    apply_delta(&mut state, loaded(10));

    let now = Instant::now();
    let idx = correct_index(&state);
    state.pick(idx);
    state.submit_guess(now);

    let result = state.last_result.as_ref().expect("round resolved");
    assert!(result.is_correct);
    assert_eq!(result.points_awarded, 100);

    state.tick(now + Duration::from_millis(500));
    assert!(state.last_result.is_some());
    assert_eq!(state.engine.as_ref().map(|e| e.round_index()), Some(1));

    state.tick(now + PAUSE);
    assert!(state.last_result.is_none());
    assert!(state.next_round_at.is_none());
    let engine = state.engine.as_ref().expect("game running");
    assert_eq!(engine.candidates().len(), 4);
    assert!(engine.selection().is_none());
}

#[test]
fn guess_without_pick_logs_a_hint() {
    let (mut state, _) = state_with_sink();
    state.request_start();
    apply_delta(&mut state, loaded(10));
    state.submit_guess(Instant::now());
    assert!(state.last_result.is_none());
    assert_eq!(
        state.logs.back().map(String::as_str),
        Some("[INFO] Pick a country before guessing")
    );
}

#[test]
fn full_game_reaches_results() {
    let (mut state, sink) = state_with_sink();
    state.request_start();
    apply_delta(&mut state, loaded(12));

    let mut now = Instant::now();
    for round in 0..5 {
        if round == 1 {
            state.reveal_next();
        }
        let idx = correct_index(&state);
        state.pick(idx);
        state.submit_guess(now);
        now += PAUSE;
        state.tick(now);
    }

    assert_eq!(state.screen, Screen::Results);
    assert_eq!(state.final_results.len(), 5);
    let summary = state.summary.expect("summary computed");
    assert_eq!(summary.total_score, 475);
    assert_eq!(summary.total_charts_viewed, 6);
    assert_eq!(summary.band, ScoreBand::Outstanding);
    assert_eq!(sink.count("round_complete"), 5);
    assert_eq!(sink.count("game_complete"), 1);
}

#[test]
fn cursor_wraps_and_abandon_returns_home() {
    let (mut state, _) = state_with_sink();
    state.select_next();
    assert_eq!(state.cursor, 0);

    state.request_start();
    apply_delta(&mut state, loaded(10));
    state.select_prev();
    assert_eq!(state.cursor, 3);
    state.select_next();
    assert_eq!(state.cursor, 0);

    state.abandon();
    assert_eq!(state.screen, Screen::Welcome);
    assert!(state.engine.is_none());
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}
