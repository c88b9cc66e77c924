use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::warn;

use crate::analytics::{AnalyticsEvent, AnalyticsSink, NoopSink};
use crate::countries::CountryRecord;
use crate::dataset::EnergyDataMap;
use crate::error::GameError;
use crate::results::{GameSummary, summarize_with};
use crate::round::{GameConfig, GuessOutcome, Phase, RoundEngine, RoundResult};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    About,
    Loading,
    LoadError,
    Game,
    Results,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Welcome => "Welcome",
            Screen::About => "About",
            Screen::Loading => "Loading",
            Screen::LoadError => "Load Error",
            Screen::Game => "Game",
            Screen::Results => "Results",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    DataLoaded {
        data: Arc<EnergyDataMap>,
        from_cache: bool,
    },
    LoadFailed {
        message: String,
        retryable: bool,
    },
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderCommand {
    Load { force: bool },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub message: String,
    pub retryable: bool,
}

pub struct AppState {
    pub screen: Screen,
    pub game: GameConfig,
    pub engine: Option<RoundEngine<StdRng>>,
    pub cursor: usize,
    pub last_result: Option<RoundResult>,
    pub next_round_at: Option<Instant>,
    pub result_pause: Duration,
    pub final_results: Vec<RoundResult>,
    pub summary: Option<GameSummary>,
    pub load_error: Option<LoadError>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    seed: Option<u64>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default(), Duration::from_millis(1000), Arc::new(NoopSink))
    }

    pub fn with_config(
        game: GameConfig,
        result_pause: Duration,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        Self {
            screen: Screen::Welcome,
            game,
            engine: None,
            cursor: 0,
            last_result: None,
            next_round_at: None,
            result_pause,
            final_results: Vec::new(),
            summary: None,
            load_error: None,
            logs: VecDeque::new(),
            help_overlay: false,
            seed: None,
            analytics,
        }
    }

    /// Fix the candidate draw for reproducible games.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.analytics.track(&AnalyticsEvent::PageView {
                page_title: screen.title().to_string(),
            });
        }
        self.screen = screen;
    }

    /// Move to the loading screen. The caller asks the loader for data.
    pub fn request_start(&mut self) {
        self.engine = None;
        self.final_results.clear();
        self.summary = None;
        self.load_error = None;
        self.last_result = None;
        self.next_round_at = None;
        self.set_screen(Screen::Loading);
    }

    pub fn begin_game(&mut self, data: Arc<EnergyDataMap>) {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut engine = RoundEngine::new(data, self.game, rng);
        match engine.start_game() {
            Ok(()) => {
                self.engine = Some(engine);
                self.cursor = 0;
                self.analytics.track(&AnalyticsEvent::GameStart {
                    rounds: self.game.rounds,
                });
                self.set_screen(Screen::Game);
            }
            Err(err) => self.fail(&err),
        }
    }

    fn fail(&mut self, err: &GameError) {
        warn!(error = %err, "cannot start round");
        self.engine = None;
        self.load_error = Some(LoadError {
            message: err.to_string(),
            retryable: !matches!(err, GameError::InsufficientData { .. }),
        });
        self.push_log(format!("[WARN] {err}"));
        self.set_screen(Screen::LoadError);
    }

    pub fn abandon(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.abandon();
        }
        self.engine = None;
        self.last_result = None;
        self.next_round_at = None;
        self.set_screen(Screen::Welcome);
    }

    pub fn candidates(&self) -> &[CountryRecord] {
        self.engine
            .as_ref()
            .map(|e| e.candidates())
            .unwrap_or_default()
    }

    pub fn select_next(&mut self) {
        let len = self.candidates().len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + 1) % len;
    }

    pub fn select_prev(&mut self) {
        let len = self.candidates().len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor + len - 1) % len;
    }

    pub fn pick(&mut self, index: usize) {
        let Some(code) = self.candidates().get(index).map(|c| c.code.clone()) else {
            return;
        };
        if let Some(engine) = self.engine.as_mut() {
            engine.select_country(&code);
            self.cursor = index;
        }
    }

    pub fn pick_highlighted(&mut self) {
        self.pick(self.cursor);
    }

    pub fn reveal_next(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if engine.reveal_next() {
            let level = engine.reveal_level().get();
            self.push_log(format!("[INFO] Chart {level} revealed"));
        }
    }

    pub fn submit_guess(&mut self, now: Instant) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let round = engine.round_index() + 1;
        match engine.submit_guess() {
            GuessOutcome::Ignored => {
                if engine.phase() == Phase::RoundActive {
                    self.push_log("[INFO] Pick a country before guessing");
                }
            }
            GuessOutcome::RoundComplete(result) => {
                self.log_result(round, &result);
                self.analytics
                    .track(&AnalyticsEvent::RoundComplete { round, result: result.clone() });
                self.last_result = Some(result);
                self.next_round_at = Some(now + self.result_pause);
            }
            GuessOutcome::GameComplete(results) => {
                if let Some(result) = results.last() {
                    self.log_result(round, result);
                    self.analytics.track(&AnalyticsEvent::RoundComplete {
                        round,
                        result: result.clone(),
                    });
                }
                let summary = summarize_with(&results, &self.game.score_table);
                self.analytics
                    .track(&AnalyticsEvent::GameComplete { summary });
                self.summary = Some(summary);
                self.final_results = results;
                self.last_result = None;
                self.next_round_at = None;
                self.set_screen(Screen::Results);
            }
        }
    }

    fn log_result(&mut self, round: usize, result: &RoundResult) {
        let verdict = if result.is_correct { "Correct" } else { "Wrong" };
        self.push_log(format!(
            "[INFO] Round {round}: {verdict}, it was {} (+{} pts)",
            result.display_name, result.points_awarded
        ));
    }

    /// Start the next round once the result pause has elapsed.
    pub fn tick(&mut self, now: Instant) {
        let Some(due) = self.next_round_at else {
            return;
        };
        if now < due {
            return;
        }
        self.next_round_at = None;
        self.last_result = None;
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match engine.start_round() {
            Ok(()) => self.cursor = 0,
            Err(err) => self.fail(&err),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::DataLoaded { data, from_cache } => {
            let source = if from_cache { "cache" } else { "network" };
            state.push_log(format!(
                "[INFO] Energy data ready: {} countries ({source})",
                data.len()
            ));
            if state.screen == Screen::Loading {
                state.begin_game(data);
            }
        }
        Delta::LoadFailed { message, retryable } => {
            state.push_log(format!("[WARN] Energy data fetch failed: {message}"));
            state.analytics.track(&AnalyticsEvent::DatasetError {
                message: message.clone(),
            });
            if state.screen == Screen::Loading {
                state.load_error = Some(LoadError { message, retryable });
                state.set_screen(Screen::LoadError);
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
