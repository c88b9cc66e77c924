use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DEFAULT_ROUNDS;
use crate::countries::{self, CountryRecord};
use crate::dataset::{EnergyDataMap, EnergyProfile};
use crate::error::{GameError, ScoreTableError};

pub const CANDIDATES_PER_ROUND: usize = 4;
pub const REVEAL_LEVELS: usize = 4;

/// Number of charts unlocked in the current round, 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RevealLevel(u8);

impl RevealLevel {
    pub const FIRST: RevealLevel = RevealLevel(1);
    pub const LAST: RevealLevel = RevealLevel(REVEAL_LEVELS as u8);

    pub fn new(level: u8) -> Option<Self> {
        (1..=REVEAL_LEVELS as u8)
            .contains(&level)
            .then_some(RevealLevel(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Option<Self> {
        RevealLevel::new(self.0 + 1)
    }

    pub fn is_last(self) -> bool {
        self == RevealLevel::LAST
    }

    pub fn visible_charts(self) -> &'static [ChartKind] {
        &ChartKind::ALL[..self.0 as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Consumption,
    Production,
    Trade,
    TimeSeries,
}

impl ChartKind {
    /// Unlock order.
    pub const ALL: [ChartKind; REVEAL_LEVELS] = [
        ChartKind::Consumption,
        ChartKind::Production,
        ChartKind::Trade,
        ChartKind::TimeSeries,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Consumption => "Energy Consumption",
            ChartKind::Production => "Electricity Production",
            ChartKind::Trade => "Energy Imports & Exports",
            ChartKind::TimeSeries => "Energy Mix Over Time",
        }
    }

    pub fn unlocked_at(self) -> RevealLevel {
        let idx = ChartKind::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or(REVEAL_LEVELS - 1);
        RevealLevel(idx as u8 + 1)
    }
}

/// Points awarded for a correct guess at each reveal level. Non-increasing
/// and defined for every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreTable {
    points: [u32; REVEAL_LEVELS],
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            points: [100, 75, 50, 25],
        }
    }
}

impl ScoreTable {
    pub fn new(points: &[u32]) -> Result<Self, ScoreTableError> {
        let points: [u32; REVEAL_LEVELS] =
            points.try_into().map_err(|_| ScoreTableError::WrongLength {
                expected: REVEAL_LEVELS,
                got: points.len(),
            })?;
        for level in 1..REVEAL_LEVELS {
            if points[level] > points[level - 1] {
                return Err(ScoreTableError::Increasing { level: level + 1 });
            }
        }
        Ok(Self { points })
    }

    pub fn points_for(&self, level: RevealLevel) -> u32 {
        self.points[level.0 as usize - 1]
    }

    pub fn max_points(&self) -> u32 {
        self.points_for(RevealLevel::FIRST)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub rounds: usize,
    pub score_table: ScoreTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            score_table: ScoreTable::default(),
        }
    }
}

impl GameConfig {
    pub fn max_score(&self) -> u32 {
        u32::try_from(self.rounds)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.score_table.max_points())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub country_code: String,
    pub display_name: String,
    pub flag_glyph: String,
    pub is_correct: bool,
    pub points_awarded: u32,
    pub charts_revealed_at_guess: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingData,
    RoundActive,
    RoundResolved,
    GameComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// No active round or nothing selected.
    Ignored,
    RoundComplete(RoundResult),
    GameComplete(Vec<RoundResult>),
}

#[derive(Debug, Clone)]
pub struct GameSession {
    pub phase: Phase,
    pub round_index: usize,
    pub candidates: Vec<CountryRecord>,
    pub correct: Option<CountryRecord>,
    pub reveal: RevealLevel,
    pub selection: Option<String>,
    pub results: Vec<RoundResult>,
}

impl GameSession {
    fn new() -> Self {
        Self {
            phase: Phase::AwaitingData,
            round_index: 0,
            candidates: Vec::new(),
            correct: None,
            reveal: RevealLevel::FIRST,
            selection: None,
            results: Vec::new(),
        }
    }
}

pub struct RoundEngine<R: Rng> {
    data: Arc<EnergyDataMap>,
    eligible: Vec<CountryRecord>,
    config: GameConfig,
    rng: R,
    session: GameSession,
}

impl<R: Rng> RoundEngine<R> {
    pub fn new(data: Arc<EnergyDataMap>, config: GameConfig, rng: R) -> Self {
        let available: HashSet<String> = data.keys().cloned().collect();
        let eligible = countries::list_eligible(&available);
        Self {
            data,
            eligible,
            config,
            rng,
            session: GameSession::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible.len()
    }

    /// Discard any previous session and start the first round.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        self.session = GameSession::new();
        info!(
            rounds = self.config.rounds,
            eligible = self.eligible.len(),
            "starting game"
        );
        self.start_round()
    }

    pub fn abandon(&mut self) {
        self.session = GameSession::new();
    }

    pub fn start_round(&mut self) -> Result<(), GameError> {
        match self.session.phase {
            Phase::AwaitingData | Phase::RoundResolved => {}
            Phase::RoundActive => {
                return Err(GameError::InvalidOperation("round already active"));
            }
            Phase::GameComplete => return Err(GameError::InvalidOperation("game is complete")),
        }
        if self.eligible.len() < CANDIDATES_PER_ROUND {
            return Err(GameError::InsufficientData {
                available: self.eligible.len(),
                required: CANDIDATES_PER_ROUND,
            });
        }

        let mut candidates: Vec<CountryRecord> = self
            .eligible
            .choose_multiple(&mut self.rng, CANDIDATES_PER_ROUND)
            .cloned()
            .collect();
        candidates.shuffle(&mut self.rng);
        let correct = candidates[self.rng.gen_range(0..CANDIDATES_PER_ROUND)].clone();
        debug!(
            round = self.session.round_index + 1,
            candidates = ?candidates.iter().map(|c| c.code.as_str()).collect::<Vec<_>>(),
            "round drawn"
        );

        self.session.candidates = candidates;
        self.session.correct = Some(correct);
        self.session.reveal = RevealLevel::FIRST;
        self.session.selection = None;
        self.session.phase = Phase::RoundActive;
        Ok(())
    }

    /// Unlock the next chart. Returns false when nothing changed.
    pub fn reveal_next(&mut self) -> bool {
        if self.session.phase != Phase::RoundActive {
            return false;
        }
        match self.session.reveal.next() {
            Some(next) => {
                self.session.reveal = next;
                true
            }
            None => false,
        }
    }

    /// Not checked against the candidates; a code outside them simply
    /// cannot match the correct country.
    pub fn select_country(&mut self, code: &str) {
        if self.session.phase != Phase::RoundActive {
            return;
        }
        self.session.selection = Some(code.to_string());
    }

    pub fn submit_guess(&mut self) -> GuessOutcome {
        if self.session.phase != Phase::RoundActive {
            return GuessOutcome::Ignored;
        }
        let (Some(selection), Some(correct)) =
            (self.session.selection.as_ref(), self.session.correct.as_ref())
        else {
            return GuessOutcome::Ignored;
        };

        let is_correct = *selection == correct.code;
        let points_awarded = if is_correct {
            self.config.score_table.points_for(self.session.reveal)
        } else {
            0
        };
        let result = RoundResult {
            country_code: correct.code.clone(),
            display_name: correct.display_name.clone(),
            flag_glyph: correct.flag_glyph.clone(),
            is_correct,
            points_awarded,
            charts_revealed_at_guess: self.session.reveal.get(),
        };
        info!(
            round = self.session.round_index + 1,
            country = %result.country_code,
            correct = is_correct,
            points = points_awarded,
            "round resolved"
        );

        self.session.results.push(result.clone());
        self.session.round_index += 1;
        if self.session.round_index < self.config.rounds {
            self.session.phase = Phase::RoundResolved;
            GuessOutcome::RoundComplete(result)
        } else {
            self.session.phase = Phase::GameComplete;
            GuessOutcome::GameComplete(self.session.results.clone())
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn round_index(&self) -> usize {
        self.session.round_index
    }

    pub fn candidates(&self) -> &[CountryRecord] {
        &self.session.candidates
    }

    pub fn correct_country(&self) -> Option<&CountryRecord> {
        self.session.correct.as_ref()
    }

    pub fn reveal_level(&self) -> RevealLevel {
        self.session.reveal
    }

    pub fn visible_charts(&self) -> &'static [ChartKind] {
        self.session.reveal.visible_charts()
    }

    pub fn selection(&self) -> Option<&str> {
        self.session.selection.as_deref()
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.session.results
    }

    pub fn current_profile(&self) -> Option<&EnergyProfile> {
        let correct = self.session.correct.as_ref()?;
        self.data.get(&correct.code)
    }

    /// Points a correct guess would earn right now.
    pub fn potential_points(&self) -> u32 {
        self.config.score_table.points_for(self.session.reveal)
    }
}
