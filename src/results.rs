use serde::Serialize;

use crate::round::{RoundResult, ScoreTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    Outstanding,
    Excellent,
    Great,
    Good,
    NotBad,
    KeepPracticing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    High,
    Mid,
    Low,
}

impl ScoreBand {
    /// `percent` is the total score as a share of the maximum, 0..=100.
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            90.. => ScoreBand::Outstanding,
            80..=89 => ScoreBand::Excellent,
            70..=79 => ScoreBand::Great,
            60..=69 => ScoreBand::Good,
            50..=59 => ScoreBand::NotBad,
            _ => ScoreBand::KeepPracticing,
        }
    }

    pub fn from_score(total: u32, max: u32) -> Self {
        ScoreBand::from_percent(percent_of(total, max))
    }

    pub fn message(self) -> &'static str {
        match self {
            ScoreBand::Outstanding => "Outstanding! You're an energy expert!",
            ScoreBand::Excellent => "Excellent work! You know your energy sources!",
            ScoreBand::Great => "Great job! You have solid energy knowledge!",
            ScoreBand::Good => "Good effort! Keep learning about energy!",
            ScoreBand::NotBad => "Not bad! There's room for improvement!",
            ScoreBand::KeepPracticing => "Keep practicing! Energy knowledge takes time to build!",
        }
    }

    pub fn tier(self) -> ScoreTier {
        match self {
            ScoreBand::Outstanding | ScoreBand::Excellent => ScoreTier::High,
            ScoreBand::Great | ScoreBand::Good => ScoreTier::Mid,
            ScoreBand::NotBad | ScoreBand::KeepPracticing => ScoreTier::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub rounds: usize,
    pub total_score: u32,
    pub max_score: u32,
    pub score_percent: u32,
    pub correct_count: usize,
    pub accuracy_percent: u32,
    pub total_charts_viewed: u32,
    pub band: ScoreBand,
}

/// Summary against the default score table (500 max over five rounds).
pub fn summarize(results: &[RoundResult]) -> GameSummary {
    summarize_with(results, &ScoreTable::default())
}

pub fn summarize_with(results: &[RoundResult], table: &ScoreTable) -> GameSummary {
    let total_score = results
        .iter()
        .fold(0u32, |acc, r| acc.saturating_add(r.points_awarded));
    let correct_count = results.iter().filter(|r| r.is_correct).count();
    let total_charts_viewed: u32 = results
        .iter()
        .map(|r| u32::from(r.charts_revealed_at_guess))
        .sum();
    let max_score = u32::try_from(results.len())
        .unwrap_or(u32::MAX)
        .saturating_mul(table.max_points());
    let score_percent = percent_of(total_score, max_score);

    GameSummary {
        rounds: results.len(),
        total_score,
        max_score,
        score_percent,
        correct_count,
        accuracy_percent: percent_of(correct_count as u32, results.len() as u32),
        total_charts_viewed,
        band: ScoreBand::from_percent(score_percent),
    }
}

fn percent_of(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * f64::from(part) / f64::from(whole)).round() as u32
}
