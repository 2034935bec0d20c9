use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ThresholdError {
    #[error("tier thresholds must satisfy good ({good}) <= excellent ({excellent}) <= 100")]
    InvalidBounds { excellent: u32, good: u32 },
}

//
// ─── TIERS ─────────────────────────────────────────────────────────────────────
//

/// Qualitative band a percentage score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreTier {
    Excellent,
    Good,
    NeedsPractice,
}

impl ScoreTier {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "excellent",
            ScoreTier::Good => "good",
            ScoreTier::NeedsPractice => "needs practice",
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive lower bounds for the `Excellent` and `Good` tiers.
///
/// Anything below `good` is `NeedsPractice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierThresholds {
    excellent: u32,
    good: u32,
}

impl TierThresholds {
    pub const DEFAULT_EXCELLENT: u32 = 80;
    pub const DEFAULT_GOOD: u32 = 60;

    /// Creates custom thresholds.
    ///
    /// # Errors
    ///
    /// Returns `ThresholdError::InvalidBounds` unless `good <= excellent <= 100`.
    pub fn new(excellent: u32, good: u32) -> Result<Self, ThresholdError> {
        if good > excellent || excellent > 100 {
            return Err(ThresholdError::InvalidBounds { excellent, good });
        }
        Ok(Self { excellent, good })
    }

    #[must_use]
    pub fn excellent(&self) -> u32 {
        self.excellent
    }

    #[must_use]
    pub fn good(&self) -> u32 {
        self.good
    }

    #[must_use]
    pub fn classify(&self, percentage: u32) -> ScoreTier {
        if percentage >= self.excellent {
            ScoreTier::Excellent
        } else if percentage >= self.good {
            ScoreTier::Good
        } else {
            ScoreTier::NeedsPractice
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: Self::DEFAULT_EXCELLENT,
            good: Self::DEFAULT_GOOD,
        }
    }
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Derived result of a quiz run. Never stored on the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreResult {
    pub correct_count: u32,
    pub total_count: u32,
    pub percentage: u32,
    pub tier: ScoreTier,
}

/// Integer percentage of `correct / total`, rounding halves up.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct);
    let total = u64::from(total);
    let rounded = (200 * correct + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Score answers against the default thresholds.
#[must_use]
pub fn compute_score(questions: &[Question], answers: &[Option<usize>]) -> ScoreResult {
    compute_score_with(questions, answers, &TierThresholds::default())
}

/// Score answers against custom thresholds.
///
/// `answers[i]` is matched with `questions[i]`; missing entries count as unanswered.
#[must_use]
pub fn compute_score_with(
    questions: &[Question],
    answers: &[Option<usize>],
    thresholds: &TierThresholds,
) -> ScoreResult {
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(i, q)| {
            answers
                .get(*i)
                .copied()
                .flatten()
                .is_some_and(|selected| q.is_correct(selected))
        })
        .count();

    let correct_count = u32::try_from(correct).unwrap_or(u32::MAX);
    let total_count = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    let percentage = percentage(correct_count, total_count);

    ScoreResult {
        correct_count,
        total_count,
        percentage,
        tier: thresholds.classify(percentage),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
