use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{LessonId, QuizSession, ScoreTier, TierThresholds, percentage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("quiz session has not been completed")]
    NotCompleted,

    #[error("too many questions for a single attempt: {len}")]
    TooManyQuestions { len: usize },

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("stored percentage {stored} does not match {correct}/{total}")]
    PercentageMismatch {
        stored: u32,
        correct: u32,
        total: u32,
    },
}

/// History record of one completed quiz for a lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    lesson_id: LessonId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    correct_count: u32,
    total_count: u32,
    percentage: u32,
    degraded: bool,
}

impl QuizAttempt {
    /// Rehydrate an attempt from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if timestamps or counts are inconsistent.
    pub fn from_persisted(
        lesson_id: LessonId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        correct_count: u32,
        total_count: u32,
        stored_percentage: u32,
        degraded: bool,
    ) -> Result<Self, AttemptError> {
        if completed_at < started_at {
            return Err(AttemptError::InvalidTimeRange);
        }
        if correct_count > total_count {
            return Err(AttemptError::CountMismatch {
                correct: correct_count,
                total: total_count,
            });
        }
        if stored_percentage != percentage(correct_count, total_count) {
            return Err(AttemptError::PercentageMismatch {
                stored: stored_percentage,
                correct: correct_count,
                total: total_count,
            });
        }

        Ok(Self {
            lesson_id,
            started_at,
            completed_at,
            correct_count,
            total_count,
            percentage: stored_percentage,
            degraded,
        })
    }

    /// Build an attempt from a completed session.
    ///
    /// `degraded` marks sessions that ran on the built-in fallback questions.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotCompleted` if the session is still running.
    pub fn from_session(
        lesson_id: LessonId,
        session: &QuizSession,
        degraded: bool,
    ) -> Result<Self, AttemptError> {
        let (Some(started_at), Some(completed_at)) = (session.started_at(), session.completed_at())
        else {
            return Err(AttemptError::NotCompleted);
        };

        let len = session.total_questions();
        u32::try_from(len).map_err(|_| AttemptError::TooManyQuestions { len })?;
        let score = session.score();

        Self::from_persisted(
            lesson_id,
            started_at,
            completed_at,
            score.correct_count,
            score.total_count,
            score.percentage,
            degraded,
        )
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn degraded(&self) -> bool {
        self.degraded
    }

    #[must_use]
    pub fn tier(&self, thresholds: &TierThresholds) -> ScoreTier {
        thresholds.classify(self.percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;
    use crate::time::{Clock, fixed_now};
    use chrono::Duration;

    #[test]
    fn rejects_inverted_time_range() {
        let now = fixed_now();
        let err = QuizAttempt::from_persisted(
            LessonId::new(1),
            now,
            now - Duration::seconds(1),
            1,
            2,
            50,
            false,
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::InvalidTimeRange);
    }

    #[test]
    fn rejects_inconsistent_counts() {
        let now = fixed_now();
        let err = QuizAttempt::from_persisted(LessonId::new(1), now, now, 3, 2, 100, false)
            .unwrap_err();
        assert!(matches!(err, AttemptError::CountMismatch { .. }));

        let err = QuizAttempt::from_persisted(LessonId::new(1), now, now, 1, 2, 40, false)
            .unwrap_err();
        assert!(matches!(err, AttemptError::PercentageMismatch { stored: 40, .. }));
    }

    #[test]
    fn builds_from_completed_session() {
        let mut clock = Clock::fixed(fixed_now());
        let questions = vec![
            Question::new("Q1", vec!["a".into(), "b".into()], 0).unwrap(),
            Question::new("Q2", vec!["a".into(), "b".into()], 1).unwrap(),
        ];
        let mut session = QuizSession::new(questions).unwrap().with_clock(clock);

        let err = QuizAttempt::from_session(LessonId::new(7), &session, false).unwrap_err();
        assert_eq!(err, AttemptError::NotCompleted);

        session.start().unwrap();
        session.answer_current(0).unwrap();
        let _ = session.advance().unwrap();
        clock.advance(Duration::minutes(2));
        session = session.with_clock(clock);
        session.answer_current(0).unwrap();
        let _ = session.advance().unwrap();

        let attempt = QuizAttempt::from_session(LessonId::new(7), &session, true).unwrap();
        assert_eq!(attempt.lesson_id(), LessonId::new(7));
        assert_eq!(attempt.correct_count(), 1);
        assert_eq!(attempt.total_count(), 2);
        assert_eq!(attempt.percentage(), 50);
        assert!(attempt.degraded());
        assert_eq!(attempt.completed_at() - attempt.started_at(), Duration::minutes(2));
        assert_eq!(
            attempt.tier(&TierThresholds::default()),
            ScoreTier::NeedsPractice
        );
    }
}
