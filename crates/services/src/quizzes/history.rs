use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use quiz_core::model::{LessonId, ScoreTier, TierThresholds};
use storage::repository::{AttemptId, QuizAttemptRepository, QuizAttemptRow};

use crate::Clock;
use crate::error::QuizServiceError;

/// Presentation-agnostic list item for a past quiz attempt.
///
/// Timestamps stay raw; formatting belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttemptListItem {
    pub id: AttemptId,
    pub lesson_id: LessonId,
    pub completed_at: DateTime<Utc>,

    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
    pub tier: ScoreTier,
    pub degraded: bool,
}

impl QuizAttemptListItem {
    #[must_use]
    pub fn from_row(row: &QuizAttemptRow, thresholds: &TierThresholds) -> Self {
        let attempt = &row.attempt;
        Self {
            id: row.id,
            lesson_id: attempt.lesson_id(),
            completed_at: attempt.completed_at(),
            correct: attempt.correct_count(),
            total: attempt.total_count(),
            percentage: attempt.percentage(),
            tier: attempt.tier(thresholds),
            degraded: attempt.degraded(),
        }
    }
}

/// Read side of quiz history: owns the time source and repository access.
#[derive(Clone)]
pub struct QuizHistoryService {
    clock: Clock,
    attempts: Arc<dyn QuizAttemptRepository>,
    thresholds: TierThresholds,
}

impl QuizHistoryService {
    #[must_use]
    pub fn new(clock: Clock, attempts: Arc<dyn QuizAttemptRepository>) -> Self {
        Self {
            clock,
            attempts,
            thresholds: TierThresholds::default(),
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(
            clock,
            Arc::new(storage::repository::InMemoryRepository::new()),
        )
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Attempts for a lesson completed within the last `days` days, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on repository failures.
    pub async fn list_recent_attempts(
        &self,
        lesson_id: LessonId,
        days: i64,
        limit: u32,
    ) -> Result<Vec<QuizAttemptListItem>, QuizServiceError> {
        let since = self.clock.now() - Duration::days(days.max(0));
        let rows = self.attempts.list_attempts(lesson_id, limit).await?;

        Ok(rows
            .iter()
            .filter(|row| row.attempt.completed_at() >= since)
            .map(|row| QuizAttemptListItem::from_row(row, &self.thresholds))
            .collect())
    }

    /// Latest attempt per lesson. Lessons never quizzed are omitted.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on repository failures.
    pub async fn latest_by_lesson(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<QuizAttemptListItem>, QuizServiceError> {
        let rows = self.attempts.latest_attempts(lesson_ids).await?;
        Ok(rows
            .iter()
            .map(|row| QuizAttemptListItem::from_row(row, &self.thresholds))
            .collect())
    }

    /// Most recent attempt for one lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` on repository failures.
    pub async fn latest_score(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<QuizAttemptListItem>, QuizServiceError> {
        let rows = self.attempts.list_attempts(lesson_id, 1).await?;
        Ok(rows
            .first()
            .map(|row| QuizAttemptListItem::from_row(row, &self.thresholds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuizAttempt, percentage};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn attempt(lesson: u64, correct: u32, days_ago: i64) -> QuizAttempt {
        let completed = fixed_now() - Duration::days(days_ago);
        QuizAttempt::from_persisted(
            LessonId::new(lesson),
            completed - Duration::minutes(3),
            completed,
            correct,
            5,
            percentage(correct, 5),
            days_ago == 0,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn recent_attempts_respect_the_day_window() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(&attempt(1, 5, 0)).await.unwrap();
        repo.append_attempt(&attempt(1, 3, 2)).await.unwrap();
        repo.append_attempt(&attempt(1, 1, 30)).await.unwrap();

        let history = QuizHistoryService::new(Clock::fixed(fixed_now()), Arc::new(repo));
        let items = history
            .list_recent_attempts(LessonId::new(1), 7, 10)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].percentage, 100);
        assert_eq!(items[0].tier, ScoreTier::Excellent);
        assert!(items[0].degraded);
        assert_eq!(items[1].percentage, 60);
        assert_eq!(items[1].tier, ScoreTier::Good);
    }

    #[tokio::test]
    async fn latest_score_is_none_without_attempts() {
        let history = QuizHistoryService::in_memory(Clock::fixed(fixed_now()));
        assert!(history.latest_score(LessonId::new(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_by_lesson_uses_custom_thresholds() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(&attempt(1, 3, 1)).await.unwrap();
        repo.append_attempt(&attempt(2, 4, 1)).await.unwrap();

        let history = QuizHistoryService::new(Clock::fixed(fixed_now()), Arc::new(repo))
            .with_thresholds(TierThresholds::new(90, 70).unwrap());
        let items = history
            .latest_by_lesson(&[LessonId::new(1), LessonId::new(2)])
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].tier, ScoreTier::NeedsPractice);
        assert_eq!(items[1].tier, ScoreTier::Good);
    }
}
