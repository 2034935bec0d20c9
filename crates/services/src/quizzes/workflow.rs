use std::sync::Arc;

use quiz_core::model::{
    AnswerResolution, LessonId, QuizAttempt, QuizError, QuizOutcome, QuizSession, ScoreResult,
    StoredQuestion, TierThresholds,
};
use storage::repository::{
    AttemptId, LessonQuizRecord, LessonQuizRepository, QuizAttemptRepository,
};

use crate::Clock;
use crate::error::QuizServiceError;
use crate::quiz_loader::{DegradedNotice, LoadedQuiz, QuizLoader, QuizOrigin};
use crate::sources::QuizRequest;
use crate::sources::adapters::{ResolutionFailure, from_stored};

/// A started quiz for one lesson.
#[derive(Debug, Clone)]
pub struct ActiveQuiz {
    lesson_id: LessonId,
    session: QuizSession,
    origin: QuizOrigin,
    notice: Option<DegradedNotice>,
    dropped: Vec<ResolutionFailure>,
    attempt_id: Option<AttemptId>,
}

impl ActiveQuiz {
    fn started(lesson_id: LessonId, loaded: LoadedQuiz) -> Result<Self, QuizError> {
        let LoadedQuiz {
            mut session,
            origin,
            notice,
        } = loaded;
        session.start()?;
        Ok(Self {
            lesson_id,
            session,
            origin,
            notice,
            dropped: Vec::new(),
            attempt_id: None,
        })
    }

    fn with_dropped(mut self, dropped: Vec<ResolutionFailure>) -> Self {
        self.dropped = dropped;
        self
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Mutable access for answering and navigation.
    pub fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    #[must_use]
    pub fn origin(&self) -> QuizOrigin {
        self.origin
    }

    #[must_use]
    pub fn notice(&self) -> Option<&DegradedNotice> {
        self.notice.as_ref()
    }

    /// Saved questions left out because their answer could not be resolved.
    #[must_use]
    pub fn dropped_questions(&self) -> &[ResolutionFailure] {
        &self.dropped
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.origin == QuizOrigin::Fallback
    }

    /// Id of the persisted attempt, once the quiz has been finished.
    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }
}

/// Result of finishing a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedQuiz {
    pub attempt_id: AttemptId,
    pub attempt: QuizAttempt,
    pub score: ScoreResult,
}

/// Orchestrates loading, starting and persisting lesson quizzes.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    loader: Arc<QuizLoader>,
    lesson_quizzes: Arc<dyn LessonQuizRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    resolution: AnswerResolution,
    thresholds: TierThresholds,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        loader: Arc<QuizLoader>,
        lesson_quizzes: Arc<dyn LessonQuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            clock,
            loader,
            lesson_quizzes,
            attempts,
            resolution: AnswerResolution::default(),
            thresholds: TierThresholds::default(),
        }
    }

    /// How stored answers that match no option are handled.
    #[must_use]
    pub fn with_resolution(mut self, resolution: AnswerResolution) -> Self {
        self.resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: TierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn thresholds(&self) -> TierThresholds {
        self.thresholds
    }

    #[must_use]
    pub fn loader(&self) -> Arc<QuizLoader> {
        Arc::clone(&self.loader)
    }

    /// Start a quiz for the lesson, preferring its saved question set.
    ///
    /// Falls back to the generator when nothing usable is saved.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError` for storage failures, a concurrent load, or
    /// session start failures.
    pub async fn start_quiz(&self, request: &QuizRequest) -> Result<ActiveQuiz, QuizServiceError> {
        if let Some(record) = self.lesson_quizzes.get_lesson_quiz(request.lesson_id).await? {
            let import = from_stored(&record.questions, self.resolution);
            if !import.questions.is_empty() {
                log::debug!(
                    "starting saved quiz for lesson {} ({} questions, {} dropped)",
                    request.lesson_id,
                    import.questions.len(),
                    import.failures.len()
                );
                let loaded =
                    self.loader
                        .build_session(import.questions, QuizOrigin::Stored, None)?;
                return Ok(ActiveQuiz::started(request.lesson_id, loaded)?
                    .with_dropped(import.failures));
            }
            log::warn!(
                "saved quiz for lesson {} has no usable questions, regenerating",
                request.lesson_id
            );
        }

        self.start_generated_quiz(request).await
    }

    /// Start a quiz from a fresh generator call, ignoring any saved set.
    ///
    /// A generated set is saved for the lesson; failing to save it is logged
    /// and does not stop the quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Load` while another load is in flight.
    pub async fn start_generated_quiz(
        &self,
        request: &QuizRequest,
    ) -> Result<ActiveQuiz, QuizServiceError> {
        let loaded = self.loader.load(request).await?;

        if loaded.origin == QuizOrigin::Generated {
            let record = LessonQuizRecord {
                lesson_id: request.lesson_id,
                questions: loaded
                    .session
                    .questions()
                    .iter()
                    .map(StoredQuestion::from_question)
                    .collect(),
                updated_at: self.clock.now(),
            };
            if let Err(err) = self.lesson_quizzes.upsert_lesson_quiz(&record).await {
                log::warn!(
                    "could not save generated quiz for lesson {}: {err}",
                    request.lesson_id
                );
            }
        }

        Ok(ActiveQuiz::started(request.lesson_id, loaded)?)
    }

    /// Start the same questions again with cleared answers.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` if the fresh session cannot start.
    pub fn retake_quiz(&self, quiz: &ActiveQuiz) -> Result<ActiveQuiz, QuizServiceError> {
        let loaded = LoadedQuiz {
            session: quiz.session.retake(),
            origin: quiz.origin,
            notice: quiz.notice.clone(),
        };
        Ok(ActiveQuiz::started(quiz.lesson_id, loaded)?.with_dropped(quiz.dropped.clone()))
    }

    /// Persist the attempt of a completed quiz. Calling it again returns the
    /// already persisted attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` with `NotCompleted` if the quiz is still
    /// running, or `QuizServiceError::Storage` if persistence fails.
    pub async fn finish_quiz(
        &self,
        quiz: &mut ActiveQuiz,
    ) -> Result<FinishedQuiz, QuizServiceError> {
        if !quiz.session.is_complete() {
            return Err(QuizError::NotCompleted.into());
        }

        let score = quiz.session.score_with(&self.thresholds);

        if let Some(attempt_id) = quiz.attempt_id {
            let attempt = self.attempts.get_attempt(attempt_id).await?;
            return Ok(FinishedQuiz {
                attempt_id,
                attempt,
                score,
            });
        }

        let attempt = QuizAttempt::from_session(quiz.lesson_id, &quiz.session, quiz.is_degraded())?;
        let attempt_id = self.attempts.append_attempt(&attempt).await?;
        quiz.attempt_id = Some(attempt_id);

        log::info!(
            "lesson {} quiz finished: {}/{} ({}%, {})",
            quiz.lesson_id,
            score.correct_count,
            score.total_count,
            score.percentage,
            score.tier
        );

        Ok(FinishedQuiz {
            attempt_id,
            attempt,
            score,
        })
    }

    /// Score plus per-question review for a completed quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotCompleted` while the quiz is running.
    pub fn outcome<'a>(&self, quiz: &'a ActiveQuiz) -> Result<QuizOutcome<'a>, QuizError> {
        quiz.session.outcome(&self.thresholds)
    }
}
