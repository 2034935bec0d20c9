use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuizError, QuizRules, QuizSession};

use crate::Clock;
use crate::error::{LoadError, SourceError};
use crate::sources::fallback::default_questions;
use crate::sources::{QuestionSource, QuizRequest};

/// Where the questions of a loaded quiz came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOrigin {
    /// Question set saved for the lesson.
    Stored,
    /// Fresh set from the remote generator.
    Generated,
    /// Built-in set used because the generator failed or is not configured.
    Fallback,
}

/// Shown to the user when the quiz runs on the built-in questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedNotice {
    pub reason: String,
}

impl DegradedNotice {
    fn from_error(err: &SourceError) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}

/// A ready-to-start session plus how it was obtained.
#[derive(Debug, Clone)]
pub struct LoadedQuiz {
    pub session: QuizSession,
    pub origin: QuizOrigin,
    pub notice: Option<DegradedNotice>,
}

impl LoadedQuiz {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.origin == QuizOrigin::Fallback
    }
}

/// Builds quiz sessions from a question source, falling back to the built-in
/// set when the source fails. At most one load runs at a time.
pub struct QuizLoader {
    source: Option<Arc<dyn QuestionSource>>,
    loading: AtomicBool,
    rules: QuizRules,
    clock: Clock,
    shuffle_questions: bool,
}

/// Clears the loading flag on every exit path.
struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl QuizLoader {
    #[must_use]
    pub fn new(source: Option<Arc<dyn QuestionSource>>) -> Self {
        Self {
            source,
            loading: AtomicBool::new(false),
            rules: QuizRules::default(),
            clock: Clock::default(),
            shuffle_questions: false,
        }
    }

    /// Loader without a generator; every load uses the built-in set.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn with_rules(mut self, rules: QuizRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Enable or disable shuffling question order before a session is built.
    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn rules(&self) -> QuizRules {
        self.rules
    }

    #[must_use]
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Fetch questions for a lesson and build a session that has not started yet.
    ///
    /// Source failures never surface as errors: the built-in set is used and
    /// the result carries a `DegradedNotice`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::AlreadyLoading` while another load is in flight.
    pub async fn load(&self, request: &QuizRequest) -> Result<LoadedQuiz, LoadError> {
        let Some(_guard) = LoadingGuard::acquire(&self.loading) else {
            return Err(LoadError::AlreadyLoading);
        };

        let fetched = match &self.source {
            Some(source) => source.fetch_questions(request).await,
            None => Err(SourceError::Disabled),
        };

        let loaded = match fetched {
            Ok(questions) => self.build_session(questions, QuizOrigin::Generated, None)?,
            Err(err) => {
                log::warn!(
                    "using built-in questions for lesson {}: {err}",
                    request.lesson_id
                );
                let notice = DegradedNotice::from_error(&err);
                self.build_session(default_questions(), QuizOrigin::Fallback, Some(notice))?
            }
        };

        Ok(loaded)
    }

    /// Wrap an already-validated question set in a session using this loader's rules and clock.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidQuestionSet` for an empty set.
    pub fn build_session(
        &self,
        mut questions: Vec<Question>,
        origin: QuizOrigin,
        notice: Option<DegradedNotice>,
    ) -> Result<LoadedQuiz, QuizError> {
        if self.shuffle_questions {
            questions.shuffle(&mut rng());
        }

        let session = QuizSession::new(questions)?
            .with_rules(self.rules)
            .with_clock(self.clock);

        Ok(LoadedQuiz {
            session,
            origin,
            notice,
        })
    }
}
