use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    Question, QuizOutcome, ScoreResult, TierThresholds, compute_score_with, review_answers,
};
use crate::time::Clock;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question set must contain at least one question")]
    InvalidQuestionSet,

    #[error("quiz has already been started")]
    AlreadyStarted,

    #[error("quiz is not in progress")]
    NotInProgress,

    #[error("quiz is already completed")]
    Completed,

    #[error("quiz is not completed yet")]
    NotCompleted,

    #[error("question {index} does not exist (quiz has {count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("question {index} has not been shown yet")]
    QuestionNotReached { index: usize },

    #[error("option {option} is out of range for question {question} ({count} options)")]
    AnswerOutOfRange {
        question: usize,
        option: usize,
        count: usize,
    },

    #[error("question {index} can no longer be answered")]
    AnswerLocked { index: usize },

    #[error("going back to a previous question is disabled")]
    RetreatDisabled,
}

//
// ─── PHASE & RULES ─────────────────────────────────────────────────────────────
//

/// Coarse lifecycle of a quiz session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    NotStarted,
    InProgress,
    Completed,
}

/// Navigation rules shared by every quiz flavor in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizRules {
    /// Allow stepping back to the previous question while in progress.
    pub allow_retreat: bool,
    /// Allow changing the answer of a question that was already advanced past.
    pub allow_reanswer_after_advance: bool,
}

impl QuizRules {
    /// Lesson quiz: free navigation and free re-selection.
    #[must_use]
    pub fn lesson() -> Self {
        Self {
            allow_retreat: true,
            allow_reanswer_after_advance: true,
        }
    }

    /// Modal quiz: forward-only.
    #[must_use]
    pub fn modal() -> Self {
        Self {
            allow_retreat: false,
            allow_reanswer_after_advance: true,
        }
    }

    /// Trending-topic quiz: earlier questions can be revisited but stay locked.
    #[must_use]
    pub fn trending() -> Self {
        Self {
            allow_retreat: true,
            allow_reanswer_after_advance: false,
        }
    }

    #[must_use]
    pub fn with_retreat(mut self, allow: bool) -> Self {
        self.allow_retreat = allow;
        self
    }

    #[must_use]
    pub fn with_reanswer_after_advance(mut self, allow: bool) -> Self {
        self.allow_reanswer_after_advance = allow;
        self
    }
}

impl Default for QuizRules {
    fn default() -> Self {
        Self::lesson()
    }
}

//
// ─── TRANSITION RESULTS ────────────────────────────────────────────────────────
//

/// Result of a successful `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Advance {
    /// Current question has no answer; nothing changed.
    GuardNotSatisfied,
    /// Moved on to the question at `index`.
    Moved { index: usize },
    /// Last question was answered; the session is now completed.
    Completed,
}

/// Result of a successful `retreat` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Retreat {
    AtFirstQuestion,
    Moved { index: usize },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Single-user run through a fixed question set.
///
/// The session owns its questions and answers; all transitions happen through
/// `&mut self` so there is exactly one writer. A retake is a fresh session,
/// never a transition out of `Completed`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    current: usize,
    furthest: usize,
    phase: QuizPhase,
    rules: QuizRules,
    clock: Clock,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Create a session in `NotStarted` with every question unanswered.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidQuestionSet` if `questions` is empty.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::InvalidQuestionSet);
        }

        Ok(Self {
            answers: vec![None; questions.len()],
            questions,
            current: 0,
            furthest: 0,
            phase: QuizPhase::NotStarted,
            rules: QuizRules::default(),
            clock: Clock::default(),
            started_at: None,
            completed_at: None,
        })
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

    /// Fresh session over the same questions, rules and clock.
    #[must_use]
    pub fn retake(&self) -> Self {
        Self {
            answers: vec![None; self.questions.len()],
            questions: self.questions.clone(),
            current: 0,
            furthest: 0,
            phase: QuizPhase::NotStarted,
            rules: self.rules,
            clock: self.clock,
            started_at: None,
            completed_at: None,
        }
    }

    // ─── Accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, question_index: usize) -> Option<usize> {
        self.answers.get(question_index).copied().flatten()
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn rules(&self) -> QuizRules {
        self.rules
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Question currently shown, or `None` once the session is completed.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Whether the "next"/"finish" control should be enabled.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.phase == QuizPhase::InProgress && self.answer(self.current).is_some()
    }

    /// Whether the "previous" control should be enabled.
    #[must_use]
    pub fn can_retreat(&self) -> bool {
        self.phase == QuizPhase::InProgress && self.rules.allow_retreat && self.current > 0
    }

    /// Whether `question_index` still accepts a new answer.
    #[must_use]
    pub fn is_locked(&self, question_index: usize) -> bool {
        self.is_complete()
            || (!self.rules.allow_reanswer_after_advance && question_index < self.furthest)
    }

    // ─── Transitions ───────────────────────────────────────────────────────────

    /// Move from `NotStarted` to `InProgress` on the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadyStarted` if the session left `NotStarted`.
    pub fn start(&mut self) -> Result<(), QuizError> {
        if self.phase != QuizPhase::NotStarted {
            return Err(QuizError::AlreadyStarted);
        }
        self.phase = QuizPhase::InProgress;
        self.current = 0;
        self.started_at = Some(self.clock.now());
        Ok(())
    }

    /// Record (or overwrite) the selected option for a question.
    ///
    /// Only questions up to the furthest one shown can be answered.
    ///
    /// # Errors
    ///
    /// - `QuizError::Completed` once the session is completed.
    /// - `QuizError::QuestionOutOfRange` / `QuizError::QuestionNotReached` for a bad question index.
    /// - `QuizError::AnswerOutOfRange` if the option does not exist.
    /// - `QuizError::AnswerLocked` if the rules forbid changing an advanced-past answer.
    pub fn record_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), QuizError> {
        if self.is_complete() {
            return Err(QuizError::Completed);
        }

        let count = self.questions.len();
        let question = self
            .questions
            .get(question_index)
            .ok_or(QuizError::QuestionOutOfRange {
                index: question_index,
                count,
            })?;

        if question_index > self.furthest {
            return Err(QuizError::QuestionNotReached {
                index: question_index,
            });
        }
        if option_index >= question.option_count() {
            return Err(QuizError::AnswerOutOfRange {
                question: question_index,
                option: option_index,
                count: question.option_count(),
            });
        }
        if self.is_locked(question_index) {
            return Err(QuizError::AnswerLocked {
                index: question_index,
            });
        }

        self.answers[question_index] = Some(option_index);
        Ok(())
    }

    /// Record an answer for the question currently shown.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSession::record_answer`].
    pub fn answer_current(&mut self, option_index: usize) -> Result<(), QuizError> {
        self.record_answer(self.current, option_index)
    }

    /// Go to the next question, or complete the session after the last one.
    ///
    /// An unanswered current question leaves the session untouched and yields
    /// `Advance::GuardNotSatisfied`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` before `start` or after completion.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        if self.phase != QuizPhase::InProgress {
            return Err(QuizError::NotInProgress);
        }
        if self.answer(self.current).is_none() {
            return Ok(Advance::GuardNotSatisfied);
        }

        if self.is_last_question() {
            self.phase = QuizPhase::Completed;
            self.completed_at = Some(self.clock.now());
            return Ok(Advance::Completed);
        }

        self.current += 1;
        self.furthest = self.furthest.max(self.current);
        Ok(Advance::Moved {
            index: self.current,
        })
    }

    /// Step back one question. Recorded answers are never touched.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` outside `InProgress` and
    /// `QuizError::RetreatDisabled` when the rules forbid going back.
    pub fn retreat(&mut self) -> Result<Retreat, QuizError> {
        if self.phase != QuizPhase::InProgress {
            return Err(QuizError::NotInProgress);
        }
        if !self.rules.allow_retreat {
            return Err(QuizError::RetreatDisabled);
        }
        if self.current == 0 {
            return Ok(Retreat::AtFirstQuestion);
        }

        self.current -= 1;
        Ok(Retreat::Moved {
            index: self.current,
        })
    }

    // ─── Results ───────────────────────────────────────────────────────────────

    /// Score of the answers recorded so far, using the default thresholds.
    #[must_use]
    pub fn score(&self) -> ScoreResult {
        self.score_with(&TierThresholds::default())
    }

    #[must_use]
    pub fn score_with(&self, thresholds: &TierThresholds) -> ScoreResult {
        compute_score_with(&self.questions, &self.answers, thresholds)
    }

    /// Score and review lines for a completed session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotCompleted` while the session is still running.
    pub fn outcome(&self, thresholds: &TierThresholds) -> Result<QuizOutcome<'_>, QuizError> {
        if !self.is_complete() {
            return Err(QuizError::NotCompleted);
        }
        Ok(QuizOutcome {
            score: self.score_with(thresholds),
            reviews: review_answers(&self.questions, &self.answers),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScoreTier;
    use crate::time::fixed_now;

    fn build_questions(correct: &[usize]) -> Vec<Question> {
        correct
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let options = vec!["a".into(), "b".into(), "c".into(), "d".into()];
                Question::new(format!("Q{i}"), options, *c).unwrap()
            })
            .collect()
    }

    fn started(correct: &[usize], rules: QuizRules) -> QuizSession {
        let mut session = QuizSession::new(build_questions(correct))
            .unwrap()
            .with_rules(rules)
            .with_clock(Clock::fixed(fixed_now()));
        session.start().unwrap();
        session
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err = QuizSession::new(Vec::new()).unwrap_err();
        assert_eq!(err, QuizError::InvalidQuestionSet);
    }

    #[test]
    fn new_session_is_not_started_and_unanswered() {
        let session = QuizSession::new(build_questions(&[0, 1])).unwrap();
        assert_eq!(session.phase(), QuizPhase::NotStarted);
        assert_eq!(session.answers(), &[None, None]);
        assert_eq!(session.current_index(), 0);
        assert!(!session.can_advance());
    }

    #[test]
    fn start_is_one_way() {
        let mut session = started(&[0], QuizRules::lesson());
        assert_eq!(session.phase(), QuizPhase::InProgress);
        assert_eq!(session.started_at(), Some(fixed_now()));
        assert_eq!(session.start().unwrap_err(), QuizError::AlreadyStarted);
    }

    #[test]
    fn advance_before_start_is_rejected() {
        let mut session = QuizSession::new(build_questions(&[0])).unwrap();
        assert_eq!(session.advance().unwrap_err(), QuizError::NotInProgress);
    }

    #[test]
    fn advance_without_answer_is_a_no_op() {
        let mut session = started(&[0, 1, 2], QuizRules::lesson());
        let before = session.clone();

        assert_eq!(session.advance().unwrap(), Advance::GuardNotSatisfied);
        assert_eq!(session.current_index(), before.current_index());
        assert_eq!(session.phase(), QuizPhase::InProgress);
        assert_eq!(session.answers(), before.answers());
    }

    #[test]
    fn scenario_four_of_five_correct() {
        let mut session = started(&[0, 2, 0, 3, 0], QuizRules::lesson());
        for picked in [0, 2, 1, 3, 0] {
            session.answer_current(picked).unwrap();
            let _ = session.advance().unwrap();
        }

        assert!(session.is_complete());
        let outcome = session.outcome(&TierThresholds::default()).unwrap();
        assert_eq!(outcome.score.correct_count, 4);
        assert_eq!(outcome.score.percentage, 80);
        assert_eq!(outcome.score.tier, ScoreTier::Excellent);
        assert_eq!(outcome.reviews[2].selected_option, Some("b"));
        assert_eq!(outcome.reviews[2].correct_option, "a");
    }

    #[test]
    fn completion_happens_once() {
        let mut session = started(&[0, 0], QuizRules::lesson());
        session.answer_current(0).unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Moved { index: 1 });
        session.answer_current(0).unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Completed);
        assert_eq!(session.completed_at(), Some(fixed_now()));

        assert_eq!(session.advance().unwrap_err(), QuizError::NotInProgress);
        assert_eq!(session.retreat().unwrap_err(), QuizError::NotInProgress);
        assert_eq!(session.record_answer(0, 1).unwrap_err(), QuizError::Completed);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn option_out_of_range_is_rejected() {
        let mut session = started(&[0], QuizRules::lesson());
        let err = session.record_answer(0, 4).unwrap_err();
        assert_eq!(
            err,
            QuizError::AnswerOutOfRange {
                question: 0,
                option: 4,
                count: 4
            }
        );
        assert_eq!(session.answer(0), None);
    }

    #[test]
    fn cannot_answer_unknown_or_unreached_question() {
        let mut session = started(&[0, 0, 0], QuizRules::lesson());
        assert_eq!(
            session.record_answer(9, 0).unwrap_err(),
            QuizError::QuestionOutOfRange { index: 9, count: 3 }
        );
        assert_eq!(
            session.record_answer(2, 0).unwrap_err(),
            QuizError::QuestionNotReached { index: 2 }
        );
    }

    #[test]
    fn reanswer_overwrites_current_answer() {
        let mut session = started(&[2], QuizRules::trending());
        session.answer_current(1).unwrap();
        session.answer_current(1).unwrap();
        session.answer_current(2).unwrap();
        assert_eq!(session.answer(0), Some(2));
        assert_eq!(session.score().correct_count, 1);
    }

    #[test]
    fn retreat_keeps_answers() {
        let mut session = started(&[0, 1], QuizRules::lesson());
        assert_eq!(session.retreat().unwrap(), Retreat::AtFirstQuestion);

        session.answer_current(3).unwrap();
        let _ = session.advance().unwrap();
        assert!(session.can_retreat());
        assert_eq!(session.retreat().unwrap(), Retreat::Moved { index: 0 });
        assert_eq!(session.answer(0), Some(3));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn lesson_rules_allow_changing_earlier_answers() {
        let mut session = started(&[0, 1], QuizRules::lesson());
        session.answer_current(3).unwrap();
        let _ = session.advance().unwrap();
        let _ = session.retreat().unwrap();

        session.answer_current(0).unwrap();
        assert_eq!(session.answer(0), Some(0));
        // Question 1 was already shown, so it stays answerable from here.
        session.record_answer(1, 1).unwrap();
    }

    #[test]
    fn trending_rules_lock_earlier_answers() {
        let mut session = started(&[0, 1], QuizRules::trending());
        session.answer_current(3).unwrap();
        let _ = session.advance().unwrap();
        let _ = session.retreat().unwrap();

        assert!(session.is_locked(0));
        assert_eq!(
            session.answer_current(0).unwrap_err(),
            QuizError::AnswerLocked { index: 0 }
        );
        assert_eq!(session.answer(0), Some(3));

        // The locked question is already answered, so moving forward works.
        assert_eq!(session.advance().unwrap(), Advance::Moved { index: 1 });
    }

    #[test]
    fn modal_rules_forbid_retreat() {
        let mut session = started(&[0, 1], QuizRules::modal());
        session.answer_current(0).unwrap();
        let _ = session.advance().unwrap();
        assert!(!session.can_retreat());
        assert_eq!(session.retreat().unwrap_err(), QuizError::RetreatDisabled);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn outcome_requires_completion() {
        let session = started(&[0], QuizRules::lesson());
        assert_eq!(
            session.outcome(&TierThresholds::default()).unwrap_err(),
            QuizError::NotCompleted
        );
    }

    #[test]
    fn retake_resets_to_not_started() {
        let mut session = started(&[0], QuizRules::trending());
        session.answer_current(0).unwrap();
        let _ = session.advance().unwrap();
        assert!(session.is_complete());

        let fresh = session.retake();
        assert_eq!(fresh.phase(), QuizPhase::NotStarted);
        assert_eq!(fresh.answers(), &[None]);
        assert_eq!(fresh.rules(), QuizRules::trending());
        assert_eq!(fresh.questions(), session.questions());
        assert!(session.is_complete());
    }
}
