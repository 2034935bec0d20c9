mod attempt;
mod ids;
mod question;
mod review;
mod score;
mod session;
mod stored;

pub use ids::{LessonId, ParseIdError};

pub use attempt::{AttemptError, QuizAttempt};
pub use question::{AnswerResolution, MIN_OPTIONS, Question, QuestionError};
pub use review::{QuestionReview, QuizOutcome, review_answers};
pub use score::{
    ScoreResult, ScoreTier, ThresholdError, TierThresholds, compute_score, compute_score_with,
    percentage,
};
pub use session::{Advance, QuizError, QuizPhase, QuizRules, QuizSession, Retreat};
pub use stored::StoredQuestion;
