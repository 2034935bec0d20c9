mod history;
mod workflow;

// Public API of the quiz subsystem.
pub use history::{QuizAttemptListItem, QuizHistoryService};
pub use workflow::{ActiveQuiz, FinishedQuiz, QuizLoopService};
