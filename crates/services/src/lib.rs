#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod quiz_loader;
pub mod quizzes;
pub mod sources;

pub use quiz_core::Clock;

pub use app_services::{AppServices, QuizSettings};
pub use error::{AppServicesError, LoadError, QuizServiceError, SourceError};
pub use quiz_loader::{DegradedNotice, LoadedQuiz, QuizLoader, QuizOrigin};
pub use quizzes::{ActiveQuiz, FinishedQuiz, QuizAttemptListItem, QuizHistoryService, QuizLoopService};
pub use sources::adapters::ResolutionFailure;
pub use sources::remote::{GeneratorConfig, RemoteQuestionSource};
pub use sources::{QuestionSource, QuizRequest};
