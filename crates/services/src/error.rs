//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AttemptError, QuestionError, QuizError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by question sources.
///
/// Every variant counts as an external source failure: the loader recovers
/// from all of them by switching to the built-in question set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("quiz generator is not configured")]
    Disabled,
    #[error("quiz generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("quiz generator returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("quiz generator returned no questions")]
    EmptyQuestionSet,
    #[error("generated question {position} is invalid: {source}")]
    InvalidQuestion {
        position: usize,
        #[source]
        source: QuestionError,
    },
}

/// Errors emitted by `QuizLoader`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("a quiz is already loading")]
    AlreadyLoading,
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted by quiz workflow and history services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
