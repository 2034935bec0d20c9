//! Where quiz questions come from: saved lessons, the remote generator, or
//! the built-in fallback set.

pub mod adapters;
pub mod fallback;
pub mod remote;

use async_trait::async_trait;
use quiz_core::model::{LessonId, Question};
use serde::Serialize;

use crate::error::SourceError;

/// Parameters sent to a question generator for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub lesson_id: LessonId,
    pub title: String,
    pub content: String,
    pub question_count: u32,
}

impl QuizRequest {
    #[must_use]
    pub fn new(lesson_id: LessonId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            lesson_id,
            title: title.into(),
            content: content.into(),
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }

    #[must_use]
    pub fn with_question_count(mut self, count: u32) -> Self {
        self.question_count = count.max(1);
        self
    }
}

pub const DEFAULT_QUESTION_COUNT: u32 = 5;

/// An external producer of question sets. One outstanding call per quiz.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Produce a validated, non-empty question set for the request.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` for any transport, status or payload failure.
    async fn fetch_questions(&self, request: &QuizRequest) -> Result<Vec<Question>, SourceError>;
}
