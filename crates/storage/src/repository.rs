use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{LessonId, QuizAttempt, StoredQuestion};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a persisted quiz attempt (`SQLite` row id).
pub type AttemptId = i64;

/// Persisted attempt together with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttemptRow {
    pub id: AttemptId,
    pub attempt: QuizAttempt,
}

impl QuizAttemptRow {
    #[must_use]
    pub fn new(id: AttemptId, attempt: QuizAttempt) -> Self {
        Self { id, attempt }
    }
}

/// Question set saved for a lesson, in its persisted shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonQuizRecord {
    pub lesson_id: LessonId,
    pub questions: Vec<StoredQuestion>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only history of completed quiz attempts.
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Store a completed attempt and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError>;

    /// Fetch an attempt by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError>;

    /// List attempts for a lesson, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or mapping failures.
    async fn list_attempts(
        &self,
        lesson_id: LessonId,
        limit: u32,
    ) -> Result<Vec<QuizAttemptRow>, StorageError>;

    /// Latest attempt for each of the given lessons. Lessons without attempts are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or mapping failures.
    async fn latest_attempts(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<QuizAttemptRow>, StorageError>;
}

/// Question sets saved per lesson so a quiz can be retaken without regenerating it.
#[async_trait]
pub trait LessonQuizRepository: Send + Sync {
    /// Persist or replace the question set for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_lesson_quiz(&self, record: &LessonQuizRecord) -> Result<(), StorageError>;

    /// Fetch the saved question set for a lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on query or decoding failures.
    async fn get_lesson_quiz(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<LessonQuizRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    attempts: Arc<Mutex<Vec<QuizAttemptRow>>>,
    lesson_quizzes: Arc<Mutex<HashMap<LessonId, LessonQuizRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(rows: &mut [QuizAttemptRow]) {
    rows.sort_by(|a, b| {
        b.attempt
            .completed_at()
            .cmp(&a.attempt.completed_at())
            .then(b.id.cmp(&a.id))
    });
}

#[async_trait]
impl QuizAttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = AttemptId::try_from(guard.len())
            .map_err(|e| StorageError::Serialization(e.to_string()))?
            + 1;
        guard.push(QuizAttemptRow::new(id, attempt.clone()));
        Ok(id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.attempt.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        lesson_id: LessonId,
        limit: u32,
    ) -> Result<Vec<QuizAttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<_> = guard
            .iter()
            .filter(|row| row.attempt.lesson_id() == lesson_id)
            .cloned()
            .collect();
        newest_first(&mut rows);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn latest_attempts(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<QuizAttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<_> = guard
            .iter()
            .filter(|row| lesson_ids.contains(&row.attempt.lesson_id()))
            .cloned()
            .collect();
        newest_first(&mut rows);

        let mut out: Vec<QuizAttemptRow> = Vec::new();
        for row in rows {
            if out
                .iter()
                .all(|seen| seen.attempt.lesson_id() != row.attempt.lesson_id())
            {
                out.push(row);
            }
        }
        out.sort_by_key(|row| row.attempt.lesson_id());
        Ok(out)
    }
}

#[async_trait]
impl LessonQuizRepository for InMemoryRepository {
    async fn upsert_lesson_quiz(&self, record: &LessonQuizRecord) -> Result<(), StorageError> {
        let mut guard = self
            .lesson_quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.lesson_id, record.clone());
        Ok(())
    }

    async fn get_lesson_quiz(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<LessonQuizRecord>, StorageError> {
        let guard = self
            .lesson_quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&lesson_id).cloned())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn QuizAttemptRepository>,
    pub lesson_quizzes: Arc<dyn LessonQuizRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let attempts: Arc<dyn QuizAttemptRepository> = Arc::new(repo.clone());
        let lesson_quizzes: Arc<dyn LessonQuizRepository> = Arc::new(repo);
        Self {
            attempts,
            lesson_quizzes,
        }
    }
}
