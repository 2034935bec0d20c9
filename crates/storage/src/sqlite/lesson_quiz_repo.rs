use chrono::{DateTime, Utc};
use quiz_core::model::{LessonId, StoredQuestion};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, lesson_id_to_i64, ser};
use crate::repository::{LessonQuizRecord, LessonQuizRepository, StorageError};

#[async_trait::async_trait]
impl LessonQuizRepository for SqliteRepository {
    async fn upsert_lesson_quiz(&self, record: &LessonQuizRecord) -> Result<(), StorageError> {
        let questions_json = serde_json::to_string(&record.questions).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO lesson_quizzes (lesson_id, questions_json, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(lesson_id) DO UPDATE SET
                    questions_json = excluded.questions_json,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(lesson_id_to_i64(record.lesson_id)?)
        .bind(questions_json)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_lesson_quiz(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<LessonQuizRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT questions_json, updated_at
                FROM lesson_quizzes
                WHERE lesson_id = ?1
            ",
        )
        .bind(lesson_id_to_i64(lesson_id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("questions_json").map_err(ser)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;
        let questions: Vec<StoredQuestion> = serde_json::from_str(&raw).map_err(ser)?;

        Ok(Some(LessonQuizRecord {
            lesson_id,
            questions,
            updated_at,
        }))
    }
}
