use quiz_core::model::{LessonId, QuizAttempt};
use sqlx::Row;
use std::collections::HashSet;

use super::SqliteRepository;
use super::mapping::{conn, lesson_id_from_i64, lesson_id_to_i64, ser, u32_from_i64};
use crate::repository::{AttemptId, QuizAttemptRepository, QuizAttemptRow, StorageError};

fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizAttempt, StorageError> {
    let lesson_id = lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let correct_count = u32_from_i64(
        "correct_count",
        row.try_get::<i64, _>("correct_count").map_err(ser)?,
    )?;
    let total_count = u32_from_i64(
        "total_count",
        row.try_get::<i64, _>("total_count").map_err(ser)?,
    )?;
    let quiz_score = u32_from_i64(
        "quiz_score",
        row.try_get::<i64, _>("quiz_score").map_err(ser)?,
    )?;
    let degraded: bool = row.try_get("degraded").map_err(ser)?;

    QuizAttempt::from_persisted(
        lesson_id,
        started_at,
        completed_at,
        correct_count,
        total_count,
        quiz_score,
        degraded,
    )
    .map_err(ser)
}

fn map_attempt_row_with_id(row: &sqlx::sqlite::SqliteRow) -> Result<QuizAttemptRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let attempt = map_attempt_row(row)?;
    Ok(QuizAttemptRow::new(id, attempt))
}

#[async_trait::async_trait]
impl QuizAttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let lesson_id = lesson_id_to_i64(attempt.lesson_id())?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    lesson_id, started_at, completed_at,
                    correct_count, total_count, quiz_score, degraded
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(lesson_id)
        .bind(attempt.started_at())
        .bind(attempt.completed_at())
        .bind(i64::from(attempt.correct_count()))
        .bind(i64::from(attempt.total_count()))
        .bind(i64::from(attempt.percentage()))
        .bind(attempt.degraded())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    lesson_id, started_at, completed_at,
                    correct_count, total_count, quiz_score, degraded
                FROM quiz_attempts
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row)
    }

    async fn list_attempts(
        &self,
        lesson_id: LessonId,
        limit: u32,
    ) -> Result<Vec<QuizAttemptRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, lesson_id, started_at, completed_at,
                    correct_count, total_count, quiz_score, degraded
                FROM quiz_attempts
                WHERE lesson_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(lesson_id_to_i64(lesson_id)?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row_with_id).collect()
    }

    async fn latest_attempts(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<QuizAttemptRow>, StorageError> {
        if lesson_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
                SELECT
                    id, lesson_id, started_at, completed_at,
                    correct_count, total_count, quiz_score, degraded
                FROM quiz_attempts
                WHERE lesson_id IN (
            ",
        );
        for i in 0..lesson_ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(")\n ORDER BY lesson_id ASC, completed_at DESC, id DESC");

        let mut query = sqlx::query(&sql);
        for lesson_id in lesson_ids {
            query = query.bind(lesson_id_to_i64(*lesson_id)?);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in rows {
            let lesson_id = lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?;
            if !seen.insert(lesson_id) {
                continue;
            }
            out.push(map_attempt_row_with_id(&row)?);
        }

        Ok(out)
    }
}
