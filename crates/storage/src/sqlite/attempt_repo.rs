use quiz_core::model::{AttemptId, AttemptRecord, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row, ser};
use crate::repository::{AttemptRepository, StorageError};

const ATTEMPT_COLUMNS: &str = r"
    id, quiz_id, user_id, score, total_questions, time_spent,
    completed_at, incorrect_answers
";

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn create_attempt(&self, attempt: &AttemptRecord) -> Result<(), StorageError> {
        let incorrect = serde_json::to_string(attempt.incorrect_answers()).map_err(ser)?;
        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    id, quiz_id, user_id, score, total_questions, time_spent,
                    completed_at, incorrect_answers
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(attempt.id().to_string())
        .bind(attempt.quiz_id().to_string())
        .bind(attempt.user_id().to_string())
        .bind(i64::from(attempt.score()))
        .bind(i64::from(attempt.total_questions()))
        .bind(i64::from(attempt.time_spent_secs()))
        .bind(attempt.completed_at())
        .bind(incorrect)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            let existing = self.get_attempt(attempt.id()).await?;
            if existing != *attempt {
                return Err(StorageError::Conflict);
            }
            log::debug!("attempt {} already stored", attempt.id());
        }
        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError> {
        let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row)
    }

    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let sql = format!(
            r"
                SELECT {ATTEMPT_COLUMNS}
                FROM quiz_attempts
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            "
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
