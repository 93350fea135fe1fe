use quiz_core::model::{Quiz, QuizId, SubjectId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_quiz_row};
use crate::repository::{QuizRepository, StorageError};

const QUIZ_COLUMNS: &str = r"
    id, user_id, title, description, subject_id, document_id,
    total_questions, difficulty_level, created_at
";

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quizzes (
                    id, user_id, title, description, subject_id, document_id,
                    total_questions, difficulty_level, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(quiz.id.to_string())
        .bind(quiz.user_id.to_string())
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(quiz.subject_id.as_ref().map(ToString::to_string))
        .bind(quiz.document_id.map(|d| d.to_string()))
        .bind(i64::from(quiz.total_questions))
        .bind(quiz.difficulty.level())
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        map_quiz_row(&row)
    }

    async fn list_quizzes_for_user(&self, user_id: UserId) -> Result<Vec<Quiz>, StorageError> {
        let sql = format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE user_id = ?1 ORDER BY created_at DESC, id"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_quiz_row).collect()
    }

    async fn list_quizzes_for_subject(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let sql = format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE subject_id = ?1 ORDER BY created_at DESC, id"
        );
        let rows = sqlx::query(&sql)
            .bind(subject_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_quiz_row).collect()
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        // questions and attempts go with it through ON DELETE CASCADE
        sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
