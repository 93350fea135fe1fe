use quiz_core::model::{Question, QuizId};

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, ser};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_questions(&self, questions: &[Question]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for (position, question) in questions.iter().enumerate() {
            let options = serde_json::to_string(question.options()).map_err(ser)?;
            let position = i64::try_from(position).map_err(ser)?;
            let res = sqlx::query(
                r"
                    INSERT INTO questions (
                        id, quiz_id, position, question, correct_answer,
                        options, explanation, latex_content
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(id) DO NOTHING
                ",
            )
            .bind(question.id().to_string())
            .bind(question.quiz_id().to_string())
            .bind(position)
            .bind(question.prompt())
            .bind(question.correct_answer())
            .bind(options)
            .bind(question.explanation())
            .bind(question.latex())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

            if res.rows_affected() == 0 {
                return Err(StorageError::Conflict);
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn questions_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, quiz_id, question, correct_answer, options,
                    explanation, latex_content
                FROM questions
                WHERE quiz_id = ?1
                ORDER BY position ASC, rowid ASC
            ",
        )
        .bind(quiz_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }
}
