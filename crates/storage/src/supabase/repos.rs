use async_trait::async_trait;
use quiz_core::model::{
    AttemptId, AttemptRecord, Document, DocumentId, Question, Quiz, QuizId, RECENT_ACTIVITY_LIMIT,
    Subject, SubjectId, UserId, UserStats,
};

use super::rows::{
    AttemptRow, DocumentRow, QuestionRow, QuizRow, StatsRpcArgs, SubjectRow, UserStatsRow,
    same_attempt,
};
use super::{SupabaseRepository, eq};
use crate::repository::{
    AttemptRepository, DocumentRepository, QuestionRepository, QuizRepository, StatsRepository,
    StatsUpdate, StorageError, SubjectRepository,
};

const STATS_RPC: &str = "update_user_stats_after_quiz";

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StorageError>
where
    T: TryFrom<R, Error = StorageError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl QuizRepository for SupabaseRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        self.insert("quizzes", &QuizRow::from(quiz)).await
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let row: QuizRow = self.select_one("quizzes", &[("id", eq(id))]).await?;
        Quiz::try_from(row)
    }

    async fn list_quizzes_for_user(&self, user_id: UserId) -> Result<Vec<Quiz>, StorageError> {
        let rows: Vec<QuizRow> = self
            .select(
                "quizzes",
                &[("user_id", eq(user_id)), ("order", "created_at.desc".into())],
            )
            .await?;
        collect(rows)
    }

    async fn list_quizzes_for_subject(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let rows: Vec<QuizRow> = self
            .select(
                "quizzes",
                &[
                    ("subject_id", eq(subject_id)),
                    ("order", "created_at.desc".into()),
                ],
            )
            .await?;
        collect(rows)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        self.delete("quizzes", &[("id", eq(id))]).await
    }
}

#[async_trait]
impl QuestionRepository for SupabaseRepository {
    async fn insert_questions(&self, questions: &[Question]) -> Result<(), StorageError> {
        if questions.is_empty() {
            return Ok(());
        }
        let rows: Vec<QuestionRow> = questions.iter().map(QuestionRow::from).collect();
        self.insert("questions", &rows).await
    }

    async fn questions_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<Question>, StorageError> {
        let rows: Vec<QuestionRow> = self.select("questions", &[("quiz_id", eq(quiz_id))]).await?;
        collect(rows)
    }
}

#[async_trait]
impl AttemptRepository for SupabaseRepository {
    async fn create_attempt(&self, attempt: &AttemptRecord) -> Result<(), StorageError> {
        match self.insert("quiz_attempts", &AttemptRow::from(attempt)).await {
            Err(StorageError::Conflict) => {
                let existing = self.get_attempt(attempt.id()).await?;
                if same_attempt(&existing, attempt) {
                    log::debug!("attempt {} already stored", attempt.id());
                    Ok(())
                } else {
                    Err(StorageError::Conflict)
                }
            }
            other => other,
        }
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError> {
        let row: AttemptRow = self.select_one("quiz_attempts", &[("id", eq(id))]).await?;
        AttemptRecord::try_from(row)
    }

    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let rows: Vec<AttemptRow> = self
            .select(
                "quiz_attempts",
                &[
                    ("user_id", eq(user_id)),
                    ("order", "completed_at.desc".into()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        collect(rows)
    }
}

#[async_trait]
impl StatsRepository for SupabaseRepository {
    async fn update_user_stats_after_quiz(&self, update: &StatsUpdate) -> Result<(), StorageError> {
        self.rpc(STATS_RPC, &StatsRpcArgs::from(update)).await
    }

    async fn get_user_stats(&self, user_id: UserId) -> Result<Option<UserStats>, StorageError> {
        let rows: Vec<UserStatsRow> = self.select("user_stats", &[("user_id", eq(user_id))]).await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let limit = u32::try_from(RECENT_ACTIVITY_LIMIT).unwrap_or(u32::MAX);
        let recent = self.list_attempts_for_user(user_id, limit).await?;
        row.into_stats(recent).map(Some)
    }
}

#[async_trait]
impl SubjectRepository for SupabaseRepository {
    async fn insert_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        let Some(user_id) = subject.user_id else {
            return Err(StorageError::Serialization(
                "built-in subjects are not stored".into(),
            ));
        };
        let row = SubjectRow {
            id: subject.id.clone(),
            user_id,
            name: subject.name.clone(),
            description: Some(subject.description.clone()),
        };
        self.insert("subjects", &row).await
    }

    async fn list_subjects_for_user(&self, user_id: UserId) -> Result<Vec<Subject>, StorageError> {
        let rows: Vec<SubjectRow> = self
            .select(
                "subjects",
                &[("user_id", eq(user_id)), ("order", "name.asc".into())],
            )
            .await?;
        Ok(rows.into_iter().map(Subject::from).collect())
    }
}

#[async_trait]
impl DocumentRepository for SupabaseRepository {
    async fn insert_document(&self, document: &Document) -> Result<(), StorageError> {
        self.insert("documents", &DocumentRow::from(document)).await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document, StorageError> {
        let row: DocumentRow = self.select_one("documents", &[("id", eq(id))]).await?;
        Document::try_from(row)
    }
}
