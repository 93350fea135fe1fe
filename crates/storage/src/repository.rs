use async_trait::async_trait;
use quiz_core::model::{
    AttemptId, AttemptRecord, Document, DocumentId, Question, Quiz, QuizId, Subject, SubjectId,
    UserId, UserStats,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
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

/// Arguments of the server-side stats aggregation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsUpdate {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub score: u32,
    pub total_questions: u32,
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a new quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken, or other storage errors.
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError>;

    /// List a user's quizzes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_quizzes_for_user(&self, user_id: UserId) -> Result<Vec<Quiz>, StorageError>;

    /// List quizzes filed under a subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_quizzes_for_subject(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Vec<Quiz>, StorageError>;

    /// Remove a quiz together with its questions. Deleting a missing quiz
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if any question cannot be stored.
    async fn insert_questions(&self, questions: &[Question]) -> Result<(), StorageError>;

    /// Questions for a quiz in the order the backend returns them. An empty
    /// list is a valid answer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn questions_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Store an attempt record.
    ///
    /// Idempotent on `AttemptId`: storing the same record twice succeeds,
    /// storing a different record under an existing id is a conflict.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` or other storage errors.
    async fn create_attempt(&self, attempt: &AttemptRecord) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError>;

    /// A user's attempts, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError>;
}

#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Recompute the user's cumulative stats after an attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn update_user_stats_after_quiz(&self, update: &StatsUpdate) -> Result<(), StorageError>;

    /// Current stats, `None` for a user who never finished a quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_user_stats(&self, user_id: UserId) -> Result<Option<UserStats>, StorageError>;
}

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the subject cannot be stored.
    async fn insert_subject(&self, subject: &Subject) -> Result<(), StorageError>;

    /// Custom subjects created by a user, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_subjects_for_user(&self, user_id: UserId) -> Result<Vec<Subject>, StorageError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be stored.
    async fn insert_document(&self, document: &Document) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_document(&self, id: DocumentId) -> Result<Document, StorageError>;
}

//
// ─── IN-MEMORY ────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    quizzes: HashMap<QuizId, Quiz>,
    questions: Vec<Question>,
    attempts: Vec<AttemptRecord>,
    stats: HashMap<UserId, UserStats>,
    subjects: Vec<Subject>,
    documents: HashMap<DocumentId, Document>,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Stats updates recompute from the stored attempt history, so an update
/// issued for an attempt that was never stored does not count it.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn newest_first(mut quizzes: Vec<Quiz>) -> Vec<Quiz> {
    quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    quizzes
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.quizzes.contains_key(&quiz.id) {
            return Err(StorageError::Conflict);
        }
        guard.quizzes.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, StorageError> {
        let guard = self.lock()?;
        guard.quizzes.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_quizzes_for_user(&self, user_id: UserId) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.lock()?;
        let found = guard
            .quizzes
            .values()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(found))
    }

    async fn list_quizzes_for_subject(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.lock()?;
        let found = guard
            .quizzes
            .values()
            .filter(|q| q.subject_id.as_ref() == Some(subject_id))
            .cloned()
            .collect();
        Ok(newest_first(found))
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.quizzes.remove(&id);
        guard.questions.retain(|q| q.quiz_id() != id);
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_questions(&self, questions: &[Question]) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if questions
            .iter()
            .any(|q| guard.questions.iter().any(|existing| existing.id() == q.id()))
        {
            return Err(StorageError::Conflict);
        }
        guard.questions.extend_from_slice(questions);
        Ok(())
    }

    async fn questions_for_quiz(&self, quiz_id: QuizId) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .iter()
            .filter(|q| q.quiz_id() == quiz_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn create_attempt(&self, attempt: &AttemptRecord) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        match guard.attempts.iter().find(|a| a.id() == attempt.id()) {
            Some(existing) if existing == attempt => Ok(()),
            Some(_) => Err(StorageError::Conflict),
            None => {
                guard.attempts.push(attempt.clone());
                Ok(())
            }
        }
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<AttemptRecord, StorageError> {
        let guard = self.lock()?;
        guard
            .attempts
            .iter()
            .find(|a| a.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts_for_user(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<_> = guard
            .attempts
            .iter()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.completed_at().cmp(&a.completed_at()));
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }
}

#[async_trait]
impl StatsRepository for InMemoryRepository {
    async fn update_user_stats_after_quiz(&self, update: &StatsUpdate) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let history: Vec<_> = guard
            .attempts
            .iter()
            .filter(|a| a.user_id() == update.user_id)
            .cloned()
            .collect();
        let stats = UserStats::from_history(update.user_id, &history, |quiz_id| {
            guard.quizzes.get(&quiz_id).and_then(|q| q.subject_id.clone())
        });
        guard.stats.insert(update.user_id, stats);
        Ok(())
    }

    async fn get_user_stats(&self, user_id: UserId) -> Result<Option<UserStats>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.stats.get(&user_id).cloned())
    }
}

#[async_trait]
impl SubjectRepository for InMemoryRepository {
    async fn insert_subject(&self, subject: &Subject) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.subjects.iter().any(|s| s.id == subject.id) {
            return Err(StorageError::Conflict);
        }
        guard.subjects.push(subject.clone());
        Ok(())
    }

    async fn list_subjects_for_user(&self, user_id: UserId) -> Result<Vec<Subject>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<_> = guard
            .subjects
            .iter()
            .filter(|s| s.user_id == Some(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn insert_document(&self, document: &Document) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.documents.contains_key(&document.id) {
            return Err(StorageError::Conflict);
        }
        guard.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document, StorageError> {
        let guard = self.lock()?;
        guard.documents.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub subjects: Arc<dyn SubjectRepository>,
    pub documents: Arc<dyn DocumentRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one backend value for every repository role.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuizRepository
            + QuestionRepository
            + AttemptRepository
            + StatsRepository
            + SubjectRepository
            + DocumentRepository
            + Clone
            + 'static,
    {
        Self {
            quizzes: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            stats: Arc::new(repo.clone()),
            subjects: Arc::new(repo.clone()),
            documents: Arc::new(repo),
        }
    }
}
