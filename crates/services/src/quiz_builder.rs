use std::sync::Arc;

use quiz_core::model::{Document, DocumentId, Question, QuestionId, Quiz, QuizId, SubjectId};
use storage::repository::{DocumentRepository, QuestionRepository, QuizRepository};

use crate::Clock;
use crate::context::UserContext;
use crate::error::QuizBuilderError;
use crate::generation::{DEFAULT_QUESTION_COUNT, QuestionGenerator};

/// Study material submitted for quiz generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSource {
    pub file_name: String,
    pub content: String,
    pub subject_id: Option<SubjectId>,
}

impl QuizSource {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            subject_id: None,
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }
}

/// A freshly generated quiz and its stored questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedQuiz {
    pub document_id: DocumentId,
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

/// Turns uploaded study material into a stored quiz.
#[derive(Clone)]
pub struct QuizBuilderService {
    clock: Clock,
    documents: Arc<dyn DocumentRepository>,
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    generator: Arc<dyn QuestionGenerator>,
    question_count: usize,
}

impl QuizBuilderService {
    #[must_use]
    pub fn new(
        clock: Clock,
        documents: Arc<dyn DocumentRepository>,
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        Self {
            clock,
            documents,
            quizzes,
            questions,
            generator,
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }

    #[must_use]
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count.max(1);
        self
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Store the document, generate questions from it and create the quiz.
    ///
    /// The quiz is titled `Quiz - <file name>`. Nothing but the document is
    /// written when generation fails, and a quiz whose questions cannot be
    /// stored is removed again.
    ///
    /// # Errors
    ///
    /// Returns `QuizBuilderError::Domain` for blank input,
    /// `QuizBuilderError::Generation` when no usable questions come back and
    /// `QuizBuilderError::Storage` for persistence failures.
    pub async fn create_quiz(
        &self,
        ctx: &UserContext,
        source: QuizSource,
    ) -> Result<CreatedQuiz, QuizBuilderError> {
        let now = self.clock.now();
        let document = Document::new(
            DocumentId::generate(),
            ctx.user_id,
            source.file_name.clone(),
            source.content,
            now,
        )
        .map_err(quiz_core::Error::from)?;
        self.documents.insert_document(&document).await?;

        let generated = self
            .generator
            .generate(&document.content, self.question_count)
            .await?;

        let quiz_id = QuizId::generate();
        let questions = generated
            .questions
            .into_iter()
            .map(|draft| draft.validate(QuestionId::generate(), quiz_id))
            .collect::<Result<Vec<_>, _>>()?;
        let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);

        let mut quiz = Quiz::new(quiz_id, format!("Quiz - {}", source.file_name), ctx.user_id, now)
            .map_err(quiz_core::Error::from)?
            .with_document(document.id)
            .with_total_questions(total);
        if let Some(subject_id) = source.subject_id {
            quiz = quiz.with_subject(subject_id);
        }

        self.quizzes.insert_quiz(&quiz).await?;
        if let Err(err) = self.questions.insert_questions(&questions).await {
            log::error!("failed to store questions for quiz {}: {err}", quiz.id);
            if let Err(cleanup) = self.quizzes.delete_quiz(quiz.id).await {
                log::error!("quiz {} left without questions: {cleanup}", quiz.id);
            }
            return Err(err.into());
        }
        log::info!(
            "created quiz {} with {} questions from {}",
            quiz.id,
            questions.len(),
            source.file_name
        );

        Ok(CreatedQuiz {
            document_id: document.id,
            quiz,
            questions,
        })
    }
}
