use thiserror::Error;

use crate::model::{AttemptError, DocumentError, QuestionError, QuizError, SubjectError};
use crate::session::{InvalidState, SessionStartError};

/// Umbrella error for callers that handle any domain validation failure the same way.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Subject(#[from] SubjectError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    SessionStart(#[from] SessionStartError),
    #[error(transparent)]
    InvalidState(#[from] InvalidState),
}
