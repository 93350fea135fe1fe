//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AttemptError, AttemptRecord, QuestionError};
use quiz_core::{InvalidState, SessionStartError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by question generators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("question generation is not configured")]
    Disabled,
    #[error("question generator returned an empty response")]
    EmptyResponse,
    #[error("question generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question generator returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("question generator produced no usable questions")]
    NoQuestions,
    #[error("question generator produced {got} of {requested} questions")]
    Short { got: usize, requested: usize },
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz has no questions")]
    Empty,
    #[error("failed to load quiz: {0}")]
    Load(#[source] StorageError),
    #[error(transparent)]
    Start(#[from] SessionStartError),
    #[error(transparent)]
    InvalidState(#[from] InvalidState),
}

/// Failure of one or both calls made when recording an attempt.
///
/// The calls are independent: the stats update is issued even when the
/// attempt insert failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    #[error("attempt could not be built: {0}")]
    Invalid(#[from] AttemptError),
    #[error("failed to store attempt: {0}")]
    Attempt(#[source] StorageError),
    #[error("attempt {} stored but stats update failed: {source}", .record.id())]
    Stats {
        record: Box<AttemptRecord>,
        #[source]
        source: StorageError,
    },
    #[error("failed to store attempt ({attempt}) and to update stats ({stats})")]
    Both {
        attempt: StorageError,
        stats: StorageError,
    },
}

impl RecordError {
    /// Whether the attempt row is known to be persisted.
    #[must_use]
    pub fn attempt_stored(&self) -> bool {
        matches!(self, RecordError::Stats { .. })
    }

    /// The stored record when only the stats update failed; pass it to
    /// `AttemptRecorder::retry_stats`.
    #[must_use]
    pub fn stored_record(&self) -> Option<&AttemptRecord> {
        match self {
            RecordError::Stats { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Errors emitted by `QuizBuilderService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizBuilderError {
    #[error(transparent)]
    Domain(#[from] quiz_core::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<QuestionError> for QuizBuilderError {
    fn from(err: QuestionError) -> Self {
        Self::Domain(err.into())
    }
}

/// Errors emitted by `CatalogService` and `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] quiz_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
