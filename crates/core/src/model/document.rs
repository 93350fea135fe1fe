use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{DocumentId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("document title is empty")]
    EmptyTitle,

    #[error("document has no text content")]
    EmptyContent,
}

/// Uploaded study material, already reduced to plain text by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// # Errors
    ///
    /// Returns `DocumentError` if the title or content is blank.
    pub fn new(
        id: DocumentId,
        user_id: UserId,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DocumentError> {
        let title = title.into();
        let content = content.into();
        if title.trim().is_empty() {
            return Err(DocumentError::EmptyTitle);
        }
        if content.trim().is_empty() {
            return Err(DocumentError::EmptyContent);
        }
        Ok(Self {
            id,
            user_id,
            title,
            content,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn blank_content_is_rejected() {
        let err = Document::new(
            DocumentId::from_u128(1),
            UserId::from_u128(1),
            "notes.txt",
            "\n\t ",
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, DocumentError::EmptyContent);
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = Document::new(
            DocumentId::from_u128(1),
            UserId::from_u128(1),
            "",
            "text",
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, DocumentError::EmptyTitle);
    }
}
