use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{DocumentId, QuizId, SubjectId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title is empty")]
    EmptyTitle,
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

/// Difficulty tag stored as a small integer level.
///
/// Unknown levels map to `Unrated` instead of failing, so a hosted backend
/// that grows new levels does not break listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    #[default]
    Unrated,
}

impl Difficulty {
    #[must_use]
    pub fn from_level(level: i64) -> Self {
        match level {
            1 => Self::Beginner,
            2 => Self::Intermediate,
            3 => Self::Advanced,
            _ => Self::Unrated,
        }
    }

    #[must_use]
    pub fn level(self) -> i64 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
            Self::Unrated => 0,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Unrated => "Unrated",
        }
    }
}

//
// ─── QUIZ ─────────────────────────────────────────────────────────────────────
//

/// Quiz metadata. Read-only for the duration of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    pub description: String,
    pub subject_id: Option<SubjectId>,
    pub user_id: UserId,
    pub document_id: Option<DocumentId>,
    pub total_questions: u32,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// Create a new quiz owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is blank.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        user_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            description: String::new(),
            subject_id: None,
            user_id,
            document_id: None,
            total_questions: 0,
            difficulty: Difficulty::Unrated,
            created_at,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn with_document(mut self, document_id: DocumentId) -> Self {
        self.document_id = Some(document_id);
        self
    }

    #[must_use]
    pub fn with_total_questions(mut self, total: u32) -> Self {
        self.total_questions = total;
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Case-insensitive substring match on title or description.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

//
// ─── FILTERING ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubjectFilter {
    #[default]
    All,
    Only(SubjectId),
}

/// Search box + subject selector applied to a quiz list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizFilter {
    pub query: String,
    pub subject: SubjectFilter,
}

impl QuizFilter {
    #[must_use]
    pub fn new(query: impl Into<String>, subject: SubjectFilter) -> Self {
        Self {
            query: query.into(),
            subject,
        }
    }

    #[must_use]
    pub fn matches(&self, quiz: &Quiz) -> bool {
        let query_ok = self.query.is_empty() || quiz.matches_query(&self.query);
        let subject_ok = match &self.subject {
            SubjectFilter::All => true,
            SubjectFilter::Only(id) => quiz.subject_id.as_ref() == Some(id),
        };
        query_ok && subject_ok
    }

    /// Keep the quizzes that pass the filter, preserving input order.
    #[must_use]
    pub fn apply<'a>(&self, quizzes: &'a [Quiz]) -> Vec<&'a Quiz> {
        quizzes.iter().filter(|q| self.matches(q)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn quiz(n: u128, title: &str, subject: Option<&str>) -> Quiz {
        let mut quiz = Quiz::new(QuizId::from_u128(n), title, UserId::from_u128(1), fixed_now())
            .unwrap()
            .with_description("Chapter notes");
        if let Some(s) = subject {
            quiz = quiz.with_subject(SubjectId::new(s));
        }
        quiz
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = Quiz::new(QuizId::from_u128(1), " ", UserId::from_u128(1), fixed_now())
            .unwrap_err();
        assert_eq!(err, QuizError::EmptyTitle);
    }

    #[test]
    fn difficulty_levels_round_trip_with_fallback() {
        assert_eq!(Difficulty::from_level(2), Difficulty::Intermediate);
        assert_eq!(Difficulty::from_level(2).level(), 2);
        assert_eq!(Difficulty::from_level(9), Difficulty::Unrated);
        assert_eq!(Difficulty::from_level(3).label(), "Advanced");
    }

    #[test]
    fn filter_matches_title_and_description_case_insensitively() {
        let quizzes = vec![
            quiz(1, "Supply and Demand", None),
            quiz(2, "Regression basics", None),
        ];
        let by_title = QuizFilter::new("SUPPLY", SubjectFilter::All);
        assert_eq!(by_title.apply(&quizzes).len(), 1);

        let by_description = QuizFilter::new("chapter", SubjectFilter::All);
        assert_eq!(by_description.apply(&quizzes).len(), 2);
    }

    #[test]
    fn filter_combines_query_and_subject() {
        let quizzes = vec![
            quiz(1, "Elasticity", Some("microeconomics")),
            quiz(2, "Elasticity drills", Some("statistics")),
            quiz(3, "Sampling", Some("statistics")),
        ];
        let filter = QuizFilter::new(
            "elastic",
            SubjectFilter::Only(SubjectId::new("statistics")),
        );
        let hits = filter.apply(&quizzes);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, QuizId::from_u128(2));
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let quizzes = vec![quiz(1, "A", None), quiz(2, "B", Some("english"))];
        assert_eq!(QuizFilter::default().apply(&quizzes).len(), 2);
    }
}
