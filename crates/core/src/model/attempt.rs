use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{AttemptId, QuestionId, QuizId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("{incorrect} incorrect answers logged for {total} questions")]
    TooManyIncorrect { incorrect: usize, total: u32 },
}

/// One wrong submission, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectAnswer {
    pub question_id: QuestionId,
    pub selected_answer: String,
}

/// Final tally handed from a completed session to the attempt recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptTally {
    pub quiz_id: QuizId,
    pub score: u32,
    pub total_questions: u32,
    pub time_spent_secs: u32,
    pub incorrect_answers: Vec<IncorrectAnswer>,
}

impl AttemptTally {
    /// Score as a percentage of total questions; 0 for an empty tally.
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.score, self.total_questions)
    }
}

/// Persisted outcome of one completed session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    id: AttemptId,
    quiz_id: QuizId,
    user_id: UserId,
    score: u32,
    total_questions: u32,
    time_spent_secs: u32,
    completed_at: DateTime<Utc>,
    incorrect_answers: Vec<IncorrectAnswer>,
}

impl AttemptRecord {
    /// Build a record for `user_id` from a session tally.
    ///
    /// `completed_at` is truncated to microseconds, the finest precision the
    /// storage backends keep, so a stored record reads back equal.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` when the tally is internally inconsistent.
    pub fn from_tally(
        id: AttemptId,
        user_id: UserId,
        tally: AttemptTally,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        Self::from_persisted(
            id,
            tally.quiz_id,
            user_id,
            tally.score,
            tally.total_questions,
            tally.time_spent_secs,
            completed_at.trunc_subsecs(6),
            tally.incorrect_answers,
        )
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` when score or incorrect count exceed the total.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: AttemptId,
        quiz_id: QuizId,
        user_id: UserId,
        score: u32,
        total_questions: u32,
        time_spent_secs: u32,
        completed_at: DateTime<Utc>,
        incorrect_answers: Vec<IncorrectAnswer>,
    ) -> Result<Self, AttemptError> {
        if score > total_questions {
            return Err(AttemptError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }
        if incorrect_answers.len() > total_questions as usize {
            return Err(AttemptError::TooManyIncorrect {
                incorrect: incorrect_answers.len(),
                total: total_questions,
            });
        }

        Ok(Self {
            id,
            quiz_id,
            user_id,
            score,
            total_questions,
            time_spent_secs,
            completed_at,
            incorrect_answers,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u32 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> &[IncorrectAnswer] {
        &self.incorrect_answers
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.score, self.total_questions)
    }
}

pub(crate) fn percent(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn tally(score: u32, total: u32, incorrect: usize) -> AttemptTally {
        AttemptTally {
            quiz_id: QuizId::from_u128(1),
            score,
            total_questions: total,
            time_spent_secs: 42,
            incorrect_answers: (0..incorrect)
                .map(|i| IncorrectAnswer {
                    question_id: QuestionId::from_u128(i as u128),
                    selected_answer: format!("wrong {i}"),
                })
                .collect(),
        }
    }

    #[test]
    fn completion_time_is_kept_to_microseconds() {
        let at = fixed_now() + chrono::Duration::nanoseconds(1_234_567);
        let rec = AttemptRecord::from_tally(
            AttemptId::from_u128(9),
            UserId::from_u128(2),
            tally(1, 1, 0),
            at,
        )
        .unwrap();
        assert_eq!(
            rec.completed_at(),
            fixed_now() + chrono::Duration::microseconds(1_234)
        );
    }

    #[test]
    fn record_from_tally_keeps_fields() {
        let rec = AttemptRecord::from_tally(
            AttemptId::from_u128(9),
            UserId::from_u128(2),
            tally(3, 4, 1),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(rec.score(), 3);
        assert_eq!(rec.total_questions(), 4);
        assert_eq!(rec.time_spent_secs(), 42);
        assert_eq!(rec.incorrect_answers().len(), 1);
        assert_eq!(rec.percent(), 75.0);
    }

    #[test]
    fn score_above_total_is_rejected() {
        let err = AttemptRecord::from_tally(
            AttemptId::from_u128(9),
            UserId::from_u128(2),
            tally(5, 4, 0),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::ScoreExceedsTotal { score: 5, total: 4 });
    }

    #[test]
    fn too_many_incorrect_is_rejected() {
        let err = AttemptRecord::from_tally(
            AttemptId::from_u128(9),
            UserId::from_u128(2),
            tally(0, 2, 3),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, AttemptError::TooManyIncorrect { incorrect: 3, .. }));
    }

    #[test]
    fn percent_of_empty_tally_is_zero() {
        assert_eq!(tally(0, 0, 0).percent(), 0.0);
    }
}
