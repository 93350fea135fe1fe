//! Multiple-choice question generation from study material.

use async_trait::async_trait;
use quiz_core::model::QuestionDraft;

use crate::error::GenerationError;

mod openai;
mod parse;

pub use openai::{OpenAiConfig, OpenAiQuestionGenerator};
pub use parse::parse_questions;

/// Number of questions requested when nothing else is configured.
pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Validated drafts returned by a generator, at most `requested` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuestions {
    pub questions: Vec<QuestionDraft>,
    pub requested: usize,
}

impl GeneratedQuestions {
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.questions.len() < self.requested
    }
}

/// Accept a short result with a warning, or refuse it when `strict`.
///
/// # Errors
///
/// Returns `GenerationError::Short` for a short result in strict mode.
pub fn enforce_count(
    generated: GeneratedQuestions,
    strict: bool,
) -> Result<GeneratedQuestions, GenerationError> {
    if !generated.is_short() {
        return Ok(generated);
    }
    if strict {
        return Err(GenerationError::Short {
            got: generated.questions.len(),
            requested: generated.requested,
        });
    }
    log::warn!(
        "generator returned {} of {} requested questions",
        generated.questions.len(),
        generated.requested
    );
    Ok(generated)
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generate up to `count` questions about `text`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the backend fails or returns nothing
    /// usable.
    async fn generate(&self, text: &str, count: usize)
    -> Result<GeneratedQuestions, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(got: usize, requested: usize) -> GeneratedQuestions {
        let questions = (0..got)
            .map(|n| {
                QuestionDraft::new(
                    format!("Question {n}"),
                    "A",
                    vec!["A".into(), "B".into(), "C".into(), "D".into()],
                )
            })
            .collect();
        GeneratedQuestions {
            questions,
            requested,
        }
    }

    #[test]
    fn strict_mode_refuses_a_short_result() {
        let err = enforce_count(generated(2, 5), true).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Short {
                got: 2,
                requested: 5
            }
        ));
    }

    #[test]
    fn lenient_mode_keeps_a_short_result() {
        let kept = enforce_count(generated(2, 5), false).unwrap();
        assert_eq!(kept.questions.len(), 2);
        assert!(kept.is_short());
    }

    #[test]
    fn full_results_pass_either_way() {
        assert_eq!(enforce_count(generated(3, 3), true).unwrap().questions.len(), 3);
        assert_eq!(enforce_count(generated(3, 3), false).unwrap().questions.len(), 3);
    }
}
