use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};

/// Every multiple-choice question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("expected {expected} options, got {got}")]
    OptionCount { expected: usize, got: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct answer is not one of the options")]
    AnswerNotInOptions,
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as produced by a generator or read from a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub correct_answer: String,
    pub options: Vec<String>,
    pub explanation: Option<String>,
    pub latex: Option<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        correct_answer: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            correct_answer: correct_answer.into(),
            options,
            explanation: None,
            latex: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    #[must_use]
    pub fn with_latex(mut self, latex: impl Into<String>) -> Self {
        self.latex = Some(latex.into());
        self
    }

    /// Run the validation rules without binding the draft to a quiz.
    ///
    /// # Errors
    ///
    /// Same rules as [`QuestionDraft::validate`].
    pub fn check(&self) -> Result<(), QuestionError> {
        check_parts(&self.prompt, &self.correct_answer, &self.options)
    }

    /// Validate the draft and bind it to a quiz.
    ///
    /// The correct answer must match one of the options byte for byte, the
    /// same rule used when scoring a submission.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, the option count is
    /// not [`OPTION_COUNT`], an option is blank, or the correct answer is
    /// missing from the options.
    pub fn validate(self, id: QuestionId, quiz_id: QuizId) -> Result<Question, QuestionError> {
        Question::from_persisted(
            id,
            quiz_id,
            self.prompt,
            self.correct_answer,
            self.options,
            self.explanation,
            self.latex,
        )
    }
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    quiz_id: QuizId,
    prompt: String,
    correct_answer: String,
    options: [String; OPTION_COUNT],
    explanation: Option<String>,
    latex: Option<String>,
}

impl Question {
    /// Rehydrate a question from persisted storage.
    ///
    /// # Errors
    ///
    /// Same rules as [`QuestionDraft::validate`].
    pub fn from_persisted(
        id: QuestionId,
        quiz_id: QuizId,
        prompt: String,
        correct_answer: String,
        options: Vec<String>,
        explanation: Option<String>,
        latex: Option<String>,
    ) -> Result<Self, QuestionError> {
        check_parts(&prompt, &correct_answer, &options)?;
        let options: [String; OPTION_COUNT] = options.try_into().map_err(|rest: Vec<String>| {
            QuestionError::OptionCount {
                expected: OPTION_COUNT,
                got: rest.len(),
            }
        })?;

        Ok(Self {
            id,
            quiz_id,
            prompt,
            correct_answer,
            options,
            explanation: non_blank(explanation),
            latex: non_blank(latex),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn latex(&self) -> Option<&str> {
        self.latex.as_deref()
    }

    /// Exact comparison: no case folding, no whitespace trimming.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

fn check_parts(prompt: &str, correct_answer: &str, options: &[String]) -> Result<(), QuestionError> {
    if prompt.trim().is_empty() {
        return Err(QuestionError::EmptyPrompt);
    }
    if options.len() != OPTION_COUNT {
        return Err(QuestionError::OptionCount {
            expected: OPTION_COUNT,
            got: options.len(),
        });
    }
    if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
        return Err(QuestionError::EmptyOption { index });
    }
    if !options.iter().any(|o| o == correct_answer) {
        return Err(QuestionError::AnswerNotInOptions);
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
