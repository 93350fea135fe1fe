//! Quiz-taking state machine.
//!
//! A [`QuizSession`] walks a fixed list of questions one at a time:
//!
//! ```text
//!   Answering --submit_answer--> Explaining --advance--> Answering   (more questions)
//!                                Explaining --advance--> Complete    (last question)
//! ```
//!
//! Out-of-phase triggers return [`InvalidState`] and leave the session untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AttemptTally, IncorrectAnswer, Question, QuestionId, QuizId};
use crate::time::elapsed_secs;

//
// ─── PHASE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for an answer to the current question.
    Answering,
    /// Current question answered; showing the result/explanation.
    Explaining,
    /// All questions answered. Terminal.
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Answering => "answering",
            Phase::Explaining => "explaining",
            Phase::Complete => "complete",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SubmitAnswer,
    Advance,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::SubmitAnswer => "submit an answer",
            Operation::Advance => "advance",
        })
    }
}

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// A transition was triggered outside its valid phase.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot {operation} while the session is {phase}")]
pub struct InvalidState {
    pub operation: Operation,
    pub phase: Phase,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStartError {
    #[error("cannot start a session without questions")]
    NoQuestions,

    #[error("question {question_id} does not belong to quiz {expected}")]
    ForeignQuestion {
        question_id: QuestionId,
        expected: QuizId,
    },

    #[error("too many questions for one session: {len}")]
    TooManyQuestions { len: usize },
}

//
// ─── OUTCOMES ─────────────────────────────────────────────────────────────────
//

/// Result of a single accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub correct_answer: String,
}

/// Result of an accepted `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at `index`.
    Next { index: usize },
    /// The last question was resolved; the tally is produced exactly once.
    Complete(AttemptTally),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Rounded percentage of `position` over `total`.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.position as f64 / self.total as f64 * 100.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            pct.clamp(0.0, 100.0) as u32
        }
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// In-memory state of one user's traversal of a quiz.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz_id: QuizId,
    questions: Vec<Question>,
    current: usize,
    selected: Option<String>,
    score: u32,
    incorrect: Vec<IncorrectAnswer>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    phase: Phase,
}

impl QuizSession {
    /// Start a session over `questions`, in the order given.
    ///
    /// # Errors
    ///
    /// Returns `SessionStartError::NoQuestions` for an empty list and
    /// `SessionStartError::ForeignQuestion` if a question belongs to another quiz.
    pub fn new(
        quiz_id: QuizId,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionStartError> {
        if questions.is_empty() {
            return Err(SessionStartError::NoQuestions);
        }
        if u32::try_from(questions.len()).is_err() {
            return Err(SessionStartError::TooManyQuestions {
                len: questions.len(),
            });
        }
        if let Some(q) = questions.iter().find(|q| q.quiz_id() != quiz_id) {
            return Err(SessionStartError::ForeignQuestion {
                question_id: q.id(),
                expected: quiz_id,
            });
        }

        Ok(Self {
            quiz_id,
            questions,
            current: 0,
            selected: None,
            score: 0,
            incorrect: Vec::new(),
            started_at,
            completed_at: None,
            phase: Phase::Answering,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> &[IncorrectAnswer] {
        &self.incorrect
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Number of questions with a resolved answer (correct or logged incorrect).
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.score as usize + self.incorrect.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: self.current + 1,
            total: self.questions.len(),
            answered: self.answered_count(),
            is_complete: self.is_complete(),
        }
    }

    /// Explanation of the current question, only once it has been answered.
    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        if self.phase != Phase::Explaining {
            return None;
        }
        self.current_question().and_then(Question::explanation)
    }

    /// Submit an answer to the current question.
    ///
    /// Correctness is exact string equality with the question's correct answer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the session is not `Answering`, an answer is
    /// already pending, or the current question already has a resolved answer.
    pub fn submit_answer(
        &mut self,
        answer: impl Into<String>,
    ) -> Result<AnswerOutcome, InvalidState> {
        if self.phase != Phase::Answering
            || self.selected.is_some()
            || self.answered_count() != self.current
        {
            return Err(self.invalid(Operation::SubmitAnswer));
        }
        let Some(question) = self.questions.get(self.current) else {
            return Err(self.invalid(Operation::SubmitAnswer));
        };

        let answer = answer.into();
        let is_correct = question.is_correct(&answer);
        let outcome = AnswerOutcome {
            question_id: question.id(),
            is_correct,
            correct_answer: question.correct_answer().to_owned(),
        };

        if is_correct {
            self.score += 1;
        } else {
            self.incorrect.push(IncorrectAnswer {
                question_id: outcome.question_id,
                selected_answer: answer.clone(),
            });
        }
        self.selected = Some(answer);
        self.phase = Phase::Explaining;

        Ok(outcome)
    }

    /// Move past the answered question, or complete the session after the last one.
    ///
    /// `now` is used for the elapsed time on completion.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the session is `Explaining`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, InvalidState> {
        if self.phase != Phase::Explaining {
            return Err(self.invalid(Operation::Advance));
        }

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.selected = None;
            self.phase = Phase::Answering;
            return Ok(Advance::Next {
                index: self.current,
            });
        }

        self.phase = Phase::Complete;
        self.completed_at = Some(now);
        Ok(Advance::Complete(AttemptTally {
            quiz_id: self.quiz_id,
            score: self.score,
            total_questions: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
            time_spent_secs: elapsed_secs(self.started_at, now),
            incorrect_answers: self.incorrect.clone(),
        }))
    }

    fn invalid(&self, operation: Operation) -> InvalidState {
        InvalidState {
            operation,
            phase: self.phase,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;
    use crate::time::fixed_now;
    use chrono::Duration;

    const QUIZ: QuizId = QuizId::from_u128(100);

    fn question(n: u128, correct: &str) -> Question {
        let options = vec![
            correct.to_owned(),
            format!("{correct} (wrong 1)"),
            format!("{correct} (wrong 2)"),
            format!("{correct} (wrong 3)"),
        ];
        QuestionDraft::new(format!("Question {n}?"), correct, options)
            .with_explanation(format!("Because {correct}."))
            .validate(QuestionId::from_u128(n), QUIZ)
            .unwrap()
    }

    fn session(answers: &[&str]) -> QuizSession {
        let questions = answers
            .iter()
            .enumerate()
            .map(|(i, a)| question(i as u128 + 1, a))
            .collect();
        QuizSession::new(QUIZ, questions, fixed_now()).unwrap()
    }

    fn assert_invariants(s: &QuizSession) {
        assert!(s.current_index() < s.total_questions());
        assert!(s.score() as usize <= s.current_index() + 1);
        assert!(s.score() as usize <= s.total_questions());
        if s.phase() != Phase::Answering {
            assert_eq!(s.answered_count(), s.current_index() + 1);
        }
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let err = QuizSession::new(QUIZ, Vec::new(), fixed_now()).unwrap_err();
        assert_eq!(err, SessionStartError::NoQuestions);
    }

    #[test]
    fn question_from_other_quiz_is_rejected() {
        let foreign = QuestionDraft::new("Q", "A", vec!["A".into(), "B".into(), "C".into(), "D".into()])
            .validate(QuestionId::from_u128(7), QuizId::from_u128(999))
            .unwrap();
        let err = QuizSession::new(QUIZ, vec![foreign], fixed_now()).unwrap_err();
        assert!(matches!(err, SessionStartError::ForeignQuestion { .. }));
    }

    #[test]
    fn new_session_starts_answering_at_zero() {
        let s = session(&["Paris"]);
        assert_eq!(s.phase(), Phase::Answering);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.score(), 0);
        assert!(s.selected_answer().is_none());
        assert!(s.incorrect_answers().is_empty());
        assert_invariants(&s);
    }

    #[test]
    fn all_correct_scores_every_question() {
        let answers = ["Paris", "Rome", "Berlin", "Madrid"];
        let mut s = session(&answers);
        let mut tally = None;
        for answer in answers {
            let outcome = s.submit_answer(answer).unwrap();
            assert!(outcome.is_correct);
            assert_invariants(&s);
            if let Advance::Complete(t) = s.advance(fixed_now()).unwrap() {
                tally = Some(t);
            } else {
                assert_invariants(&s);
            }
        }

        let tally = tally.expect("session completes");
        assert_eq!(tally.score, 4);
        assert_eq!(tally.total_questions, 4);
        assert!(tally.incorrect_answers.is_empty());
        assert_eq!(s.phase(), Phase::Complete);
    }

    #[test]
    fn mixed_answers_log_only_the_wrong_one() {
        let mut s = session(&["Paris", "Rome", "Berlin"]);

        s.submit_answer("Paris").unwrap();
        s.advance(fixed_now()).unwrap();
        let outcome = s.submit_answer("Milan").unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(outcome.correct_answer, "Rome");
        s.advance(fixed_now()).unwrap();
        s.submit_answer("Berlin").unwrap();

        let Advance::Complete(tally) = s.advance(fixed_now()).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(tally.score, 2);
        assert_eq!(
            tally.incorrect_answers,
            vec![IncorrectAnswer {
                question_id: QuestionId::from_u128(2),
                selected_answer: "Milan".into(),
            }]
        );
    }

    #[test]
    fn comparison_is_case_and_whitespace_sensitive() {
        let mut s = session(&["Paris", "Rome"]);
        assert!(!s.submit_answer("Paris ").unwrap().is_correct);
        s.advance(fixed_now()).unwrap();
        assert!(!s.submit_answer("rome").unwrap().is_correct);
        assert_eq!(s.score(), 0);
        assert_eq!(s.incorrect_answers().len(), 2);
        assert_eq!(s.incorrect_answers()[0].selected_answer, "Paris ");
    }

    #[test]
    fn double_submit_is_rejected_without_double_counting() {
        let mut s = session(&["Paris", "Rome"]);
        s.submit_answer("Paris").unwrap();

        let err = s.submit_answer("Paris").unwrap_err();
        assert_eq!(
            err,
            InvalidState {
                operation: Operation::SubmitAnswer,
                phase: Phase::Explaining,
            }
        );
        assert_eq!(s.score(), 1);
        assert_eq!(s.selected_answer(), Some("Paris"));
        assert_invariants(&s);
    }

    #[test]
    fn advance_before_answer_is_rejected() {
        let mut s = session(&["Paris", "Rome"]);
        let err = s.advance(fixed_now()).unwrap_err();
        assert_eq!(err.operation, Operation::Advance);
        assert_eq!(err.phase, Phase::Answering);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.phase(), Phase::Answering);
    }

    #[test]
    fn advance_clears_selection() {
        let mut s = session(&["Paris", "Rome"]);
        s.submit_answer("Lyon").unwrap();
        assert_eq!(s.advance(fixed_now()).unwrap(), Advance::Next { index: 1 });
        assert!(s.selected_answer().is_none());
        assert_eq!(s.phase(), Phase::Answering);
    }

    #[test]
    fn complete_is_terminal() {
        let mut s = session(&["Paris"]);
        s.submit_answer("Paris").unwrap();
        assert!(matches!(s.advance(fixed_now()).unwrap(), Advance::Complete(_)));

        assert!(s.advance(fixed_now()).is_err());
        assert!(s.submit_answer("Paris").is_err());
        assert_eq!(s.score(), 1);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn completion_reports_rounded_elapsed_time() {
        let mut s = session(&["Paris"]);
        s.submit_answer("Paris").unwrap();
        let done_at = fixed_now() + Duration::milliseconds(61_600);
        let Advance::Complete(tally) = s.advance(done_at).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(tally.time_spent_secs, 62);
        assert_eq!(s.completed_at(), Some(done_at));
    }

    #[test]
    fn explanation_is_revealed_only_after_answering() {
        let mut s = session(&["Paris"]);
        assert_eq!(s.explanation(), None);
        s.submit_answer("Nice").unwrap();
        assert_eq!(s.explanation(), Some("Because Paris."));
    }

    #[test]
    fn progress_tracks_position() {
        let mut s = session(&["A", "B", "C", "D"]);
        assert_eq!(s.progress().percent(), 25);
        s.submit_answer("A").unwrap();
        s.advance(fixed_now()).unwrap();
        let p = s.progress();
        assert_eq!(p.position, 2);
        assert_eq!(p.answered, 1);
        assert_eq!(p.percent(), 50);
    }
}
