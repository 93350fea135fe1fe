use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::{AttemptRecord, AttemptTally, Quiz, QuizId};
use quiz_core::{Advance, AnswerOutcome, QuizSession, SessionStartError};
use storage::repository::{QuestionRepository, QuizRepository};

use super::recorder::AttemptRecorder;
use crate::Clock;
use crate::context::UserContext;
use crate::error::{RecordError, SessionError};

/// Result of advancing past an explained question.
#[derive(Debug)]
pub enum AdvanceResult {
    /// Moved on to the question at `index`.
    Next { index: usize },
    /// The session finished. `record` carries the recorder outcome; the
    /// session stays complete whatever it says.
    Completed {
        tally: AttemptTally,
        record: Result<AttemptRecord, RecordError>,
    },
}

/// Orchestrates session start, answering and attempt recording.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    recorder: AttemptRecorder,
    shuffle_questions: bool,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        recorder: AttemptRecorder,
    ) -> Self {
        Self {
            clock,
            quizzes,
            questions,
            recorder,
            shuffle_questions: false,
        }
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn recorder(&self) -> &AttemptRecorder {
        &self.recorder
    }

    /// Load a quiz with its questions and start a session over them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Load` if the quiz or its questions cannot be
    /// fetched and `SessionError::Empty` if the quiz has no questions.
    pub async fn start_session(&self, quiz_id: QuizId) -> Result<(Quiz, QuizSession), SessionError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await
            .map_err(SessionError::Load)?;
        let mut questions = self
            .questions
            .questions_for_quiz(quiz_id)
            .await
            .map_err(SessionError::Load)?;

        if questions.is_empty() {
            log::warn!("quiz {quiz_id} has no questions");
            return Err(SessionError::Empty);
        }
        if self.shuffle_questions {
            questions.as_mut_slice().shuffle(&mut rng());
        }

        let session = match QuizSession::new(quiz_id, questions, self.clock.now()) {
            Ok(session) => session,
            Err(SessionStartError::NoQuestions) => return Err(SessionError::Empty),
            Err(err) => return Err(err.into()),
        };
        log::debug!(
            "started session on quiz {quiz_id} with {} questions",
            session.total_questions()
        );
        Ok((quiz, session))
    }

    /// Submit an answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if the session is not waiting
    /// for an answer; the session is left unchanged.
    pub fn submit_answer(
        &self,
        session: &mut QuizSession,
        answer: impl Into<String>,
    ) -> Result<AnswerOutcome, SessionError> {
        session.submit_answer(answer).map_err(|err| {
            log::warn!("ignored answer on quiz {}: {err}", session.quiz_id());
            SessionError::InvalidState(err)
        })
    }

    /// Move past the explained question. Finishing the last question
    /// records the attempt exactly once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidState` if no answer is being explained;
    /// the session is left unchanged. Recording failures are reported in
    /// `AdvanceResult::Completed` instead.
    pub async fn advance(
        &self,
        ctx: &UserContext,
        session: &mut QuizSession,
    ) -> Result<AdvanceResult, SessionError> {
        let advance = session.advance(self.clock.now()).map_err(|err| {
            log::warn!("ignored advance on quiz {}: {err}", session.quiz_id());
            SessionError::InvalidState(err)
        })?;

        match advance {
            Advance::Next { index } => Ok(AdvanceResult::Next { index }),
            Advance::Complete(tally) => {
                let record = self.recorder.record_attempt(ctx, tally.clone()).await;
                Ok(AdvanceResult::Completed { tally, record })
            }
        }
    }
}
