use std::io::{self, BufRead, Write};

use quiz_core::QuizSession;
use quiz_core::model::{OPTION_COUNT, QuizId};
use services::{AdvanceResult, QuizSessionService, UserContext};

#[derive(Debug)]
pub enum TakeError {
    Session(services::SessionError),
    Io(io::Error),
    InputClosed,
}

impl std::fmt::Display for TakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TakeError::Session(err) => write!(f, "{err}"),
            TakeError::Io(err) => write!(f, "io error: {err}"),
            TakeError::InputClosed => write!(f, "input closed before the quiz finished"),
        }
    }
}

impl std::error::Error for TakeError {}

impl From<services::SessionError> for TakeError {
    fn from(err: services::SessionError) -> Self {
        TakeError::Session(err)
    }
}

impl From<io::Error> for TakeError {
    fn from(err: io::Error) -> Self {
        TakeError::Io(err)
    }
}

/// Map a typed line to an answer: `1`..`4` pick an option, anything else is
/// taken as the answer text. Blank lines pick nothing.
pub fn choose_answer(line: &str, options: &[String; OPTION_COUNT]) -> Option<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    match line.trim().parse::<usize>() {
        Ok(n) if (1..=OPTION_COUNT).contains(&n) => Some(options[n - 1].clone()),
        _ => Some(line.to_string()),
    }
}

fn read_line(input: &mut impl BufRead) -> Result<String, TakeError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(TakeError::InputClosed);
    }
    Ok(line)
}

fn show_question(session: &QuizSession, out: &mut impl Write) -> io::Result<()> {
    let Some(question) = session.current_question() else {
        return Ok(());
    };
    let progress = session.progress();
    writeln!(
        out,
        "\nQuestion {} of {} ({}%)",
        progress.position,
        progress.total,
        progress.percent()
    )?;
    writeln!(out, "{}", question.prompt())?;
    if let Some(latex) = question.latex() {
        writeln!(out, "  {latex}")?;
    }
    for (i, option) in question.options().iter().enumerate() {
        writeln!(out, "  {}. {option}", i + 1)?;
    }
    write!(out, "> ")?;
    out.flush()
}

/// Take a quiz on a line-based terminal, recording the attempt at the end.
pub async fn run(
    sessions: &QuizSessionService,
    ctx: &UserContext,
    quiz_id: QuizId,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), TakeError> {
    let (quiz, mut session) = sessions.start_session(quiz_id).await?;
    writeln!(out, "{}", quiz.title)?;

    loop {
        show_question(&session, out)?;
        let answer = loop {
            let line = read_line(input)?;
            let options = match session.current_question() {
                Some(question) => question.options().clone(),
                None => return Ok(()),
            };
            if let Some(answer) = choose_answer(&line, &options) {
                break answer;
            }
            write!(out, "> ")?;
            out.flush()?;
        };

        let outcome = sessions.submit_answer(&mut session, answer)?;
        if outcome.is_correct {
            writeln!(out, "Correct!")?;
        } else {
            writeln!(out, "Incorrect. The answer is: {}", outcome.correct_answer)?;
        }
        if let Some(explanation) = session.explanation() {
            writeln!(out, "{explanation}")?;
        }
        write!(out, "Press Enter to continue")?;
        out.flush()?;
        read_line(input)?;

        match sessions.advance(ctx, &mut session).await? {
            AdvanceResult::Next { .. } => {}
            AdvanceResult::Completed { tally, record } => {
                writeln!(
                    out,
                    "\nQuiz complete: {}/{} ({:.0}%) in {}s",
                    tally.score,
                    tally.total_questions,
                    tally.percent(),
                    tally.time_spent_secs
                )?;
                match record {
                    Ok(record) => writeln!(out, "Saved attempt {}", record.id())?,
                    Err(err) => {
                        writeln!(out, "Could not save results: {err}")?;
                        if let Some(stored) = err.stored_record() {
                            write!(out, "Your attempt was saved. Retry the stats update? [y/N] ")?;
                            out.flush()?;
                            let reply = read_line(input)?;
                            if !reply.trim().eq_ignore_ascii_case("y") {
                                return Ok(());
                            }
                            match sessions.recorder().retry_stats(stored).await {
                                Ok(()) => writeln!(out, "Stats updated on retry")?,
                                Err(err) => log::error!("stats retry failed: {err}"),
                            }
                        }
                    }
                }
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use quiz_core::model::{Question, QuestionDraft, QuestionId, Quiz, UserId};
    use quiz_core::time::{fixed_clock, fixed_now};
    use services::AttemptRecorder;
    use storage::repository::{
        InMemoryRepository, QuestionRepository, QuizRepository, StatsRepository,
    };

    fn options() -> [String; OPTION_COUNT] {
        ["Supply", "Demand", "Price", "Cost"].map(String::from)
    }

    #[test]
    fn numbers_pick_options_and_text_is_kept() {
        let options = options();
        assert_eq!(choose_answer("2\n", &options).as_deref(), Some("Demand"));
        assert_eq!(choose_answer("Price\r\n", &options).as_deref(), Some("Price"));
        assert_eq!(choose_answer("5\n", &options).as_deref(), Some("5"));
        assert_eq!(choose_answer("  \n", &options), None);
    }

    #[tokio::test]
    async fn answers_from_input_are_scored_and_recorded() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::from_u128(1);
        let quiz = Quiz::new(QuizId::from_u128(5), "Quiz - notes.txt", user, fixed_now())
            .unwrap()
            .with_total_questions(2);
        repo.insert_quiz(&quiz).await.unwrap();
        let prompts = ["What shifts right when income rises?", "What clears the market?"];
        let questions: Vec<Question> = prompts
            .iter()
            .enumerate()
            .map(|(i, prompt)| {
                let correct = if i == 0 { "Demand" } else { "Price" };
                QuestionDraft::new(*prompt, correct, options().to_vec())
                    .with_explanation("Basic market model.")
                    .validate(QuestionId::from_u128(10 + i as u128), quiz.id)
                    .unwrap()
            })
            .collect();
        repo.insert_questions(&questions).await.unwrap();

        let recorder = AttemptRecorder::new(fixed_clock(), repo.clone(), repo.clone());
        let sessions = QuizSessionService::new(fixed_clock(), repo.clone(), repo.clone(), recorder);
        let ctx = UserContext::new(user);

        let mut input = Cursor::new("\n2\n\nSupply\n\n");
        let mut out = Vec::new();
        run(&sessions, &ctx, quiz.id, &mut input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Correct!"));
        assert!(text.contains("Incorrect. The answer is: Price"));
        assert!(text.contains("Quiz complete: 1/2 (50%)"));

        let stats = repo.get_user_stats(user).await.unwrap().unwrap();
        assert_eq!(stats.total_quizzes, 1);
    }

    #[tokio::test]
    async fn closed_input_stops_the_quiz() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = UserId::from_u128(1);
        let quiz = Quiz::new(QuizId::from_u128(6), "Quiz - a.txt", user, fixed_now()).unwrap();
        repo.insert_quiz(&quiz).await.unwrap();
        let question = QuestionDraft::new("Pick one", "Cost", options().to_vec())
            .validate(QuestionId::from_u128(20), quiz.id)
            .unwrap();
        repo.insert_questions(&[question]).await.unwrap();

        let recorder = AttemptRecorder::new(fixed_clock(), repo.clone(), repo.clone());
        let sessions = QuizSessionService::new(fixed_clock(), repo.clone(), repo.clone(), recorder);

        let mut input = Cursor::new("");
        let mut out = Vec::new();
        let err = run(&sessions, &UserContext::new(user), quiz.id, &mut input, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, TakeError::InputClosed));
    }
}
