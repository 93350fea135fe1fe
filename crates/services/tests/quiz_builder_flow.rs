use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use quiz_core::model::{Question, QuestionDraft, QuizId, SubjectId, UserId};
use quiz_core::time::fixed_now;
use services::generation::parse_questions;
use services::{
    AdvanceResult, AppServices, Clock, GeneratedQuestions, GenerationError, QuestionGenerator,
    QuizBuilderError, QuizBuilderService, QuizSource, UserContext,
};
use storage::repository::{
    DocumentRepository, InMemoryRepository, QuestionRepository, QuizRepository, Storage,
    StorageError,
};

/// Replays a fixed chat reply through the real response parser.
struct CannedGenerator {
    reply: String,
    seen: Mutex<Vec<(String, usize)>>,
}

impl CannedGenerator {
    fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QuestionGenerator for CannedGenerator {
    async fn generate(
        &self,
        text: &str,
        count: usize,
    ) -> Result<GeneratedQuestions, GenerationError> {
        self.seen.lock().unwrap().push((text.to_string(), count));
        parse_questions(&self.reply, count)
    }
}

fn reply(items: usize) -> String {
    let questions: Vec<_> = (1..=items)
        .map(|n| {
            format!(
                r#"{{"question":"What is {n}?","correct_answer":"{n}","options":["{n}","x","y","z"]}}"#
            )
        })
        .collect();
    format!("```json\n{{\"questions\":[{}]}}\n```", questions.join(","))
}

fn app(repo: &InMemoryRepository, generator: Arc<CannedGenerator>) -> AppServices {
    AppServices::new(
        Storage::from_repository(repo.clone()),
        Clock::fixed(fixed_now()),
        generator,
        true,
    )
}

fn ctx() -> UserContext {
    UserContext::new(UserId::from_u128(42))
}

#[tokio::test]
async fn builds_quiz_from_document_and_takes_it() {
    let repo = InMemoryRepository::new();
    let generator = Arc::new(CannedGenerator::new(reply(4)));
    let app = app(&repo, generator.clone()).with_question_count(3);
    let ctx = ctx();

    let created = app
        .quiz_builder()
        .create_quiz(
            &ctx,
            QuizSource::new("numbers.txt", "One, two, three.")
                .with_subject(SubjectId::new("economic-calculations")),
        )
        .await
        .unwrap();

    assert_eq!(
        generator.seen.lock().unwrap().as_slice(),
        &[("One, two, three.".to_string(), 3)]
    );
    assert_eq!(created.quiz.title, "Quiz - numbers.txt");
    assert_eq!(created.quiz.total_questions, 3);
    assert_eq!(created.quiz.document_id, Some(created.document_id));
    assert_eq!(created.questions.len(), 3);

    let doc = repo.get_document(created.document_id).await.unwrap();
    assert_eq!(doc.title, "numbers.txt");
    assert_eq!(repo.get_quiz(created.quiz.id).await.unwrap(), created.quiz);

    let sessions = app.sessions();
    let (_quiz, mut session) = sessions.start_session(created.quiz.id).await.unwrap();
    let mut last = None;
    while !session.is_complete() {
        let answer = session.current_question().unwrap().correct_answer().to_string();
        sessions.submit_answer(&mut session, answer).unwrap();
        last = Some(sessions.advance(&ctx, &mut session).await.unwrap());
    }
    let Some(AdvanceResult::Completed { tally, record }) = last else {
        panic!("expected completion");
    };
    assert_eq!(tally.score, 3);
    assert!(record.is_ok());

    let overview = app.dashboard().overview(&ctx).await.unwrap();
    assert_eq!(overview.stats.xp_points, 30);
    assert_eq!(overview.recent_scores, vec![100]);
    assert_eq!(overview.stats.subjects_mastered, 1);
}

#[tokio::test]
async fn empty_generation_creates_no_quiz() {
    let repo = InMemoryRepository::new();
    let generator = Arc::new(CannedGenerator::new(r#"{"questions":[]}"#));
    let app = app(&repo, generator);
    let ctx = ctx();

    let err = app
        .quiz_builder()
        .create_quiz(&ctx, QuizSource::new("blank.txt", "Nothing to ask."))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QuizBuilderError::Generation(GenerationError::NoQuestions)
    ));
    assert!(repo.list_quizzes_for_user(ctx.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_document_is_rejected_before_generation() {
    let repo = InMemoryRepository::new();
    let generator = Arc::new(CannedGenerator::new(reply(1)));
    let app = app(&repo, generator.clone());

    let err = app
        .quiz_builder()
        .create_quiz(&ctx(), QuizSource::new("empty.txt", "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizBuilderError::Domain(_)));
    assert!(generator.seen.lock().unwrap().is_empty());
}

/// Question store that is down for writes.
struct UnwritableQuestions;

#[async_trait]
impl QuestionRepository for UnwritableQuestions {
    async fn insert_questions(&self, _questions: &[Question]) -> Result<(), StorageError> {
        Err(StorageError::Connection("down".into()))
    }

    async fn questions_for_quiz(&self, _quiz_id: QuizId) -> Result<Vec<Question>, StorageError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn quiz_is_removed_when_its_questions_cannot_be_stored() {
    let repo = Arc::new(InMemoryRepository::new());
    let builder = QuizBuilderService::new(
        Clock::fixed(fixed_now()),
        repo.clone(),
        repo.clone(),
        Arc::new(UnwritableQuestions),
        Arc::new(CannedGenerator::new(reply(1))),
    );
    let ctx = ctx();

    let err = builder
        .create_quiz(&ctx, QuizSource::new("notes.txt", "Supply and demand."))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QuizBuilderError::Storage(StorageError::Connection(ref msg)) if msg == "down"
    ));
    assert!(repo.list_quizzes_for_user(ctx.user_id).await.unwrap().is_empty());
}

#[test]
fn drafts_from_the_parser_are_valid() {
    let parsed = parse_questions(&reply(2), 5).unwrap();
    assert!(parsed.is_short());
    assert!(parsed.questions.iter().all(|q: &QuestionDraft| q.check().is_ok()));
}
