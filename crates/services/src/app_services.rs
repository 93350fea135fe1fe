use std::env;
use std::sync::Arc;

use storage::repository::Storage;
use storage::supabase::SupabaseConfig;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::dashboard_service::DashboardService;
use crate::error::AppServicesError;
use crate::generation::{DEFAULT_QUESTION_COUNT, OpenAiQuestionGenerator, QuestionGenerator};
use crate::quiz_builder::QuizBuilderService;
use crate::sessions::{AttemptRecorder, QuizSessionService};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    generation_enabled: bool,
    catalog: Arc<CatalogService>,
    dashboard: Arc<DashboardService>,
    sessions: Arc<QuizSessionService>,
    quiz_builder: Arc<QuizBuilderService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_env(storage, clock))
    }

    /// Build services backed by a Supabase project.
    #[must_use]
    pub fn new_supabase(config: SupabaseConfig, clock: Clock) -> Self {
        Self::from_env(Storage::supabase(config), clock)
    }

    /// Wire services over `storage`, reading generator settings from the
    /// environment.
    #[must_use]
    pub fn from_env(storage: Storage, clock: Clock) -> Self {
        let generator = OpenAiQuestionGenerator::from_env();
        let enabled = generator.enabled();
        Self::new(storage, clock, Arc::new(generator), enabled)
            .with_question_count(question_count_from_env())
    }

    #[must_use]
    pub fn new(
        storage: Storage,
        clock: Clock,
        generator: Arc<dyn QuestionGenerator>,
        generation_enabled: bool,
    ) -> Self {
        let recorder = AttemptRecorder::new(
            clock,
            Arc::clone(&storage.attempts),
            Arc::clone(&storage.stats),
        );
        let sessions = Arc::new(QuizSessionService::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.questions),
            recorder,
        ));
        let quiz_builder = Arc::new(QuizBuilderService::new(
            clock,
            Arc::clone(&storage.documents),
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.questions),
            generator,
        ));
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.subjects),
            Arc::clone(&storage.quizzes),
        ));
        let dashboard = Arc::new(DashboardService::new(Arc::clone(&storage.stats)));

        Self {
            generation_enabled,
            catalog,
            dashboard,
            sessions,
            quiz_builder,
        }
    }

    #[must_use]
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.quiz_builder = Arc::new((*self.quiz_builder).clone().with_question_count(count));
        self
    }

    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.sessions = Arc::new((*self.sessions).clone().with_shuffle_questions(shuffle));
        self
    }

    #[must_use]
    pub fn generation_enabled(&self) -> bool {
        self.generation_enabled
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn quiz_builder(&self) -> Arc<QuizBuilderService> {
        Arc::clone(&self.quiz_builder)
    }
}

fn question_count_from_env() -> usize {
    env::var("QUIZ_QUESTION_COUNT")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|count| *count > 0)
        .unwrap_or(DEFAULT_QUESTION_COUNT)
}
