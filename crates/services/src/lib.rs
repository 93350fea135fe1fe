#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod context;
pub mod dashboard_service;
pub mod error;
pub mod generation;
pub mod quiz_builder;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use context::UserContext;
pub use dashboard_service::{DashboardOverview, DashboardService};
pub use error::{
    AppServicesError, CatalogError, GenerationError, QuizBuilderError, RecordError, SessionError,
};
pub use generation::{
    GeneratedQuestions, OpenAiConfig, OpenAiQuestionGenerator, QuestionGenerator,
};
pub use quiz_builder::{CreatedQuiz, QuizBuilderService, QuizSource};
pub use sessions::{AdvanceResult, AttemptRecorder, QuizSessionService};
