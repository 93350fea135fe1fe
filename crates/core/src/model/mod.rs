mod attempt;
mod document;
mod ids;
mod question;
mod quiz;
mod stats;
mod subject;

pub use ids::{AttemptId, DocumentId, ParseIdError, QuestionId, QuizId, SubjectId, UserId};

pub use attempt::{AttemptError, AttemptRecord, AttemptTally, IncorrectAnswer};
pub use document::{Document, DocumentError};
pub use question::{OPTION_COUNT, Question, QuestionDraft, QuestionError};
pub use quiz::{Difficulty, Quiz, QuizError, QuizFilter, SubjectFilter};
pub use stats::{
    LevelProgress, MASTERY_THRESHOLD_PERCENT, RECENT_ACTIVITY_LIMIT, UserStats, XP_PER_CORRECT_ANSWER,
    XP_PER_LEVEL, level_for_xp,
};
pub use subject::{Subject, SubjectColor, SubjectError, SubjectIcon, default_subjects};
