mod recorder;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::{RecordError, SessionError};
pub use recorder::AttemptRecorder;
pub use workflow::{AdvanceResult, QuizSessionService};
