#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod session;
pub mod time;

pub use error::Error;
pub use session::{Advance, AnswerOutcome, InvalidState, Phase, QuizSession, SessionStartError};
pub use time::Clock;
