use std::env;

use quiz_core::model::UserId;

pub const DEFAULT_DISPLAY_NAME: &str = "Student";

/// The signed-in user, resolved once at the composition root and passed
/// explicitly to every service that acts on their behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: UserId,
    display_name: Option<String>,
}

impl UserContext {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display_name = (!name.trim().is_empty()).then_some(name);
        self
    }

    /// Reads `QUIZ_USER_ID` and `QUIZ_USER_NAME`. Returns `None` when no
    /// valid user id is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let user_id = env::var("QUIZ_USER_ID").ok()?.parse::<UserId>().ok()?;
        let ctx = Self::new(user_id);
        Some(match env::var("QUIZ_USER_NAME") {
            Ok(name) => ctx.with_display_name(name),
            Err(_) => ctx,
        })
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_default() {
        let ctx = UserContext::new(UserId::from_u128(1));
        assert_eq!(ctx.display_name(), "Student");
        assert_eq!(ctx.clone().with_display_name("  ").display_name(), "Student");
        assert_eq!(ctx.with_display_name("Ada").display_name(), "Ada");
    }
}
