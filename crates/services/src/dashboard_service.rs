use std::sync::Arc;

use quiz_core::model::{LevelProgress, UserStats};
use storage::repository::StatsRepository;

use crate::context::UserContext;
use crate::error::CatalogError;

/// Everything the dashboard header shows for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub display_name: String,
    pub stats: UserStats,
    pub level: LevelProgress,
    /// Rounded percentages of the most recent attempts, newest first.
    pub recent_scores: Vec<u32>,
}

#[derive(Clone)]
pub struct DashboardService {
    stats: Arc<dyn StatsRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(stats: Arc<dyn StatsRepository>) -> Self {
        Self { stats }
    }

    /// Stats for the user, or the starting values before their first quiz.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if stats cannot be loaded.
    pub async fn overview(&self, ctx: &UserContext) -> Result<DashboardOverview, CatalogError> {
        let stats = self
            .stats
            .get_user_stats(ctx.user_id)
            .await?
            .unwrap_or_else(|| UserStats::empty(ctx.user_id));

        Ok(DashboardOverview {
            display_name: ctx.display_name().to_string(),
            level: stats.level_progress(),
            recent_scores: stats.recent_scores(),
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::UserId;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn new_user_sees_starting_values() {
        let service = DashboardService::new(Arc::new(InMemoryRepository::new()));
        let ctx = UserContext::new(UserId::from_u128(3));

        let overview = service.overview(&ctx).await.unwrap();
        assert_eq!(overview.display_name, "Student");
        assert_eq!(overview.stats.total_quizzes, 0);
        assert_eq!(overview.level.level, 1);
        assert_eq!(overview.level.next_level_xp, 1000);
        assert!(overview.recent_scores.is_empty());
    }
}
