use std::sync::Arc;

use quiz_core::model::{AttemptId, AttemptRecord, AttemptTally};
use storage::repository::{AttemptRepository, StatsRepository, StatsUpdate, StorageError};

use crate::Clock;
use crate::context::UserContext;
use crate::error::RecordError;

/// Persists a finished session: the attempt row, then the user's
/// cumulative stats.
///
/// Both calls are issued on every recording, even when the first one fails,
/// and neither is retried automatically. Attempt ids are generated here, so
/// a caller re-sending the same record hits the idempotent path of
/// [`AttemptRepository::create_attempt`].
#[derive(Clone)]
pub struct AttemptRecorder {
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl AttemptRecorder {
    #[must_use]
    pub fn new(
        clock: Clock,
        attempts: Arc<dyn AttemptRepository>,
        stats: Arc<dyn StatsRepository>,
    ) -> Self {
        Self {
            clock,
            attempts,
            stats,
        }
    }

    /// Record a completed session for `ctx`'s user.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Attempt`, `RecordError::Stats` or
    /// `RecordError::Both` depending on which calls failed.
    pub async fn record_attempt(
        &self,
        ctx: &UserContext,
        tally: AttemptTally,
    ) -> Result<AttemptRecord, RecordError> {
        let record =
            AttemptRecord::from_tally(AttemptId::generate(), ctx.user_id, tally, self.clock.now())?;

        log::debug!(
            "recording attempt {} on quiz {}: {}/{} in {}s",
            record.id(),
            record.quiz_id(),
            record.score(),
            record.total_questions(),
            record.time_spent_secs()
        );

        let attempt = self.attempts.create_attempt(&record).await;
        let stats = self.update_stats(&record).await;

        match (attempt, stats) {
            (Ok(()), Ok(())) => Ok(record),
            (Err(attempt), Ok(())) => {
                log::error!("failed to store attempt {}: {attempt}", record.id());
                Err(RecordError::Attempt(attempt))
            }
            (Ok(()), Err(source)) => {
                log::error!(
                    "attempt {} stored but stats update failed: {source}",
                    record.id()
                );
                Err(RecordError::Stats {
                    record: Box::new(record),
                    source,
                })
            }
            (Err(attempt), Err(stats)) => {
                log::error!(
                    "failed to store attempt {} ({attempt}) and to update stats ({stats})",
                    record.id()
                );
                Err(RecordError::Both { attempt, stats })
            }
        }
    }

    /// Re-issue only the stats update for an attempt that is already stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stats backend fails again.
    pub async fn retry_stats(&self, record: &AttemptRecord) -> Result<(), StorageError> {
        log::debug!("retrying stats update for attempt {}", record.id());
        self.update_stats(record).await
    }

    async fn update_stats(&self, record: &AttemptRecord) -> Result<(), StorageError> {
        self.stats
            .update_user_stats_after_quiz(&StatsUpdate {
                user_id: record.user_id(),
                quiz_id: record.quiz_id(),
                score: record.score(),
                total_questions: record.total_questions(),
            })
            .await
    }
}
