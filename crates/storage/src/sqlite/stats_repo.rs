use std::collections::HashMap;

use chrono::Utc;
use quiz_core::model::{QuizId, RECENT_ACTIVITY_LIMIT, SubjectId, UserId, UserStats};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row, parse_id, ser, u32_from_i64};
use crate::repository::{AttemptRepository, StatsRepository, StatsUpdate, StorageError};

#[async_trait::async_trait]
impl StatsRepository for SqliteRepository {
    async fn update_user_stats_after_quiz(&self, update: &StatsUpdate) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let rows = sqlx::query(
            r"
                SELECT
                    a.id, a.quiz_id, a.user_id, a.score, a.total_questions,
                    a.time_spent, a.completed_at, a.incorrect_answers,
                    q.subject_id AS subject_id
                FROM quiz_attempts a
                LEFT JOIN quizzes q ON q.id = a.quiz_id
                WHERE a.user_id = ?1
            ",
        )
        .bind(update.user_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .map_err(conn)?;

        let mut history = Vec::with_capacity(rows.len());
        let mut subjects: HashMap<QuizId, SubjectId> = HashMap::new();
        for row in &rows {
            let attempt = map_attempt_row(row)?;
            let subject: Option<String> = row.try_get("subject_id").map_err(ser)?;
            if let Some(raw) = subject {
                subjects.insert(attempt.quiz_id(), parse_id("subject_id", &raw)?);
            }
            history.push(attempt);
        }

        let stats = UserStats::from_history(update.user_id, &history, |quiz_id| {
            subjects.get(&quiz_id).cloned()
        });

        sqlx::query(
            r"
                INSERT INTO user_stats (
                    user_id, total_quizzes, average_score, subjects_mastered,
                    current_level, xp_points, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(user_id) DO UPDATE SET
                    total_quizzes = excluded.total_quizzes,
                    average_score = excluded.average_score,
                    subjects_mastered = excluded.subjects_mastered,
                    current_level = excluded.current_level,
                    xp_points = excluded.xp_points,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(update.user_id.to_string())
        .bind(i64::from(stats.total_quizzes))
        .bind(stats.average_score)
        .bind(i64::from(stats.subjects_mastered))
        .bind(i64::from(stats.current_level))
        .bind(i64::from(stats.xp_points))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        log::debug!(
            "recomputed stats for {} after quiz {}: {} attempts, {} xp",
            update.user_id,
            update.quiz_id,
            stats.total_quizzes,
            stats.xp_points
        );
        Ok(())
    }

    async fn get_user_stats(&self, user_id: UserId) -> Result<Option<UserStats>, StorageError> {
        let Some(row) = sqlx::query(
            r"
                SELECT
                    total_quizzes, average_score, subjects_mastered,
                    current_level, xp_points
                FROM user_stats
                WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        else {
            return Ok(None);
        };

        let limit = u32::try_from(RECENT_ACTIVITY_LIMIT).unwrap_or(u32::MAX);
        let recent_activity = self.list_attempts_for_user(user_id, limit).await?;

        Ok(Some(UserStats {
            user_id,
            total_quizzes: u32_from_i64(
                "total_quizzes",
                row.try_get::<i64, _>("total_quizzes").map_err(ser)?,
            )?,
            average_score: row.try_get("average_score").map_err(ser)?,
            subjects_mastered: u32_from_i64(
                "subjects_mastered",
                row.try_get::<i64, _>("subjects_mastered").map_err(ser)?,
            )?,
            current_level: u32_from_i64(
                "current_level",
                row.try_get::<i64, _>("current_level").map_err(ser)?,
            )?,
            xp_points: u32_from_i64("xp_points", row.try_get::<i64, _>("xp_points").map_err(ser)?)?,
            recent_activity,
        }))
    }
}
