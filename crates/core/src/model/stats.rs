use std::collections::HashMap;

use crate::model::attempt::AttemptRecord;
use crate::model::ids::{QuizId, SubjectId, UserId};

/// XP granted per correct answer.
pub const XP_PER_CORRECT_ANSWER: u32 = 10;
/// XP needed per level; level `n` spans `[(n-1)*1000, n*1000)`.
pub const XP_PER_LEVEL: u32 = 1000;
/// A subject counts as mastered once its attempts average at least this score.
pub const MASTERY_THRESHOLD_PERCENT: f64 = 80.0;
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Cumulative per-user statistics.
///
/// Hosted backends compute these server-side; local backends use
/// [`UserStats::from_history`] so both report the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub user_id: UserId,
    pub total_quizzes: u32,
    /// Mean score percentage across all attempts.
    pub average_score: f64,
    pub subjects_mastered: u32,
    pub current_level: u32,
    pub xp_points: u32,
    /// Most recent attempts first.
    pub recent_activity: Vec<AttemptRecord>,
}

impl UserStats {
    /// Stats for a user with no attempts yet.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            total_quizzes: 0,
            average_score: 0.0,
            subjects_mastered: 0,
            current_level: 1,
            xp_points: 0,
            recent_activity: Vec::new(),
        }
    }

    /// Recompute stats from a user's complete attempt history.
    ///
    /// `subject_of` resolves a quiz to its subject; quizzes without one never
    /// count toward mastery.
    pub fn from_history<F>(user_id: UserId, attempts: &[AttemptRecord], subject_of: F) -> Self
    where
        F: Fn(QuizId) -> Option<SubjectId>,
    {
        if attempts.is_empty() {
            return Self::empty(user_id);
        }

        let total_quizzes = u32::try_from(attempts.len()).unwrap_or(u32::MAX);
        let percent_sum: f64 = attempts.iter().map(AttemptRecord::percent).sum();
        let average_score = percent_sum / attempts.len() as f64;

        let xp_points = attempts.iter().fold(0_u32, |acc, a| {
            acc.saturating_add(a.score().saturating_mul(XP_PER_CORRECT_ANSWER))
        });

        let mut by_subject: HashMap<SubjectId, (f64, u32)> = HashMap::new();
        for attempt in attempts {
            if let Some(subject) = subject_of(attempt.quiz_id()) {
                let entry = by_subject.entry(subject).or_insert((0.0, 0));
                entry.0 += attempt.percent();
                entry.1 += 1;
            }
        }
        let mastered = by_subject
            .values()
            .filter(|(sum, count)| sum / f64::from(*count) >= MASTERY_THRESHOLD_PERCENT)
            .count();

        let mut recent = attempts.to_vec();
        recent.sort_by(|a, b| b.completed_at().cmp(&a.completed_at()));
        recent.truncate(RECENT_ACTIVITY_LIMIT);

        Self {
            user_id,
            total_quizzes,
            average_score,
            subjects_mastered: u32::try_from(mastered).unwrap_or(u32::MAX),
            current_level: level_for_xp(xp_points),
            xp_points,
            recent_activity: recent,
        }
    }

    #[must_use]
    pub fn average_score_rounded(&self) -> u32 {
        round_percent(self.average_score)
    }

    #[must_use]
    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::new(self.current_level, self.xp_points)
    }

    /// Rounded score percentages of the recent attempts, newest first.
    #[must_use]
    pub fn recent_scores(&self) -> Vec<u32> {
        self.recent_activity
            .iter()
            .map(|a| round_percent(a.percent()))
            .collect()
    }
}

#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    1 + xp / XP_PER_LEVEL
}

/// XP bar toward the next level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u32,
    pub next_level_xp: u32,
}

impl LevelProgress {
    #[must_use]
    pub fn new(level: u32, xp: u32) -> Self {
        let level = level.max(1);
        Self {
            level,
            xp,
            next_level_xp: level.saturating_mul(XP_PER_LEVEL),
        }
    }

    /// Progress percentage, capped at 100.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.next_level_xp == 0 {
            return 0.0;
        }
        (f64::from(self.xp) / f64::from(self.next_level_xp) * 100.0).min(100.0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_percent(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}
