//! Achievement metrics and unlocks.
//!
//! Thresholds live in `achievements` (one row per badge, keyed by category);
//! unlocks in `client_achievements` with a unique `(client_id, achievement_id)`
//! pair, so re-checking is idempotent.

use chrono::{NaiveDate, Utc};

use super::Database;
use crate::achievements::{streak_weeks, AchievementCategory};
use crate::error::StoreResult;

impl Database {
    /// Current value of the metric a category is measured against.
    pub async fn achievement_metric(
        &self,
        client_id: &str,
        category: AchievementCategory,
    ) -> StoreResult<i64> {
        match category {
            AchievementCategory::WorkoutCount => {
                let count = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM workout_logs
                     WHERE client_id = $1::uuid AND completed_at IS NOT NULL",
                )
                .bind(client_id)
                .fetch_one(&self.pool)
                .await?;
                Ok(count)
            }
            AchievementCategory::StreakWeeks => {
                let weeks = sqlx::query_scalar::<_, NaiveDate>(
                    "SELECT DISTINCT date_trunc('week', completed_at)::date
                     FROM workout_logs
                     WHERE client_id = $1::uuid AND completed_at IS NOT NULL",
                )
                .bind(client_id)
                .fetch_all(&self.pool)
                .await?;
                Ok(streak_weeks(&weeks, Utc::now().date_naive()) as i64)
            }
        }
    }

    /// Record every achievement in `category` whose threshold `metric` meets.
    /// Returns the names of achievements unlocked by this call.
    pub async fn unlock_achievements(
        &self,
        client_id: &str,
        category: AchievementCategory,
        metric: i64,
    ) -> StoreResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "WITH unlocked AS (
                 INSERT INTO client_achievements (client_id, achievement_id)
                 SELECT $1::uuid, a.id FROM achievements a
                 WHERE a.category = $2 AND a.threshold <= $3
                 ON CONFLICT (client_id, achievement_id) DO NOTHING
                 RETURNING achievement_id
             )
             SELECT a.name FROM achievements a
             JOIN unlocked u ON u.achievement_id = a.id
             ORDER BY a.threshold",
        )
        .bind(client_id)
        .bind(category.as_str())
        .bind(metric)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}
