//! Goal queries: active goal lookup and weekly workout progress.

use super::Database;
use crate::error::{StoreError, StoreResult};
use crate::store::Goal;

impl Database {
    /// Goals with status `active` for a client.
    pub async fn get_active_goals(&self, client_id: &str) -> StoreResult<Vec<Goal>> {
        let rows = sqlx::query_as::<_, Goal>(
            "SELECT id::text AS id, client_id::text AS client_id, title, status
             FROM goals
             WHERE client_id = $1::uuid AND status = 'active'
             ORDER BY created_at",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Set a goal's `current_value` to the number of workouts the client has
    /// completed since the start of the current week (Monday).
    pub async fn sync_goal_progress(&self, goal_id: &str, client_id: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE goals g
             SET current_value = (
                   SELECT COUNT(*) FROM workout_logs w
                   WHERE w.client_id = g.client_id
                     AND w.completed_at >= date_trunc('week', NOW())
                 ),
                 updated_at = NOW()
             WHERE g.id = $1::uuid AND g.client_id = $2::uuid",
        )
        .bind(goal_id)
        .bind(client_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::new(format!("goal {} not found", goal_id)));
        }
        Ok(())
    }
}
