//! Workout session status updates.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Database;
use crate::error::StoreResult;

impl Database {
    /// Set a session's status to `completed`. Returns rows affected (0 when
    /// the session does not exist or belongs to another client).
    pub async fn mark_session_completed(
        &self,
        session_id: Uuid,
        client_id: &str,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE workout_sessions
             SET status = 'completed', completed_at = $3, updated_at = NOW()
             WHERE id = $1 AND client_id = $2::uuid",
        )
        .bind(session_id)
        .bind(client_id)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
