//! Workout log and set log queries.
//!
//! UUID columns are read back as text and bound as text with an explicit
//! `::uuid` cast, so malformed ids surface as store errors rather than
//! decode panics.

use super::Database;
use crate::error::StoreResult;
use crate::store::{Finalization, SetLog, WorkoutLog};

const WORKOUT_LOG_COLUMNS: &str = "id::text AS id, client_id::text AS client_id,
    started_at, completed_at,
    program_assignment_id::text AS program_assignment_id,
    program_schedule_id::text AS program_schedule_id,
    sets_completed, reps_completed,
    total_weight_lifted::FLOAT8 AS total_weight_lifted,
    duration_minutes";

impl Database {
    /// Look up a workout log owned by `client_id`.
    pub async fn get_workout_log(
        &self,
        log_id: &str,
        client_id: &str,
    ) -> StoreResult<Option<WorkoutLog>> {
        let sql = format!(
            "SELECT {} FROM workout_logs WHERE id = $1::uuid AND client_id = $2::uuid",
            WORKOUT_LOG_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkoutLog>(&sql)
            .bind(log_id)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Set logs of one workout log, filtered by both log id and client id.
    pub async fn get_set_logs(&self, log_id: &str, client_id: &str) -> StoreResult<Vec<SetLog>> {
        let rows = sqlx::query_as::<_, SetLog>(
            "SELECT id::text AS id, workout_log_id::text AS workout_log_id,
                    client_id::text AS client_id, exercise_id::text AS exercise_id,
                    weight::FLOAT8 AS weight, reps, completed_at
             FROM workout_set_logs
             WHERE workout_log_id = $1::uuid AND client_id = $2::uuid
             ORDER BY completed_at NULLS LAST, id",
        )
        .bind(log_id)
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Write completion time, duration and totals. Matches on id only; the
    /// program linkage columns are left untouched.
    pub async fn update_workout_log_totals(
        &self,
        log_id: &str,
        finalization: &Finalization,
    ) -> StoreResult<WorkoutLog> {
        let sql = format!(
            "UPDATE workout_logs
             SET completed_at = $2,
                 duration_minutes = $3::int,
                 sets_completed = $4::int,
                 reps_completed = $5::int,
                 total_weight_lifted = $6::numeric,
                 updated_at = NOW()
             WHERE id = $1::uuid
             RETURNING {}",
            WORKOUT_LOG_COLUMNS
        );
        let row = sqlx::query_as::<_, WorkoutLog>(&sql)
            .bind(log_id)
            .bind(finalization.completed_at)
            .bind(finalization.duration_minutes)
            .bind(finalization.sets_completed)
            .bind(finalization.reps_completed)
            .bind(finalization.total_weight_lifted)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }
}
