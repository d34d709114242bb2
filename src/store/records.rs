//! Row and result types exchanged with the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One instance of a client performing a workout (`workout_logs`).
///
/// Totals stay `None` until the log is finalized. The program linkage columns
/// are owned by the program scheduler and are never written here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkoutLog {
    pub id: String,
    pub client_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub program_assignment_id: Option<String>,
    pub program_schedule_id: Option<String>,
    pub sets_completed: Option<i32>,
    pub reps_completed: Option<i32>,
    pub total_weight_lifted: Option<f64>,
    pub duration_minutes: Option<i32>,
}

/// One completed set (`workout_set_logs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SetLog {
    pub id: String,
    pub workout_log_id: String,
    pub client_id: String,
    pub exercise_id: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Values written onto a workout log when it is completed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Finalization {
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub sets_completed: i64,
    pub reps_completed: i64,
    pub total_weight_lifted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: String,
    pub client_id: String,
    pub title: String,
    pub status: String,
}

/// Result returned by `advance_program_progress`.
///
/// `status` is kept as the raw string so it can be echoed back verbatim;
/// see [`crate::completion::progression`] for how it is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressionResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub current_week_index: Option<i64>,
    #[serde(default)]
    pub current_day_index: Option<i64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    /// Machine error code when `status` is `"error"`.
    #[serde(default, alias = "error_code")]
    pub code: Option<String>,
}
