//! # Store: Collaborator Interfaces
//!
//! The completion workflow talks to four collaborators, each behind an async
//! trait so the PostgreSQL implementation ([`crate::db::Database`]) and the
//! in-memory fakes used in tests are interchangeable:
//!
//! - [`WorkoutStore`]: reads and writes workout rows with the elevated
//!   (service-role) context, bypassing row-level security.
//! - [`ProgressionService`]: advances the program cursor through the
//!   user-scoped context, so the procedure's own authorization check sees the
//!   real caller.
//! - [`GoalSync`] and [`AchievementService`]: best-effort gamification hooks.
//!
//! [`Collaborators`] bundles one of each and is handed to the workflow
//! explicitly; nothing here is a process-wide singleton.

mod records;

pub use records::{Finalization, Goal, ProgressionResult, SetLog, WorkoutLog};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::achievements::AchievementCategory;
use crate::auth::AuthUser;
use crate::db::Database;
use crate::error::StoreResult;

/// Workout rows, accessed with elevated privileges.
#[async_trait]
pub trait WorkoutStore: Send + Sync + 'static {
    /// Cheap connectivity probe for readiness checks.
    async fn health_check(&self) -> StoreResult<()>;

    /// Fetch the log matching both `log_id` and `client_id`.
    async fn fetch_workout_log(
        &self,
        log_id: &str,
        client_id: &str,
    ) -> StoreResult<Option<WorkoutLog>>;

    /// All set logs with this `workout_log_id` and `client_id`.
    async fn fetch_set_logs(&self, log_id: &str, client_id: &str) -> StoreResult<Vec<SetLog>>;

    /// Write completion timestamp, duration and totals; returns the updated row.
    async fn finalize_workout_log(
        &self,
        log_id: &str,
        finalization: &Finalization,
    ) -> StoreResult<WorkoutLog>;

    /// Mark a workout session completed. Returns the number of rows updated.
    async fn complete_session(
        &self,
        session_id: Uuid,
        client_id: &str,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// The client's goals with status `active`.
    async fn active_goals(&self, client_id: &str) -> StoreResult<Vec<Goal>>;
}

/// Atomic program-cursor advancement, executed as the calling user.
#[async_trait]
pub trait ProgressionService: Send + Sync + 'static {
    async fn advance(
        &self,
        caller: &AuthUser,
        client_id: &str,
        completed_by: &str,
        notes: Option<&str>,
    ) -> StoreResult<ProgressionResult>;
}

/// Recomputes a goal's progress from the client's activity.
#[async_trait]
pub trait GoalSync: Send + Sync + 'static {
    async fn sync_goal(&self, goal_id: &str, client_id: &str) -> StoreResult<()>;
}

/// Evaluates achievement thresholds and records newly unlocked ones.
#[async_trait]
pub trait AchievementService: Send + Sync + 'static {
    /// Returns the names of achievements unlocked by this call.
    async fn check_and_unlock(
        &self,
        client_id: &str,
        category: AchievementCategory,
    ) -> StoreResult<Vec<String>>;
}

/// Everything the completion workflow needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn WorkoutStore>,
    pub progression: Arc<dyn ProgressionService>,
    pub goals: Arc<dyn GoalSync>,
    pub achievements: Arc<dyn AchievementService>,
}

impl Collaborators {
    /// Back every collaborator with the same PostgreSQL pool.
    pub fn from_database(db: Database) -> Self {
        let db = Arc::new(db);
        Collaborators {
            store: db.clone(),
            progression: db.clone(),
            goals: db.clone(),
            achievements: db,
        }
    }
}
