//! # Database: PostgreSQL Storage Layer
//!
//! Async database operations for workout tracking over `sqlx::PgPool`,
//! connected to Supabase PostgreSQL with the service-role credentials.
//!
//! ## Access contexts
//!
//! The pool connects as a privileged role, so plain queries bypass row-level
//! security: this is the elevated context used for every read and write of
//! the completion workflow. The one exception is
//! [`Database::advance_program_progress`], which impersonates the calling user
//! inside its own transaction (JWT claims plus `SET LOCAL ROLE authenticated`)
//! so the procedure's policies and `completed_by` check see the real caller.
//!
//! ## Schema
//!
//! - `workout_logs`: one row per workout instance, totals filled on completion
//! - `workout_set_logs`: individual sets (weight × reps) per workout log
//! - `workout_sessions`: optional session wrapper with a status
//! - `goals`: client goals with `current_value` progress
//! - `achievements` / `client_achievements`: thresholds and unlocks
//!
//! ## Module Structure
//!
//! - [`workout_logs`]: log lookup, set logs, finalization
//! - [`sessions`]: session status updates
//! - [`goals`]: active goal lookup and progress sync
//! - [`achievements`]: achievement metrics and unlocks
//! - [`progression`]: user-scoped `advance_program_progress` call

mod achievements;
mod goals;
mod progression;
mod sessions;
mod workout_logs;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::achievements::AchievementCategory;
use crate::auth::AuthUser;
use crate::error::StoreResult;
use crate::store::{
    AchievementService, Finalization, Goal, GoalSync, ProgressionResult, ProgressionService,
    SetLog, WorkoutLog, WorkoutStore,
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL using the provided database URL.
    ///
    /// The URL is parsed by hand so the username keeps its ".project-ref"
    /// suffix, which the Supabase pooler needs and sqlx's own parser drops.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let url = url::Url::parse(database_url)?;
        let username = urlencoding::decode(url.username())?.into_owned();
        let password = url
            .password()
            .map(|p| urlencoding::decode(p).map(|s| s.into_owned()))
            .transpose()?;
        let mut opts = PgConnectOptions::new()
            .host(url.host_str().unwrap_or("localhost"))
            .port(url.port().unwrap_or(5432))
            .database(url.path().trim_start_matches('/'))
            .username(&username)
            .statement_cache_capacity(0);
        if let Some(ref pw) = password {
            opts = opts.password(pw);
        }
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(opts)
            .await?;
        Ok(Database { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check: execute `SELECT 1` to verify database connectivity.
    ///
    /// Used by the `/readyz` readiness probe and the `check` subcommand.
    pub async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WorkoutStore for Database {
    async fn health_check(&self) -> StoreResult<()> {
        self.ping().await
    }

    async fn fetch_workout_log(
        &self,
        log_id: &str,
        client_id: &str,
    ) -> StoreResult<Option<WorkoutLog>> {
        self.get_workout_log(log_id, client_id).await
    }

    async fn fetch_set_logs(&self, log_id: &str, client_id: &str) -> StoreResult<Vec<SetLog>> {
        self.get_set_logs(log_id, client_id).await
    }

    async fn finalize_workout_log(
        &self,
        log_id: &str,
        finalization: &Finalization,
    ) -> StoreResult<WorkoutLog> {
        self.update_workout_log_totals(log_id, finalization).await
    }

    async fn complete_session(
        &self,
        session_id: Uuid,
        client_id: &str,
        completed_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        self.mark_session_completed(session_id, client_id, completed_at)
            .await
    }

    async fn active_goals(&self, client_id: &str) -> StoreResult<Vec<Goal>> {
        self.get_active_goals(client_id).await
    }
}

#[async_trait]
impl ProgressionService for Database {
    async fn advance(
        &self,
        caller: &AuthUser,
        client_id: &str,
        completed_by: &str,
        notes: Option<&str>,
    ) -> StoreResult<ProgressionResult> {
        self.advance_program_progress(caller, client_id, completed_by, notes)
            .await
    }
}

#[async_trait]
impl GoalSync for Database {
    async fn sync_goal(&self, goal_id: &str, client_id: &str) -> StoreResult<()> {
        self.sync_goal_progress(goal_id, client_id).await
    }
}

#[async_trait]
impl AchievementService for Database {
    async fn check_and_unlock(
        &self,
        client_id: &str,
        category: AchievementCategory,
    ) -> StoreResult<Vec<String>> {
        let metric = self.achievement_metric(client_id, category).await?;
        self.unlock_achievements(client_id, category, metric).await
    }
}
