//! Shared test helpers for integration tests.
//!
//! Two kinds of fixtures live here:
//!
//! - An in-memory [`FakeBackend`] implementing every collaborator trait, so
//!   the HTTP surface and the completion workflow can be exercised without a
//!   database.
//! - PostgreSQL helpers (migrations, truncation) for tests gated on
//!   `TEST_DATABASE_URL`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;

use coachhub::achievements::AchievementCategory;
use coachhub::api::{build_router, AppState};
use coachhub::auth::{AuthConfig, AuthUser};
use coachhub::completion::Dispatch;
use coachhub::error::{StoreError, StoreResult};
use coachhub::store::{
    AchievementService, Collaborators, Finalization, Goal, GoalSync, ProgressionResult,
    ProgressionService, SetLog, WorkoutLog, WorkoutStore,
};

pub const JWT_SECRET: &str = "test-jwt-secret-at-least-32-bytes-long";
pub const CLIENT_ID: &str = "11111111-1111-4111-8111-111111111111";
pub const OTHER_CLIENT_ID: &str = "22222222-2222-4222-8222-222222222222";
pub const LOG_ID: &str = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
pub const OTHER_LOG_ID: &str = "bbbbbbbb-bbbb-4bbb-8bbb-bbbbbbbbbbbb";
pub const ASSIGNMENT_ID: &str = "cccccccc-cccc-4ccc-8ccc-cccccccccccc";
pub const SCHEDULE_ID: &str = "dddddddd-dddd-4ddd-8ddd-dddddddddddd";
pub const SESSION_ID: &str = "eeeeeeee-eeee-4eee-8eee-eeeeeeeeeeee";

// == Tokens ====================================================================

/// Sign a Supabase-style access token for `sub`, expiring `expires_in` seconds
/// from now (negative for an already-expired token).
pub fn mint_token(sub: &str, expires_in: i64) -> String {
    let claims = serde_json::json!({
        "sub": sub,
        "aud": "authenticated",
        "role": "authenticated",
        "exp": Utc::now().timestamp() + expires_in,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn caller(sub: &str) -> AuthUser {
    AuthConfig::new(Some(JWT_SECRET.to_string()))
        .decode_token(&mint_token(sub, 3600))
        .unwrap()
}

// == Row builders ==============================================================

pub fn workout_log(id: &str, client_id: &str, started_at: Option<DateTime<Utc>>) -> WorkoutLog {
    WorkoutLog {
        id: id.to_string(),
        client_id: client_id.to_string(),
        started_at,
        completed_at: None,
        program_assignment_id: Some(ASSIGNMENT_ID.to_string()),
        program_schedule_id: Some(SCHEDULE_ID.to_string()),
        sets_completed: None,
        reps_completed: None,
        total_weight_lifted: None,
        duration_minutes: None,
    }
}

pub fn set_log(
    log_id: &str,
    client_id: &str,
    weight: Option<f64>,
    reps: Option<i32>,
) -> SetLog {
    SetLog {
        id: Uuid::new_v4().to_string(),
        workout_log_id: log_id.to_string(),
        client_id: client_id.to_string(),
        exercise_id: None,
        weight,
        reps,
        completed_at: Some(Utc::now()),
    }
}

pub fn goal(title: &str) -> Goal {
    Goal {
        id: Uuid::new_v4().to_string(),
        client_id: CLIENT_ID.to_string(),
        title: title.to_string(),
        status: "active".to_string(),
    }
}

pub fn progression(status: &str, week: i64, day: i64) -> ProgressionResult {
    ProgressionResult {
        status: Some(status.to_string()),
        message: Some(format!("Advanced to week {}, day {}", week, day)),
        current_week_index: Some(week),
        current_day_index: Some(day),
        is_completed: Some(false),
        code: None,
    }
}

// == In-memory backend =========================================================

/// Mutable state behind [`FakeBackend`]. Tests seed rows and toggle failures
/// here, then inspect what the workflow wrote.
pub struct FakeState {
    pub logs: Vec<WorkoutLog>,
    pub sets: Vec<SetLog>,
    /// Existing sessions as `(id, client_id)`.
    pub sessions: Vec<(Uuid, String)>,
    pub completed_sessions: Vec<Uuid>,
    pub goals: Vec<Goal>,
    pub synced_goals: Vec<String>,
    pub achievement_checks: Vec<AchievementCategory>,
    pub finalized: Vec<(String, Finalization)>,
    /// `(caller, client_id, completed_by)` for every progression call.
    pub progression_calls: Vec<(String, String, String)>,
    pub progression: Result<ProgressionResult, StoreError>,
    pub healthy: bool,
    pub fail_log_fetch: bool,
    pub fail_set_fetch: bool,
    pub fail_finalize: bool,
    pub fail_session_update: bool,
    pub fail_goal_sync: bool,
    pub fail_achievements: bool,
    pub panic_achievements: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        FakeState {
            logs: Vec::new(),
            sets: Vec::new(),
            sessions: Vec::new(),
            completed_sessions: Vec::new(),
            goals: Vec::new(),
            synced_goals: Vec::new(),
            achievement_checks: Vec::new(),
            finalized: Vec::new(),
            progression_calls: Vec::new(),
            progression: Ok(progression("advanced", 2, 1)),
            healthy: true,
            fail_log_fetch: false,
            fail_set_fetch: false,
            fail_finalize: false,
            fail_session_update: false,
            fail_goal_sync: false,
            fail_achievements: false,
            panic_achievements: false,
        }
    }
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeBackend::default())
    }

    /// Backend seeded with one in-progress log for [`CLIENT_ID`] started 45
    /// minutes ago, then customized by `seed`.
    pub fn seeded(seed: impl FnOnce(&mut FakeState)) -> Arc<Self> {
        let backend = FakeBackend::default();
        {
            let mut state = backend.state();
            state.logs.push(workout_log(
                LOG_ID,
                CLIENT_ID,
                Some(Utc::now() - Duration::minutes(45)),
            ));
            seed(&mut state);
        }
        Arc::new(backend)
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            store: self.clone(),
            progression: self.clone(),
            goals: self.clone(),
            achievements: self.clone(),
        }
    }
}

fn backend_error(message: &str) -> StoreError {
    StoreError {
        message: message.to_string(),
        code: Some("42501".to_string()),
        hint: Some("check grants".to_string()),
    }
}

#[async_trait]
impl WorkoutStore for FakeBackend {
    async fn health_check(&self) -> StoreResult<()> {
        if self.state().healthy {
            Ok(())
        } else {
            Err(StoreError::new("connection refused"))
        }
    }

    async fn fetch_workout_log(
        &self,
        log_id: &str,
        client_id: &str,
    ) -> StoreResult<Option<WorkoutLog>> {
        let state = self.state();
        if state.fail_log_fetch {
            return Err(backend_error("relation workout_logs is unavailable"));
        }
        Ok(state
            .logs
            .iter()
            .find(|l| l.id == log_id && l.client_id == client_id)
            .cloned())
    }

    async fn fetch_set_logs(&self, log_id: &str, client_id: &str) -> StoreResult<Vec<SetLog>> {
        let state = self.state();
        if state.fail_set_fetch {
            return Err(backend_error("permission denied for table workout_set_logs"));
        }
        Ok(state
            .sets
            .iter()
            .filter(|s| s.workout_log_id == log_id && s.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn finalize_workout_log(
        &self,
        log_id: &str,
        finalization: &Finalization,
    ) -> StoreResult<WorkoutLog> {
        let mut state = self.state();
        if state.fail_finalize {
            return Err(backend_error("permission denied for table workout_logs"));
        }
        state.finalized.push((log_id.to_string(), *finalization));
        let log = state
            .logs
            .iter_mut()
            .find(|l| l.id == log_id)
            .ok_or_else(|| StoreError::new("no rows returned"))?;
        log.completed_at = Some(finalization.completed_at);
        log.duration_minutes = Some(finalization.duration_minutes as i32);
        log.sets_completed = Some(finalization.sets_completed as i32);
        log.reps_completed = Some(finalization.reps_completed as i32);
        log.total_weight_lifted = Some(finalization.total_weight_lifted);
        Ok(log.clone())
    }

    async fn complete_session(
        &self,
        session_id: Uuid,
        client_id: &str,
        _completed_at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut state = self.state();
        if state.fail_session_update {
            return Err(backend_error("workout_sessions is locked"));
        }
        let exists = state
            .sessions
            .iter()
            .any(|(id, client)| *id == session_id && client == client_id);
        if !exists {
            return Ok(0);
        }
        state.completed_sessions.push(session_id);
        Ok(1)
    }

    async fn active_goals(&self, client_id: &str) -> StoreResult<Vec<Goal>> {
        Ok(self
            .state()
            .goals
            .iter()
            .filter(|g| g.client_id == client_id && g.status == "active")
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProgressionService for FakeBackend {
    async fn advance(
        &self,
        caller: &AuthUser,
        client_id: &str,
        completed_by: &str,
        _notes: Option<&str>,
    ) -> StoreResult<ProgressionResult> {
        let mut state = self.state();
        state.progression_calls.push((
            caller.user_id.clone(),
            client_id.to_string(),
            completed_by.to_string(),
        ));
        state.progression.clone()
    }
}

#[async_trait]
impl GoalSync for FakeBackend {
    async fn sync_goal(&self, goal_id: &str, _client_id: &str) -> StoreResult<()> {
        let mut state = self.state();
        if state.fail_goal_sync {
            return Err(StoreError::new("goal sync unavailable"));
        }
        state.synced_goals.push(goal_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl AchievementService for FakeBackend {
    async fn check_and_unlock(
        &self,
        _client_id: &str,
        category: AchievementCategory,
    ) -> StoreResult<Vec<String>> {
        let (fail, panic) = {
            let mut state = self.state();
            state.achievement_checks.push(category);
            (state.fail_achievements, state.panic_achievements)
        };
        if panic {
            panic!("achievement evaluator crashed");
        }
        if fail {
            return Err(StoreError::new("achievements table missing"));
        }
        Ok(Vec::new())
    }
}

/// Router wired to `backend`, verifying tokens with [`JWT_SECRET`] and
/// running side effects inline.
pub fn build_fake_app(backend: &Arc<FakeBackend>) -> axum::Router {
    let state = AppState::new(
        backend.collaborators(),
        AuthConfig::new(Some(JWT_SECRET.to_string())),
        Dispatch::Inline,
    );
    build_router(state)
}

// == PostgreSQL ================================================================

/// Returns the test database URL from the `TEST_DATABASE_URL` environment variable.
/// Panics if the variable is not set.
pub fn test_db_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests")
}

/// Returns true if the test database URL is configured.
pub fn has_test_db() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

/// One-time schema initialization.
static SCHEMA_INIT: tokio::sync::OnceCell<()> = tokio::sync::OnceCell::const_new();

/// Ensure the test database schema is set up (runs migrations once per test suite).
pub async fn ensure_schema() {
    SCHEMA_INIT
        .get_or_init(|| async {
            let pool = sqlx::PgPool::connect(&test_db_url()).await.unwrap();
            run_migrations(&pool).await;
            // The user-scoped context switches to `authenticated`; superusers
            // can always do so, plain test users need membership.
            sqlx::raw_sql("GRANT authenticated TO CURRENT_USER")
                .execute(&pool)
                .await
                .ok();
            pool.close().await;
        })
        .await;
}

/// Connect to the test database (also ensures schema is set up).
pub async fn setup_test_db() -> coachhub::db::Database {
    ensure_schema().await;
    let db = coachhub::db::Database::connect(&test_db_url(), 2)
        .await
        .expect("Failed to connect to test database");
    truncate_all_tables(db.pool()).await;
    db
}

/// Truncate all tables to ensure test isolation. Achievement definitions are
/// reference data and survive.
pub async fn truncate_all_tables(pool: &sqlx::PgPool) {
    sqlx::raw_sql(
        "TRUNCATE TABLE workout_set_logs, workout_logs, workout_sessions, goals,
                       client_achievements, program_day_completions, program_assignments
         CASCADE",
    )
    .execute(pool)
    .await
    .unwrap();
}

/// Run all migrations against the test database, skipping Supabase-specific commands.
async fn run_migrations(pool: &sqlx::PgPool) {
    let migration_files = [
        "supabase/migrations/001_workout_tracking.sql",
        "supabase/migrations/002_goals_achievements.sql",
        "supabase/migrations/003_program_progress.sql",
    ];

    for file in &migration_files {
        let path = std::path::Path::new(file);
        if !path.exists() {
            panic!("Migration file not found: {}", file);
        }
        let sql = std::fs::read_to_string(path).unwrap();
        let cleaned = clean_migration_sql(&sql);
        if !cleaned.trim().is_empty() {
            sqlx::raw_sql(&cleaned).execute(pool).await.unwrap_or_else(|e| {
                panic!("Migration {} failed: {}", file, e);
            });
        }
    }
}

/// Remove Supabase-specific SQL (RLS, policies referencing `auth.uid()`).
fn clean_migration_sql(sql: &str) -> String {
    sql.lines()
        .filter(|line| {
            let t = line.trim();
            !t.starts_with("ALTER PUBLICATION")
                && !t.contains("ENABLE ROW LEVEL SECURITY")
                && !t.starts_with("CREATE POLICY")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
