//! # Completion: Workout Finalization and Program Advancement
//!
//! Runs the per-request pipeline behind `POST /api/workouts/complete`:
//!
//! 1. Validate the body and check the caller owns `client_id`.
//! 2. Fetch the workout log scoped to both log id and client id.
//! 3. Aggregate the log's set logs into totals.
//! 4. Resolve the duration (client value, else elapsed since `started_at`).
//! 5. Finalize the log with totals and completion time.
//! 6. Mark the optional workout session completed (best-effort).
//! 7. Sync workout-frequency goals and check achievements (best-effort).
//! 8. Advance the program cursor through `advance_program_progress`.
//!
//! Steps 1–5 and 8 short-circuit with an [`ApiError`]; steps 6 and 7 only log.
//! Program-cursor correctness (atomicity, idempotency of a day) belongs to
//! the stored procedure: nothing here retries or reconciles program state.

pub mod aggregate;
pub mod duration;
pub mod progression;
pub mod request;
pub mod side_effects;

pub use aggregate::WorkoutTotals;
pub use progression::{ProgramProgression, Progression};
pub use request::{CompleteWorkoutRequest, ValidatedRequest};
pub use side_effects::{Dispatch, NonCriticalTask, SideEffectRunner};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::achievements::AchievementCategory;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::store::{Collaborators, Finalization, WorkoutLog};

/// Totals reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletionTotals {
    pub sets: i64,
    pub reps: i64,
    pub weight: f64,
    pub duration_minutes: i64,
}

/// Program linkage of the completed log, echoed for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramDay {
    pub program_assignment_id: Option<String>,
    pub program_schedule_id: Option<String>,
}

/// Result of a completion that reached the progression step.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Advanced {
        workout_log: WorkoutLog,
        totals: CompletionTotals,
        progression: ProgramProgression,
        program_day: ProgramDay,
    },
    DayAlreadyCompleted {
        workout_log: WorkoutLog,
        progression: ProgramProgression,
    },
    ProgramAlreadyCompleted {
        workout_log: WorkoutLog,
        progression: ProgramProgression,
    },
}

impl CompletionOutcome {
    /// Metric / log label.
    pub fn label(&self) -> &'static str {
        match self {
            CompletionOutcome::Advanced { .. } => "advanced",
            CompletionOutcome::DayAlreadyCompleted { .. } => "day_already_completed",
            CompletionOutcome::ProgramAlreadyCompleted { .. } => "program_already_completed",
        }
    }
}

/// The workout completion workflow, bound to its collaborators.
#[derive(Clone)]
pub struct WorkoutCompletion {
    collaborators: Collaborators,
    side_effects: SideEffectRunner,
}

impl WorkoutCompletion {
    pub fn new(collaborators: Collaborators, side_effects: SideEffectRunner) -> Self {
        WorkoutCompletion {
            collaborators,
            side_effects,
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Complete a workout on behalf of `caller`, using `now` as the
    /// completion time.
    pub async fn complete(
        &self,
        caller: &AuthUser,
        request: CompleteWorkoutRequest,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, ApiError> {
        let request = request.validate(caller)?;
        let span = info_span!(
            "complete_workout",
            workout_log_id = %request.workout_log_id,
            client_id = %request.client_id,
        );
        self.run(caller, request, now).instrument(span).await
    }

    async fn run(
        &self,
        caller: &AuthUser,
        request: ValidatedRequest,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, ApiError> {
        let store = &self.collaborators.store;

        let log = match store
            .fetch_workout_log(&request.workout_log_id, &request.client_id)
            .await
        {
            Ok(Some(log)) => log,
            Ok(None) => {
                warn!("workout log not found for client");
                return Err(ApiError::NotFound("Workout log not found".to_string()));
            }
            Err(e) => {
                warn!(error = %e, "workout log lookup failed");
                return Err(ApiError::NotFound("Workout log not found".to_string()));
            }
        };
        if log.completed_at.is_some() {
            warn!("workout log was already finalized; re-aggregating totals");
        }

        let sets = store
            .fetch_set_logs(&request.workout_log_id, &request.client_id)
            .await
            .map_err(|e| ApiError::database("Failed to fetch set logs", &e))?;
        let totals = WorkoutTotals::from_sets(&request.workout_log_id, &sets);
        let duration_minutes =
            duration::resolve_duration_minutes(request.duration_minutes, log.started_at, now);

        let finalization = Finalization {
            completed_at: now,
            duration_minutes,
            sets_completed: totals.sets,
            reps_completed: totals.reps,
            total_weight_lifted: totals.weight,
        };
        let workout_log = store
            .finalize_workout_log(&request.workout_log_id, &finalization)
            .await
            .map_err(|e| ApiError::database("Failed to complete workout", &e))?;
        info!(
            sets = totals.sets,
            reps = totals.reps,
            weight = totals.weight,
            duration_minutes,
            "workout log finalized"
        );

        self.mark_session_completed(request.session_id.as_deref(), &request.client_id, now)
            .await;
        self.side_effects
            .run(self.side_effect_tasks(&request.client_id))
            .await;

        let result = self
            .collaborators
            .progression
            .advance(caller, &request.client_id, &caller.user_id, None)
            .await
            .map_err(|e| progression::transport_error(&e))?;

        let outcome = match progression::interpret(result)? {
            Progression::Advanced(progression) => CompletionOutcome::Advanced {
                totals: CompletionTotals {
                    sets: totals.sets,
                    reps: totals.reps,
                    weight: totals.weight,
                    duration_minutes,
                },
                program_day: ProgramDay {
                    program_assignment_id: log.program_assignment_id.clone(),
                    program_schedule_id: log.program_schedule_id.clone(),
                },
                workout_log,
                progression,
            },
            Progression::DayAlreadyCompleted(progression) => {
                CompletionOutcome::DayAlreadyCompleted {
                    workout_log,
                    progression,
                }
            }
            Progression::ProgramAlreadyCompleted(progression) => {
                CompletionOutcome::ProgramAlreadyCompleted {
                    workout_log,
                    progression,
                }
            }
        };
        info!(outcome = outcome.label(), "workout completion processed");
        Ok(outcome)
    }

    /// Best-effort: never fails the request.
    async fn mark_session_completed(
        &self,
        session_id: Option<&str>,
        client_id: &str,
        completed_at: DateTime<Utc>,
    ) {
        let Some(raw) = session_id else {
            return;
        };
        let id = match request::is_uuid_shaped(raw)
            .then(|| Uuid::parse_str(raw).ok())
            .flatten()
        {
            Some(id) => id,
            None => {
                info!(session_id = raw, "session id is not a UUID; skipping session update");
                return;
            }
        };
        match self
            .collaborators
            .store
            .complete_session(id, client_id, completed_at)
            .await
        {
            Ok(0) => warn!(session_id = %id, "no workout session matched; status not updated"),
            Ok(_) => info!(session_id = %id, "workout session marked completed"),
            Err(e) => warn!(session_id = %id, error = %e, "failed to update workout session"),
        }
    }

    fn side_effect_tasks(&self, client_id: &str) -> Vec<NonCriticalTask> {
        let mut tasks = Vec::with_capacity(1 + AchievementCategory::ALL.len());

        let store = self.collaborators.store.clone();
        let goals = self.collaborators.goals.clone();
        let client = client_id.to_string();
        tasks.push(NonCriticalTask::new("goal_sync", async move {
            let active = store.active_goals(&client).await?;
            let mut failed = 0;
            for goal in active
                .iter()
                .filter(|g| side_effects::is_workout_frequency_goal(&g.title))
            {
                if let Err(e) = goals.sync_goal(&goal.id, &client).await {
                    warn!(goal_id = %goal.id, error = %e, "goal sync failed");
                    failed += 1;
                }
            }
            if failed > 0 {
                anyhow::bail!("{} goal(s) failed to sync", failed);
            }
            Ok(())
        }));

        for category in AchievementCategory::ALL {
            let achievements = self.collaborators.achievements.clone();
            let client = client_id.to_string();
            tasks.push(NonCriticalTask::new(
                format!("achievements_{}", category),
                async move {
                    let unlocked = achievements.check_and_unlock(&client, category).await?;
                    if !unlocked.is_empty() {
                        info!(%category, unlocked = ?unlocked, "achievements unlocked");
                    }
                    Ok(())
                },
            ));
        }
        tasks
    }
}
