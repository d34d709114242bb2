//! Workout completion API.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

use super::middleware_auth::RequireAuth;
use super::AppState;
use crate::completion::{CompleteWorkoutRequest, CompletionOutcome};
use crate::error::ApiError;

/// POST /api/workouts/complete
///
/// 200 when the program advanced, 409 when the day or the whole program was
/// already completed, error envelope otherwise.
pub(super) async fn handler_complete_workout(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    payload: Result<Json<CompleteWorkoutRequest>, JsonRejection>,
) -> Response {
    let result = match payload {
        Ok(Json(request)) => state.completion.complete(&caller, request, Utc::now()).await,
        Err(rejection) => Err(ApiError::malformed_body(rejection.body_text())),
    };
    match result {
        Ok(outcome) => {
            state.prom_metrics.record_completion(outcome.label());
            outcome_response(outcome)
        }
        Err(e) => {
            state.prom_metrics.record_completion("failed");
            e.into_response()
        }
    }
}

fn outcome_response(outcome: CompletionOutcome) -> Response {
    match outcome {
        CompletionOutcome::Advanced {
            workout_log,
            totals,
            progression,
            program_day,
        } => Json(serde_json::json!({
            "success": true,
            "workout_log": workout_log,
            "totals": totals,
            "program_progression": progression,
            "program_day": program_day,
        }))
        .into_response(),
        CompletionOutcome::DayAlreadyCompleted {
            workout_log,
            progression,
        } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "success": false,
                "error": "Day already completed",
                "workout_log": workout_log,
                "program_progression": progression,
            })),
        )
            .into_response(),
        CompletionOutcome::ProgramAlreadyCompleted {
            workout_log,
            progression,
        } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "success": false,
                "error": "Program already completed",
                "workout_log": workout_log,
                "program_progression": progression,
            })),
        )
            .into_response(),
    }
}
