//! Request body, validation and ownership check.

use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthUser;
use crate::error::ApiError;

/// `POST /api/workouts/complete` body.
///
/// `duration_minutes` is kept as raw JSON: only numeric values count as
/// "supplied", anything else falls back to the derived duration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteWorkoutRequest {
    #[serde(default)]
    pub workout_log_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<Value>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A request that passed field validation and the ownership check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub workout_log_id: String,
    pub client_id: String,
    pub duration_minutes: Option<f64>,
    pub session_id: Option<String>,
}

impl CompleteWorkoutRequest {
    /// Required fields first, then ownership: callers may only complete
    /// workouts for their own client record.
    pub fn validate(self, caller: &AuthUser) -> Result<ValidatedRequest, ApiError> {
        let workout_log_id = self.workout_log_id.filter(|s| !s.is_empty());
        let client_id = self.client_id.filter(|s| !s.is_empty());

        let mut missing = Vec::new();
        if workout_log_id.is_none() {
            missing.push("workout_log_id".to_string());
        }
        if client_id.is_none() {
            missing.push("client_id".to_string());
        }
        let (Some(workout_log_id), Some(client_id)) = (workout_log_id, client_id) else {
            return Err(ApiError::missing_fields(missing));
        };

        if caller.user_id != client_id {
            return Err(ApiError::Forbidden(
                "You can only complete your own workouts".to_string(),
            ));
        }

        Ok(ValidatedRequest {
            workout_log_id,
            client_id,
            duration_minutes: self.duration_minutes.as_ref().and_then(Value::as_f64),
            session_id: self.session_id.filter(|s| !s.is_empty()),
        })
    }
}

/// True for the canonical 8-4-4-4-12 hex UUID text form.
pub fn is_uuid_shaped(s: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == GROUPS.len()
        && parts
            .iter()
            .zip(GROUPS)
            .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
}
