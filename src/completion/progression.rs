//! Interpretation of `advance_program_progress` results.
//!
//! | status | outcome |
//! |--------|---------|
//! | transport / SQL failure | 500 `PROGRESSION_ERROR` |
//! | `error` | 500, procedure code or `PROGRESSION_ERROR` |
//! | `already_completed` | 409 "Day already completed" |
//! | `completed` | 409 "Program already completed" |
//! | `advanced`, missing, or anything else | 200 |

use serde::Serialize;
use tracing::{error, warn};

use crate::error::{ApiError, StoreError, PROGRESSION_ERROR};
use crate::store::ProgressionResult;

/// Business outcome reported by the procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionStatus {
    Advanced,
    AlreadyCompleted,
    Completed,
    Error,
}

impl ProgressionStatus {
    /// Unknown or missing statuses take the success path.
    pub fn parse(status: Option<&str>) -> Self {
        match status {
            Some("already_completed") => ProgressionStatus::AlreadyCompleted,
            Some("completed") => ProgressionStatus::Completed,
            Some("error") => ProgressionStatus::Error,
            _ => ProgressionStatus::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressionStatus::Advanced => "advanced",
            ProgressionStatus::AlreadyCompleted => "already_completed",
            ProgressionStatus::Completed => "completed",
            ProgressionStatus::Error => "error",
        }
    }
}

/// Program cursor as echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramProgression {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub current_week_index: Option<i64>,
    pub current_day_index: Option<i64>,
    pub is_completed: bool,
}

/// Non-error progression outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum Progression {
    Advanced(ProgramProgression),
    DayAlreadyCompleted(ProgramProgression),
    ProgramAlreadyCompleted(ProgramProgression),
}

/// The RPC itself failed: network, permissions, SQL error.
pub fn transport_error(err: &StoreError) -> ApiError {
    error!(error = %err, code = err.code.as_deref().unwrap_or(""), "program progression RPC failed");
    ApiError::Progression {
        code: PROGRESSION_ERROR.to_string(),
        message: "Failed to advance program progress".to_string(),
        details: Some(err.details()),
    }
}

/// Map a procedure result onto an outcome or an error.
pub fn interpret(result: ProgressionResult) -> Result<Progression, ApiError> {
    let status = ProgressionStatus::parse(result.status.as_deref());
    let is_completed = result.is_completed.unwrap_or(false);

    match status {
        ProgressionStatus::Error => {
            let message = result
                .message
                .unwrap_or_else(|| "Failed to advance program progress".to_string());
            error!(code = result.code.as_deref().unwrap_or(PROGRESSION_ERROR), %message, "program progression reported an error");
            Err(ApiError::Progression {
                code: result.code.unwrap_or_else(|| PROGRESSION_ERROR.to_string()),
                message,
                details: None,
            })
        }
        ProgressionStatus::AlreadyCompleted => {
            warn!(message = result.message.as_deref().unwrap_or(""), "program day already completed");
            Ok(Progression::DayAlreadyCompleted(ProgramProgression {
                status: status.as_str().to_string(),
                message: None,
                current_week_index: result.current_week_index,
                current_day_index: result.current_day_index,
                is_completed,
            }))
        }
        ProgressionStatus::Completed => Ok(Progression::ProgramAlreadyCompleted(
            ProgramProgression {
                status: status.as_str().to_string(),
                message: None,
                current_week_index: result.current_week_index,
                current_day_index: result.current_day_index,
                is_completed: true,
            },
        )),
        ProgressionStatus::Advanced => Ok(Progression::Advanced(ProgramProgression {
            status: result.status.unwrap_or_else(|| status.as_str().to_string()),
            message: Some(result.message.unwrap_or_default()),
            current_week_index: result.current_week_index,
            current_day_index: result.current_day_index,
            is_completed,
        })),
    }
}
