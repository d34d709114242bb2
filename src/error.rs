//! # Errors: API Envelope and Store Failures
//!
//! [`ApiError`] is the single error type returned by HTTP handlers. Every
//! variant renders as the same JSON envelope:
//!
//! ```json
//! { "success": false, "error": "...", "code": "NOT_FOUND", "status": 404, "details": "..." }
//! ```
//!
//! | Variant | Status | Code |
//! |---------|--------|------|
//! | `Validation` | 400 | `VALIDATION_ERROR` |
//! | `Unauthorized` | 401 | `UNAUTHORIZED` |
//! | `Forbidden` | 403 | `FORBIDDEN` |
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `Database` | 500 | `DATABASE_ERROR` |
//! | `Progression` | 500 | procedure-supplied or `PROGRESSION_ERROR` |
//! | `Internal` | 500 | `INTERNAL_ERROR` |
//!
//! [`StoreError`] is what the storage layer hands back: the store's own
//! message plus its SQLSTATE code and hint when PostgreSQL supplied them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sqlx::postgres::PgDatabaseError;
use tracing::error;

use crate::auth::AuthError;

pub const PROGRESSION_ERROR: &str = "PROGRESSION_ERROR";

/// Failure reported by a store operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    /// SQLSTATE or backend error code.
    pub code: Option<String>,
    pub hint: Option<String>,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        StoreError {
            message: message.into(),
            code: None,
            hint: None,
        }
    }

    /// Render message, code and hint into one diagnostic line.
    pub fn details(&self) -> String {
        let mut out = self.message.clone();
        if let Some(code) = &self.code {
            out.push_str(&format!(" (code: {})", code));
        }
        if let Some(hint) = &self.hint {
            out.push_str(&format!(" (hint: {})", hint));
        }
        out
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => StoreError {
                message: db.message().to_string(),
                code: db.code().map(|c| c.into_owned()),
                hint: db
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.hint())
                    .map(str::to_string),
            },
            _ => StoreError::new(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::new(format!("malformed JSON from store: {}", e))
    }
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<String>,
        details: Option<String>,
    },
    #[error(transparent)]
    Unauthorized(AuthError),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Database {
        message: String,
        details: Option<String>,
    },
    #[error("{message}")]
    Progression {
        code: String,
        message: String,
        details: Option<String>,
    },
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: String,
    code: &'a str,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [String]>,
}

impl ApiError {
    /// Missing required fields.
    pub fn missing_fields(fields: Vec<String>) -> Self {
        ApiError::Validation {
            details: Some(format!("Missing required fields: {}", fields.join(", "))),
            message: "Missing required fields".to_string(),
            fields,
        }
    }

    /// Body could not be parsed at all.
    pub fn malformed_body(details: impl Into<String>) -> Self {
        ApiError::Validation {
            message: "Invalid request body".to_string(),
            fields: Vec::new(),
            details: Some(details.into()),
        }
    }

    /// Store failure on a mandatory step. Logs the full store diagnostics.
    pub fn database(message: &str, err: &StoreError) -> Self {
        error!(
            error = %err,
            code = err.code.as_deref().unwrap_or(""),
            hint = err.hint.as_deref().unwrap_or(""),
            "{}",
            message
        );
        ApiError::Database {
            message: message.to_string(),
            details: Some(err.details()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database { .. }
            | ApiError::Progression { .. }
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Database { .. } => "DATABASE_ERROR",
            ApiError::Progression { code, .. } => code,
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            ApiError::Validation { details, .. }
            | ApiError::Database { details, .. }
            | ApiError::Progression { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    fn fields(&self) -> Option<&[String]> {
        match self {
            ApiError::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Unauthorized(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code(),
            status: status.as_u16(),
            details: self.details(),
            fields: self.fields(),
        };
        (status, Json(body)).into_response()
    }
}
