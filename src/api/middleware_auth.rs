//! JWT auth extractor for API routes.
//!
//! Resolves the Supabase JWT from the `Authorization: Bearer <token>` header
//! through the state's [`AuthConfig`](crate::auth::AuthConfig). Runs before any
//! body extractor, so unauthenticated requests are rejected with 401 before
//! their payload is even parsed.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use std::sync::Arc;
use tracing::debug;

use super::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Axum extractor that requires any authenticated user.
///
/// Rejects with 401 `UNAUTHORIZED` for a missing, invalid or expired token.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = state
            .auth
            .authenticate(parts.headers.get(header::AUTHORIZATION))
            .map_err(|e| {
                debug!(error = %e, path = %parts.uri.path(), "authentication failed");
                ApiError::from(e)
            })?;
        Ok(RequireAuth(user))
    }
}
