//! User-scoped call to `advance_program_progress`.
//!
//! Runs in a dedicated transaction that carries the caller's JWT claims and
//! drops to the `authenticated` role, mirroring what PostgREST does for an
//! end-user request. Row-level security and `auth.uid()` inside the procedure
//! therefore see the caller, not the service role.

use super::Database;
use crate::auth::AuthUser;
use crate::error::StoreResult;
use crate::store::ProgressionResult;

/// Role assumed for policy-enforced calls.
const USER_ROLE: &str = "authenticated";

impl Database {
    pub async fn advance_program_progress(
        &self,
        caller: &AuthUser,
        client_id: &str,
        completed_by: &str,
        notes: Option<&str>,
    ) -> StoreResult<ProgressionResult> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "SELECT set_config('request.jwt.claims', $1, true),
                    set_config('request.jwt.claim.sub', $2, true),
                    set_config('request.jwt.claim.role', $3, true)",
        )
        .bind(caller.claims.to_string())
        .bind(&caller.user_id)
        .bind(USER_ROLE)
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!("SET LOCAL ROLE {}", USER_ROLE))
            .execute(&mut *tx)
            .await?;

        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT to_jsonb(advance_program_progress($1::uuid, $2::uuid, $3))",
        )
        .bind(client_id)
        .bind(completed_by)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(serde_json::from_value(value)?)
    }
}
