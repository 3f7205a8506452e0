use sqlx::PgPool;

use crate::authz::Principal;
use crate::error::AppError;
use crate::models::{User, UserRole};

/// Resolves a verified token subject into a live principal.
///
/// Token verification only proves the signature; the account may have been
/// removed since the token was issued, in which case authentication fails.
pub async fn resolve_principal(pool: &PgPool, user_id: i32) -> Result<Principal, AppError> {
    let row = sqlx::query_as::<_, (i32, UserRole)>("SELECT id, role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((id, role)) => Ok(Principal { id, role }),
        None => Err(AppError::Unauthorized("Account no longer exists".into())),
    }
}

/// Fetches the full user record for the authenticated principal.
pub async fn find_by_id(pool: &PgPool, user_id: i32) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, role, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn exists(pool: &PgPool, user_id: i32) -> Result<bool, AppError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}
