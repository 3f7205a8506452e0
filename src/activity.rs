//!
//! # Activity Logger
//!
//! Best-effort audit trail. `record` is a post-commit hook invoked by the
//! repository after a successful mutation; it spawns a detached insert so the
//! triggering request never waits on, or fails because of, audit writes.
//! At-most-once: a failed insert is logged and not retried.

use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::Principal;
use crate::error::AppError;
use crate::models::{Activity, ActivityAction, EntityType};

#[derive(Clone)]
pub struct ActivityLog {
    pool: PgPool,
}

impl ActivityLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fire-and-forget audit write. Returns immediately; the insert runs on a
    /// detached task and any failure is swallowed after logging.
    pub fn record(
        &self,
        user_id: i32,
        action: ActivityAction,
        entity_type: EntityType,
        entity_id: String,
        entity_name: String,
        detail: Option<String>,
        payload: Option<serde_json::Value>,
    ) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let result = sqlx::query(
                "INSERT INTO activities (id, user_id, action, entity_type, entity_id, entity_name, detail, payload)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(action)
            .bind(entity_type)
            .bind(&entity_id)
            .bind(&entity_name)
            .bind(&detail)
            .bind(&payload)
            .execute(&pool)
            .await;

            if let Err(e) = result {
                log::warn!(
                    "failed to record activity {:?} on {:?} {}: {}",
                    action,
                    entity_type,
                    entity_id,
                    e
                );
            }
        });
    }

    /// The most recent audit entries visible to the principal: their own
    /// actions, or everyone's for admins.
    pub async fn recent(&self, principal: &Principal, limit: i64) -> Result<Vec<Activity>, AppError> {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT id, user_id, action, entity_type, entity_id, entity_name, detail, payload, created_at
             FROM activities WHERE $2 OR user_id = $1
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(principal.id)
        .bind(principal.is_admin())
        .bind(limit.clamp(1, 200))
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }
}
