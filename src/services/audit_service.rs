use crate::error::Result;
use crate::middleware::auth::Principal;
use crate::models::audit_log::AuditLog;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log(
        &self,
        actor: &Principal,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        changes: Option<JsonValue>,
    ) -> Result<AuditLog> {
        let row = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (actor_id, actor_kind, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, actor_id, actor_kind, action, entity_type, entity_id, changes, created_at
            "#,
        )
        .bind(actor.user_id())
        .bind(actor.actor_kind())
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(changes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Audit writes never fail the action they describe.
    pub async fn record(
        &self,
        actor: &Principal,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        changes: Option<JsonValue>,
    ) {
        if let Err(e) = self.log(actor, action, entity_type, entity_id, changes).await {
            tracing::warn!(error = ?e, action, entity_type, "failed to write audit log");
        }
    }
}
