use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::types::AuditEntry;
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::audit::ListAuditLogsUseCase;

#[derive(Serialize)]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<String>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<AuditEntry> for AuditLogResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            actor_id: entry.actor_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct AuditLogQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub actor: Option<Uuid>,
    pub entity_type: Option<String>,
}

// ── GET /superadmin/audit-logs ───────────────────────────────────────────────

pub async fn list_audit_logs(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLogResponse>>, MarketError> {
    let page = ListQuery {
        per_page: query.per_page,
        page: query.page,
    }
    .page_request();
    let usecase = ListAuditLogsUseCase {
        audit: state.audit_repo(),
    };
    let entries = usecase
        .execute(&identity, query.actor, query.entity_type.as_deref(), page)
        .await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
