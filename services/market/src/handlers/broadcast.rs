use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::types::Broadcast;
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::broadcast::{
    CreateBroadcastInput, ListActiveBroadcastsUseCase, ManageBroadcastsUseCase,
};

#[derive(Serialize)]
pub struct BroadcastResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub is_active: bool,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub starts_at: DateTime<Utc>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Broadcast> for BroadcastResponse {
    fn from(broadcast: Broadcast) -> Self {
        Self {
            id: broadcast.id,
            title: broadcast.title,
            body: broadcast.body,
            is_active: broadcast.is_active,
            starts_at: broadcast.starts_at,
            expires_at: broadcast.expires_at,
        }
    }
}

fn broadcast_list(broadcasts: Vec<Broadcast>) -> Json<Vec<BroadcastResponse>> {
    Json(broadcasts.into_iter().map(Into::into).collect())
}

// ── GET /broadcasts ──────────────────────────────────────────────────────────

pub async fn list_active_broadcasts(
    State(state): State<AppState>,
) -> Result<Json<Vec<BroadcastResponse>>, MarketError> {
    let usecase = ListActiveBroadcastsUseCase {
        broadcasts: state.broadcast_repo(),
    };
    Ok(broadcast_list(usecase.execute().await?))
}

// ── GET /superadmin/broadcasts ───────────────────────────────────────────────

pub async fn list_broadcasts(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BroadcastResponse>>, MarketError> {
    let usecase = ManageBroadcastsUseCase {
        broadcasts: state.broadcast_repo(),
        audit: state.audit_repo(),
    };
    Ok(broadcast_list(
        usecase.list(&identity, query.page_request()).await?,
    ))
}

// ── POST /superadmin/broadcasts ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateBroadcastRequest {
    pub title: String,
    pub body: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub async fn create_broadcast(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateBroadcastRequest>,
) -> Result<(StatusCode, Json<BroadcastResponse>), MarketError> {
    let usecase = ManageBroadcastsUseCase {
        broadcasts: state.broadcast_repo(),
        audit: state.audit_repo(),
    };
    let broadcast = usecase
        .create(
            &identity,
            CreateBroadcastInput {
                title: body.title,
                body: body.body,
                starts_at: body.starts_at,
                expires_at: body.expires_at,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(broadcast.into())))
}

// ── DELETE /superadmin/broadcasts/{id} ───────────────────────────────────────

pub async fn deactivate_broadcast(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = ManageBroadcastsUseCase {
        broadcasts: state.broadcast_repo(),
        audit: state.audit_repo(),
    };
    usecase.deactivate(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
