use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::types::{RequestStatus, UnlockRequest};
use crate::error::MarketError;
use crate::handlers::subscription::RequestListQuery;
use crate::state::AppState;
use crate::usecase::unlock::{
    DecideUnlockRequestUseCase, ListUnlockRequestsUseCase, SubmitUnlockRequestUseCase,
};

#[derive(Serialize)]
pub struct UnlockRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub status: RequestStatus,
    pub decided_by: Option<Uuid>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub decided_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UnlockRequest> for UnlockRequestResponse {
    fn from(request: UnlockRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            reason: request.reason,
            status: request.status,
            decided_by: request.decided_by,
            decided_at: request.decided_at,
            created_at: request.created_at,
        }
    }
}

// ── POST /unlock-requests ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SubmitUnlockRequest {
    pub email: String,
    pub reason: String,
}

#[derive(Serialize)]
pub struct SubmittedResponse {
    pub id: Uuid,
    pub status: RequestStatus,
}

/// Anonymous; only the request id and status are returned.
pub async fn submit_unlock_request(
    State(state): State<AppState>,
    Json(body): Json<SubmitUnlockRequest>,
) -> Result<(StatusCode, Json<SubmittedResponse>), MarketError> {
    let usecase = SubmitUnlockRequestUseCase {
        accounts: state.account_repo(),
        unlocks: state.unlock_repo(),
    };
    let request = usecase.execute(&body.email, &body.reason).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmittedResponse {
            id: request.id,
            status: request.status,
        }),
    ))
}

// ── GET /admin/unlock-requests ───────────────────────────────────────────────

pub async fn list_unlock_requests(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<UnlockRequestResponse>>, MarketError> {
    let usecase = ListUnlockRequestsUseCase {
        unlocks: state.unlock_repo(),
    };
    let requests = usecase
        .execute(&identity, query.status()?, query.page_request())
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

// ── POST /admin/unlock-requests/{id}/approve ─────────────────────────────────

pub async fn approve_unlock_request(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = DecideUnlockRequestUseCase {
        unlocks: state.unlock_repo(),
    };
    usecase.approve(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /admin/unlock-requests/{id}/reject ──────────────────────────────────

pub async fn reject_unlock_request(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = DecideUnlockRequestUseCase {
        unlocks: state.unlock_repo(),
    };
    usecase.reject(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
