use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::{Identity, MaybeIdentity};
use cmse_domain::user::UserRole;

use crate::domain::repository::TierInput;
use crate::domain::subscription::Proration;
use crate::domain::types::{RequestStatus, SubscriptionRequest, SubscriptionState, Tier};
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::subscription::{
    ApproveRequestUseCase, CreateTierUseCase, ListMyRequestsUseCase, ListRequestsUseCase,
    ListTiersUseCase, QuoteUpgradeUseCase, RejectRequestUseCase, RequestUpgradeUseCase,
    RevertRequestUseCase, SetTierActiveUseCase, UpdateTierUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TierResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub product_limit: i32,
    pub duration_days: i32,
    pub is_active: bool,
}

impl From<Tier> for TierResponse {
    fn from(tier: Tier) -> Self {
        Self {
            id: tier.id,
            name: tier.name,
            description: tier.description,
            price: tier.price,
            product_limit: tier.product_limit,
            duration_days: tier.duration_days,
            is_active: tier.is_active,
        }
    }
}

#[derive(Serialize)]
pub struct ProrationResponse {
    pub remaining_days: i64,
    pub credit: Decimal,
    pub amount_due: Decimal,
}

impl From<Proration> for ProrationResponse {
    fn from(proration: Proration) -> Self {
        Self {
            remaining_days: proration.remaining_days,
            credit: proration.credit,
            amount_due: proration.amount_due,
        }
    }
}

#[derive(Serialize)]
pub struct SubscriptionStateResponse {
    pub tier_id: Option<i32>,
    pub role: UserRole,
    pub product_limit: i32,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<SubscriptionState> for SubscriptionStateResponse {
    fn from(state: SubscriptionState) -> Self {
        Self {
            tier_id: state.tier_id,
            role: state.role,
            product_limit: state.product_limit,
            started_at: state.started_at,
            expires_at: state.expires_at,
        }
    }
}

#[derive(Serialize)]
pub struct SubscriptionRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_tier_id: i32,
    pub status: RequestStatus,
    pub prorated_credit: Decimal,
    pub amount_due: Decimal,
    pub note: Option<String>,
    pub decided_by: Option<Uuid>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub decided_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<SubscriptionRequest> for SubscriptionRequestResponse {
    fn from(request: SubscriptionRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            requested_tier_id: request.requested_tier_id,
            status: request.status,
            prorated_credit: request.prorated_credit,
            amount_due: request.amount_due,
            note: request.note,
            decided_by: request.decided_by,
            decided_at: request.decided_at,
            created_at: request.created_at,
        }
    }
}

fn request_list(requests: Vec<SubscriptionRequest>) -> Json<Vec<SubscriptionRequestResponse>> {
    Json(requests.into_iter().map(Into::into).collect())
}

// ── GET /tiers ───────────────────────────────────────────────────────────────

pub async fn list_tiers(
    MaybeIdentity(identity): MaybeIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<TierResponse>>, MarketError> {
    let usecase = ListTiersUseCase {
        subscriptions: state.subscription_repo(),
    };
    let tiers = usecase.execute(identity.as_ref()).await?;
    Ok(Json(tiers.into_iter().map(Into::into).collect()))
}

// ── POST /superadmin/tiers ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TierRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub product_limit: i32,
    pub duration_days: i32,
}

impl From<TierRequest> for TierInput {
    fn from(body: TierRequest) -> Self {
        Self {
            name: body.name,
            description: body.description,
            price: body.price,
            product_limit: body.product_limit,
            duration_days: body.duration_days,
        }
    }
}

pub async fn create_tier(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<TierRequest>,
) -> Result<(StatusCode, Json<TierResponse>), MarketError> {
    let usecase = CreateTierUseCase {
        subscriptions: state.subscription_repo(),
        audit: state.audit_repo(),
    };
    let tier = usecase.execute(&identity, body.into()).await?;
    Ok((StatusCode::CREATED, Json(tier.into())))
}

// ── PUT /superadmin/tiers/{id} ───────────────────────────────────────────────

pub async fn update_tier(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<TierRequest>,
) -> Result<StatusCode, MarketError> {
    let usecase = UpdateTierUseCase {
        subscriptions: state.subscription_repo(),
        audit: state.audit_repo(),
    };
    usecase.execute(&identity, id, body.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PUT /superadmin/tiers/{id}/active ────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetTierActiveRequest {
    pub active: bool,
}

pub async fn set_tier_active(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<SetTierActiveRequest>,
) -> Result<StatusCode, MarketError> {
    let usecase = SetTierActiveUseCase {
        subscriptions: state.subscription_repo(),
        audit: state.audit_repo(),
    };
    usecase.execute(&identity, id, body.active).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /tiers/{id}/quote ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct QuoteResponse {
    pub current: Option<TierResponse>,
    pub target: TierResponse,
    pub proration: ProrationResponse,
}

pub async fn quote_upgrade(
    identity: Identity,
    State(state): State<AppState>,
    Path(tier_id): Path<i32>,
) -> Result<Json<QuoteResponse>, MarketError> {
    let usecase = QuoteUpgradeUseCase {
        accounts: state.account_repo(),
        subscriptions: state.subscription_repo(),
    };
    let quote = usecase.execute(identity.user_id, tier_id).await?;
    Ok(Json(QuoteResponse {
        current: quote.current.map(Into::into),
        target: quote.target.into(),
        proration: quote.proration.into(),
    }))
}

// ── POST /subscription-requests ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpgradeRequest {
    pub tier_id: i32,
    pub note: Option<String>,
}

pub async fn request_upgrade(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<UpgradeRequest>,
) -> Result<(StatusCode, Json<SubscriptionRequestResponse>), MarketError> {
    let usecase = RequestUpgradeUseCase {
        accounts: state.account_repo(),
        subscriptions: state.subscription_repo(),
    };
    let request = usecase
        .execute(identity.user_id, body.tier_id, body.note.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

// ── GET /users/@me/subscription-requests ─────────────────────────────────────

pub async fn list_my_requests(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SubscriptionRequestResponse>>, MarketError> {
    let usecase = ListMyRequestsUseCase {
        subscriptions: state.subscription_repo(),
    };
    Ok(request_list(
        usecase
            .execute(identity.user_id, query.page_request())
            .await?,
    ))
}

// ── GET /admin/subscription-requests ─────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct RequestListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub status: Option<String>,
}

impl RequestListQuery {
    pub fn status(&self) -> Result<Option<RequestStatus>, MarketError> {
        self.status
            .as_deref()
            .map(|s| RequestStatus::parse(s).ok_or(MarketError::InvalidInput("unknown status")))
            .transpose()
    }

    pub fn page_request(&self) -> cmse_domain::pagination::PageRequest {
        ListQuery {
            per_page: self.per_page,
            page: self.page,
        }
        .page_request()
    }
}

pub async fn list_requests(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<SubscriptionRequestResponse>>, MarketError> {
    let usecase = ListRequestsUseCase {
        subscriptions: state.subscription_repo(),
    };
    Ok(request_list(
        usecase
            .execute(&identity, query.status()?, query.page_request())
            .await?,
    ))
}

// ── POST /admin/subscription-requests/{id}/approve ───────────────────────────

pub async fn approve_request(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubscriptionStateResponse>, MarketError> {
    let usecase = ApproveRequestUseCase {
        accounts: state.account_repo(),
        subscriptions: state.subscription_repo(),
    };
    let granted = usecase.execute(&identity, id).await?;
    Ok(Json(granted.into()))
}

// ── POST /admin/subscription-requests/{id}/reject ────────────────────────────

#[derive(Deserialize)]
pub struct RejectRequestBody {
    pub reason: Option<String>,
}

pub async fn reject_request(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequestBody>,
) -> Result<StatusCode, MarketError> {
    let usecase = RejectRequestUseCase {
        subscriptions: state.subscription_repo(),
    };
    usecase
        .execute(&identity, id, body.reason.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /superadmin/subscription-requests/{id}/revert ───────────────────────

pub async fn revert_request(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubscriptionStateResponse>, MarketError> {
    let usecase = RevertRequestUseCase {
        subscriptions: state.subscription_repo(),
    };
    let restored = usecase.execute(&identity, id).await?;
    Ok(Json(restored.into()))
}
