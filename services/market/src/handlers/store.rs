use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::types::Store;
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::handlers::product::ProductResponse;
use crate::state::AppState;
use crate::usecase::store::{
    CreateMyStoreUseCase, CreateStoreInput, GetMyStoreUseCase, GetStoreUseCase,
    ListStoresUseCase, SetStoreActiveUseCase, UpdateMyStoreUseCase, UpdateStoreInput,
};

#[derive(Serialize)]
pub struct StoreResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub is_active: bool,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Store> for StoreResponse {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            owner_id: store.owner_id,
            name: store.name,
            slug: store.slug,
            description: store.description,
            contact_email: store.contact_email,
            is_active: store.is_active,
            created_at: store.created_at,
        }
    }
}

// ── GET /stores ──────────────────────────────────────────────────────────────

pub async fn list_stores(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StoreResponse>>, MarketError> {
    let usecase = ListStoresUseCase {
        stores: state.store_repo(),
    };
    let stores = usecase.execute(query.page_request()).await?;
    Ok(Json(stores.into_iter().map(Into::into).collect()))
}

// ── GET /stores/{slug} ───────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StoreDetailResponse {
    pub store: StoreResponse,
    pub products: Vec<ProductResponse>,
}

pub async fn get_store(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<StoreDetailResponse>, MarketError> {
    let usecase = GetStoreUseCase {
        stores: state.store_repo(),
        products: state.product_repo(),
    };
    let (store, products) = usecase.execute(&slug, query.page_request()).await?;
    Ok(Json(StoreDetailResponse {
        store: store.into(),
        products: products.into_iter().map(Into::into).collect(),
    }))
}

// ── GET /users/@me/store ─────────────────────────────────────────────────────

pub async fn get_my_store(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<StoreResponse>, MarketError> {
    let usecase = GetMyStoreUseCase {
        stores: state.store_repo(),
    };
    let store = usecase.execute(identity.user_id).await?;
    Ok(Json(store.into()))
}

// ── POST /users/@me/store ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
}

pub async fn create_my_store(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreResponse>), MarketError> {
    let usecase = CreateMyStoreUseCase {
        stores: state.store_repo(),
    };
    let store = usecase
        .execute(
            &identity,
            CreateStoreInput {
                name: body.name,
                description: body.description,
                contact_email: body.contact_email,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(store.into())))
}

// ── PATCH /users/@me/store ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub contact_email: Option<String>,
}

pub async fn update_my_store(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<StoreResponse>, MarketError> {
    let usecase = UpdateMyStoreUseCase {
        stores: state.store_repo(),
    };
    let store = usecase
        .execute(
            identity.user_id,
            UpdateStoreInput {
                name: body.name,
                description: body.description,
                contact_email: body.contact_email,
            },
        )
        .await?;
    Ok(Json(store.into()))
}

// ── PUT /admin/stores/{id}/active ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

pub async fn set_store_active(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetActiveRequest>,
) -> Result<StatusCode, MarketError> {
    let usecase = SetStoreActiveUseCase {
        stores: state.store_repo(),
    };
    usecase.execute(&identity, id, body.active).await?;
    Ok(StatusCode::NO_CONTENT)
}
