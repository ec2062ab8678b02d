use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::{Identity, MaybeIdentity};

use crate::domain::types::Page;
use crate::error::MarketError;
use crate::state::AppState;
use crate::usecase::page::{GetPageUseCase, ListPagesUseCase, ManagePagesUseCase, PageInput};

#[derive(Serialize)]
pub struct PageResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub sort_order: i32,
    pub is_published: bool,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            content: page.content,
            sort_order: page.sort_order,
            is_published: page.is_published,
            updated_at: page.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct PageRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}

impl From<PageRequest> for PageInput {
    fn from(body: PageRequest) -> Self {
        Self {
            title: body.title,
            slug: body.slug,
            content: body.content,
            sort_order: body.sort_order,
            is_published: body.is_published,
        }
    }
}

// ── GET /pages ───────────────────────────────────────────────────────────────

pub async fn list_pages(
    MaybeIdentity(identity): MaybeIdentity,
    State(state): State<AppState>,
) -> Result<Json<Vec<PageResponse>>, MarketError> {
    let usecase = ListPagesUseCase {
        pages: state.page_repo(),
    };
    let pages = usecase.execute(identity.as_ref()).await?;
    Ok(Json(pages.into_iter().map(Into::into).collect()))
}

// ── GET /pages/{slug} ────────────────────────────────────────────────────────

pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PageResponse>, MarketError> {
    let usecase = GetPageUseCase {
        pages: state.page_repo(),
    };
    Ok(Json(usecase.execute(&slug).await?.into()))
}

// ── POST /admin/pages ────────────────────────────────────────────────────────

pub async fn create_page(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<PageRequest>,
) -> Result<(StatusCode, Json<PageResponse>), MarketError> {
    let usecase = ManagePagesUseCase {
        pages: state.page_repo(),
        audit: state.audit_repo(),
    };
    let page = usecase.create(&identity, body.into()).await?;
    Ok((StatusCode::CREATED, Json(page.into())))
}

// ── PATCH /admin/pages/{id} ──────────────────────────────────────────────────

pub async fn update_page(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PageRequest>,
) -> Result<Json<PageResponse>, MarketError> {
    let usecase = ManagePagesUseCase {
        pages: state.page_repo(),
        audit: state.audit_repo(),
    };
    let page = usecase.update(&identity, id, body.into()).await?;
    Ok(Json(page.into()))
}

// ── DELETE /admin/pages/{id} ─────────────────────────────────────────────────

pub async fn delete_page(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = ManagePagesUseCase {
        pages: state.page_repo(),
        audit: state.audit_repo(),
    };
    usecase.delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
