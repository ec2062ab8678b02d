use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::category::CategoryNode;
use crate::domain::types::Category;
use crate::error::MarketError;
use crate::state::AppState;
use crate::usecase::category::{
    CreateCategoryInput, CreateCategoryUseCase, DeleteCategoryUseCase, GetCategoryUseCase,
    ListCategoriesUseCase, UpdateCategoryInput, UpdateCategoryUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            parent_id: category.parent_id,
            sort_order: category.sort_order,
        }
    }
}

#[derive(Serialize)]
pub struct CategoryNodeResponse {
    #[serde(flatten)]
    pub category: CategoryResponse,
    pub children: Vec<CategoryNodeResponse>,
}

impl From<CategoryNode> for CategoryNodeResponse {
    fn from(node: CategoryNode) -> Self {
        Self {
            category: node.category.into(),
            children: node.children.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryResponse>,
    pub tree: Vec<CategoryNodeResponse>,
}

// ── GET /categories ──────────────────────────────────────────────────────────

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, MarketError> {
    let usecase = ListCategoriesUseCase {
        categories: state.category_repo(),
    };
    let listing = usecase.execute().await?;
    Ok(Json(CategoryListResponse {
        categories: listing.flat.into_iter().map(Into::into).collect(),
        tree: listing.tree.into_iter().map(Into::into).collect(),
    }))
}

// ── GET /categories/{slug} ───────────────────────────────────────────────────

pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, MarketError> {
    let usecase = GetCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase.execute(&slug).await?;
    Ok(Json(category.into()))
}

// ── POST /admin/categories ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
}

pub async fn create_category(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), MarketError> {
    let usecase = CreateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(
            &identity,
            CreateCategoryInput {
                name: body.name,
                slug: body.slug,
                parent_id: body.parent_id,
                sort_order: body.sort_order,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

// ── PATCH /admin/categories/{id} ─────────────────────────────────────────────

/// Absent means "keep", `null` means "move to the top level".
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
}

pub async fn update_category(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, MarketError> {
    let usecase = UpdateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(
            &identity,
            id,
            UpdateCategoryInput {
                name: body.name,
                slug: body.slug,
                parent_id: body.parent_id,
                sort_order: body.sort_order,
            },
        )
        .await?;
    Ok(Json(category.into()))
}

// ── DELETE /admin/categories/{id} ────────────────────────────────────────────

pub async fn delete_category(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = DeleteCategoryUseCase {
        categories: state.category_repo(),
    };
    usecase.execute(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
