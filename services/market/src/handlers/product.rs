use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::{Identity, MaybeIdentity};

use crate::domain::types::{Product, ProductSort, ProductStatus};
use crate::error::MarketError;
use crate::handlers::account::UploadResponse;
use crate::handlers::{ListQuery, read_upload};
use crate::state::AppState;
use crate::usecase::product::{
    CreateProductInput, CreateProductUseCase, DeleteOutcome, DeleteProductUseCase,
    FeaturedProductsUseCase, GetProductUseCase, ListMyProductsUseCase,
    ListPendingProductsUseCase, ListProductsUseCase, ModerateProductUseCase, ProductQuery,
    UpdateProductInput, UpdateProductUseCase, UploadProductImageUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub store_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
    pub status: ProductStatus,
    pub rejection_reason: Option<String>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            store_id: product.store_id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image: product.image,
            status: product.status,
            rejection_reason: product.rejection_reason,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

fn product_list(products: Vec<Product>) -> Json<Vec<ProductResponse>> {
    Json(products.into_iter().map(Into::into).collect())
}

// ── Query params ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ProductListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub store: Option<String>,
    pub sort: Option<String>,
}

// ── GET /products ────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, MarketError> {
    let sort = query
        .sort
        .as_deref()
        .and_then(ProductSort::from_kebab_case)
        .unwrap_or_default();
    let page = ListQuery {
        per_page: query.per_page,
        page: query.page,
    }
    .page_request();

    let usecase = ListProductsUseCase {
        products: state.product_repo(),
        categories: state.category_repo(),
        stores: state.store_repo(),
    };
    let products = usecase
        .execute(
            ProductQuery {
                category: query.category,
                q: query.q,
                store: query.store,
                sort,
            },
            page,
        )
        .await?;
    Ok(product_list(products))
}

// ── GET /products/featured ───────────────────────────────────────────────────

pub async fn featured_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, MarketError> {
    let usecase = FeaturedProductsUseCase {
        products: state.product_repo(),
    };
    Ok(product_list(usecase.execute().await?))
}

// ── GET /products/{id} ───────────────────────────────────────────────────────

pub async fn get_product(
    MaybeIdentity(identity): MaybeIdentity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, MarketError> {
    let usecase = GetProductUseCase {
        products: state.product_repo(),
        stores: state.store_repo(),
    };
    let product = usecase.execute(identity.as_ref(), id).await?;
    Ok(Json(product.into()))
}

// ── POST /products ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
}

pub async fn create_product(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), MarketError> {
    let usecase = CreateProductUseCase {
        products: state.product_repo(),
        stores: state.store_repo(),
        categories: state.category_repo(),
        accounts: state.account_repo(),
    };
    let product = usecase
        .execute(
            &identity,
            CreateProductInput {
                category_id: body.category_id,
                name: body.name,
                description: body.description,
                price: body.price,
                stock: body.stock,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

// ── PATCH /products/{id} ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

pub async fn update_product(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, MarketError> {
    let usecase = UpdateProductUseCase {
        products: state.product_repo(),
        stores: state.store_repo(),
        categories: state.category_repo(),
    };
    let product = usecase
        .execute(
            &identity,
            id,
            UpdateProductInput {
                category_id: body.category_id,
                name: body.name,
                description: body.description,
                price: body.price,
                stock: body.stock,
            },
        )
        .await?;
    Ok(Json(product.into()))
}

// ── DELETE /products/{id} ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ArchivedResponse {
    pub status: ProductStatus,
}

/// 204 when the row is gone, 200 with the new status when it was archived instead.
pub async fn delete_product(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, MarketError> {
    let usecase = DeleteProductUseCase {
        products: state.product_repo(),
        stores: state.store_repo(),
        audit: state.audit_repo(),
    };
    let response = match usecase.execute(&identity, id).await? {
        DeleteOutcome::Deleted => StatusCode::NO_CONTENT.into_response(),
        DeleteOutcome::Archived => Json(ArchivedResponse {
            status: ProductStatus::Archived,
        })
        .into_response(),
    };
    Ok(response)
}

// ── PUT /products/{id}/image ─────────────────────────────────────────────────

pub async fn upload_product_image(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, MarketError> {
    let upload = read_upload(multipart).await?;
    let usecase = UploadProductImageUseCase {
        products: state.product_repo(),
        stores: state.store_repo(),
        storage: state.storage(),
        max_upload_bytes: state.max_upload_bytes,
    };
    let key = usecase
        .execute(&identity, id, &upload.filename, &upload.bytes)
        .await?;
    Ok(Json(UploadResponse { key }))
}

// ── GET /users/@me/products ──────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct MyProductsQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub status: Option<String>,
}

pub async fn list_my_products(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<MyProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, MarketError> {
    let status = query
        .status
        .as_deref()
        .map(|s| ProductStatus::parse(s).ok_or(MarketError::InvalidInput("unknown status")))
        .transpose()?;
    let page = ListQuery {
        per_page: query.per_page,
        page: query.page,
    }
    .page_request();

    let usecase = ListMyProductsUseCase {
        products: state.product_repo(),
        stores: state.store_repo(),
    };
    Ok(product_list(
        usecase.execute(identity.user_id, status, page).await?,
    ))
}

// ── GET /admin/products/pending ──────────────────────────────────────────────

pub async fn list_pending_products(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>, MarketError> {
    let usecase = ListPendingProductsUseCase {
        products: state.product_repo(),
    };
    Ok(product_list(
        usecase.execute(&identity, query.page_request()).await?,
    ))
}

// ── POST /admin/products/{id}/approve ────────────────────────────────────────

pub async fn approve_product(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = ModerateProductUseCase {
        products: state.product_repo(),
    };
    usecase.approve(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /admin/products/{id}/reject ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

pub async fn reject_product(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<StatusCode, MarketError> {
    let usecase = ModerateProductUseCase {
        products: state.product_repo(),
    };
    usecase.reject(&identity, id, &body.reason).await?;
    Ok(StatusCode::NO_CONTENT)
}
