use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::types::Review;
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::review::{
    CreateReviewInput, CreateReviewUseCase, DeleteReviewUseCase, ListReviewsUseCase,
};

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            product_id: review.product_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ProductReviewsResponse {
    pub reviews: Vec<ReviewResponse>,
    pub count: u64,
    pub average_rating: Option<Decimal>,
}

// ── GET /products/{id}/reviews ───────────────────────────────────────────────

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductReviewsResponse>, MarketError> {
    let usecase = ListReviewsUseCase {
        reviews: state.review_repo(),
        products: state.product_repo(),
    };
    let out = usecase.execute(product_id, query.page_request()).await?;
    Ok(Json(ProductReviewsResponse {
        reviews: out.reviews.into_iter().map(Into::into).collect(),
        count: out.stats.count,
        average_rating: out.stats.average,
    }))
}

// ── POST /products/{id}/reviews ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub comment: Option<String>,
}

pub async fn create_review(
    identity: Identity,
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), MarketError> {
    let usecase = CreateReviewUseCase {
        reviews: state.review_repo(),
        products: state.product_repo(),
        orders: state.order_repo(),
    };
    let review = usecase
        .execute(
            identity.user_id,
            product_id,
            CreateReviewInput {
                rating: body.rating,
                comment: body.comment,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

// ── DELETE /reviews/{id} ─────────────────────────────────────────────────────

pub async fn delete_review(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = DeleteReviewUseCase {
        reviews: state.review_repo(),
        audit: state.audit_repo(),
    };
    usecase.execute(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
