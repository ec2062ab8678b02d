use chrono::Utc;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;

use crate::domain::repository::{
    AuditRepository, OrderRepository, ProductRepository, ReviewRepository,
};
use crate::domain::types::{AuditEntry, ProductStatus, Review, ReviewStats};
use crate::error::MarketError;
use crate::usecase::optional_text;

const MAX_COMMENT_CHARS: usize = 2000;

// ── ListReviews ──────────────────────────────────────────────────────────────

pub struct ProductReviews {
    pub reviews: Vec<Review>,
    pub stats: ReviewStats,
}

pub struct ListReviewsUseCase<R: ReviewRepository, P: ProductRepository> {
    pub reviews: R,
    pub products: P,
}

impl<R: ReviewRepository, P: ProductRepository> ListReviewsUseCase<R, P> {
    pub async fn execute(
        &self,
        product_id: Uuid,
        page: PageRequest,
    ) -> Result<ProductReviews, MarketError> {
        if self.products.find_by_id(product_id).await?.is_none() {
            return Err(MarketError::ProductNotFound);
        }
        let reviews = self.reviews.list_for_product(product_id, page).await?;
        let stats = self.reviews.stats(product_id).await?;
        Ok(ProductReviews { reviews, stats })
    }
}

// ── CreateReview ─────────────────────────────────────────────────────────────

pub struct CreateReviewInput {
    pub rating: i16,
    pub comment: Option<String>,
}

pub struct CreateReviewUseCase<R: ReviewRepository, P: ProductRepository, O: OrderRepository> {
    pub reviews: R,
    pub products: P,
    pub orders: O,
}

impl<R: ReviewRepository, P: ProductRepository, O: OrderRepository> CreateReviewUseCase<R, P, O> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        input: CreateReviewInput,
    ) -> Result<Review, MarketError> {
        if !(1..=5).contains(&input.rating) {
            return Err(MarketError::InvalidInput("rating must be between 1 and 5"));
        }
        let comment = optional_text(
            input.comment.as_deref(),
            MAX_COMMENT_CHARS,
            "comment is too long",
        )?;
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(MarketError::ProductNotFound)?;
        if product.status == ProductStatus::Archived {
            return Err(MarketError::ProductUnavailable);
        }
        if !self.orders.has_purchased(user_id, product_id).await? {
            return Err(MarketError::NotPurchased);
        }
        if self.reviews.exists(product_id, user_id).await? {
            return Err(MarketError::ReviewAlreadyExists);
        }
        let review = Review {
            id: Uuid::now_v7(),
            product_id,
            user_id,
            rating: input.rating,
            comment,
            created_at: Utc::now(),
        };
        self.reviews.create(&review).await?;
        Ok(review)
    }
}

// ── DeleteReview ─────────────────────────────────────────────────────────────

pub struct DeleteReviewUseCase<R: ReviewRepository, L: AuditRepository> {
    pub reviews: R,
    pub audit: L,
}

impl<R: ReviewRepository, L: AuditRepository> DeleteReviewUseCase<R, L> {
    pub async fn execute(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        let review = self
            .reviews
            .find_by_id(id)
            .await?
            .ok_or(MarketError::ReviewNotFound)?;
        let is_author = review.user_id == actor.user_id;
        if !is_author && !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        self.reviews.delete(id).await?;
        if !is_author {
            self.audit
                .record(&AuditEntry::new(actor.user_id, "review.delete", "review", id))
                .await?;
        }
        Ok(())
    }
}
