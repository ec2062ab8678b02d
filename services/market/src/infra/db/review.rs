use anyhow::Context as _;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::reviews;

use super::map_unique_violation;
use crate::domain::repository::ReviewRepository;
use crate::domain::types::{Review, ReviewStats};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbReviewRepository {
    pub db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct StatsRow {
    count: i64,
    average: Option<Decimal>,
}

impl ReviewRepository for DbReviewRepository {
    async fn list_for_product(
        &self,
        product_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Review>, MarketError> {
        let models = reviews::Entity::find()
            .filter(reviews::Column::ProductId.eq(product_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list reviews")?;
        Ok(models.into_iter().map(review_from_model).collect())
    }

    async fn stats(&self, product_id: Uuid) -> Result<ReviewStats, MarketError> {
        let row = reviews::Entity::find()
            .select_only()
            .column_as(Expr::col(reviews::Column::Id).count(), "count")
            .column_as(
                Expr::expr(Func::avg(Expr::col(reviews::Column::Rating))),
                "average",
            )
            .filter(reviews::Column::ProductId.eq(product_id))
            .into_model::<StatsRow>()
            .one(&self.db)
            .await
            .context("review stats")?;
        Ok(row.map_or_else(ReviewStats::default, |row| ReviewStats {
            count: u64::try_from(row.count).unwrap_or_default(),
            average: row.average.map(|a| a.round_dp(2)),
        }))
    }

    async fn exists(&self, product_id: Uuid, user_id: Uuid) -> Result<bool, MarketError> {
        let count = reviews::Entity::find()
            .filter(reviews::Column::ProductId.eq(product_id))
            .filter(reviews::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .context("count user review")?;
        Ok(count > 0)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, MarketError> {
        let model = reviews::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find review")?;
        Ok(model.map(review_from_model))
    }

    async fn create(&self, review: &Review) -> Result<(), MarketError> {
        reviews::ActiveModel {
            id: Set(review.id),
            product_id: Set(review.product_id),
            user_id: Set(review.user_id),
            rating: Set(review.rating),
            comment: Set(review.comment.clone()),
            created_at: Set(review.created_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "insert review"))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), MarketError> {
        reviews::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete review")?;
        Ok(())
    }
}

fn review_from_model(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user_id: model.user_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at,
    }
}
