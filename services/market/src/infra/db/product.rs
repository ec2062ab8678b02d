use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use cmse_core::sea_ext::RandomSample;
use cmse_domain::pagination::PageRequest;
use cmse_market_schema::{order_details, products, stores};

use super::{insert_audit, like_pattern};
use crate::domain::repository::ProductRepository;
use crate::domain::types::{AuditEntry, Product, ProductFilter, ProductSort, ProductStatus};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbProductRepository {
    pub db: DatabaseConnection,
}

/// Approved products whose store is active.
fn public_products() -> Select<products::Entity> {
    products::Entity::find()
        .inner_join(stores::Entity)
        .filter(products::Column::Status.eq(ProductStatus::Approved.as_str()))
        .filter(stores::Column::IsActive.eq(true))
}

impl ProductRepository for DbProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, MarketError> {
        let model = products::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find product by id")?;
        Ok(model.map(product_from_model))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, MarketError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("find products by ids")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn list_public(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        let mut query = public_products();
        if let Some(ids) = &filter.category_ids {
            query = query.filter(products::Column::CategoryId.is_in(ids.iter().copied()));
        }
        if let Some(q) = &filter.q {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col((
                    products::Entity,
                    products::Column::Name,
                ))))
                .like(like_pattern(&q.to_lowercase())),
            );
        }
        if let Some(store_id) = filter.store_id {
            query = query.filter(products::Column::StoreId.eq(store_id));
        }
        query = match sort {
            ProductSort::Newest => query.order_by_desc(products::Column::CreatedAt),
            ProductSort::PriceAsc => query
                .order_by_asc(products::Column::Price)
                .order_by_desc(products::Column::CreatedAt),
            ProductSort::PriceDesc => query
                .order_by_desc(products::Column::Price)
                .order_by_desc(products::Column::CreatedAt),
            ProductSort::Name => query.order_by_asc(products::Column::Name),
        };
        let models = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list public products")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn random_public(&self, limit: u64) -> Result<Vec<Product>, MarketError> {
        let models = public_products()
            .random_sample(limit)
            .all(&self.db)
            .await
            .context("list random products")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn list_by_store(
        &self,
        store_id: Uuid,
        status: Option<ProductStatus>,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        let mut query = products::Entity::find().filter(products::Column::StoreId.eq(store_id));
        if let Some(status) = status {
            query = query.filter(products::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(products::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list store products")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn list_by_status(
        &self,
        status: ProductStatus,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        let models = products::Entity::find()
            .filter(products::Column::Status.eq(status.as_str()))
            .order_by_asc(products::Column::UpdatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list products by status")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn count_live(&self, store_id: Uuid) -> Result<u64, MarketError> {
        let count = products::Entity::find()
            .filter(products::Column::StoreId.eq(store_id))
            .filter(products::Column::Status.is_in([
                ProductStatus::Pending.as_str(),
                ProductStatus::Approved.as_str(),
            ]))
            .count(&self.db)
            .await
            .context("count live products")?;
        Ok(count)
    }

    async fn create(&self, product: &Product) -> Result<(), MarketError> {
        products::ActiveModel {
            id: Set(product.id),
            store_id: Set(product.store_id),
            category_id: Set(product.category_id),
            name: Set(product.name.clone()),
            description: Set(product.description.clone()),
            price: Set(product.price),
            stock: Set(product.stock),
            image: Set(product.image.clone()),
            status: Set(product.status.as_str().to_owned()),
            rejection_reason: Set(product.rejection_reason.clone()),
            created_at: Set(product.created_at),
            updated_at: Set(product.updated_at),
        }
        .insert(&self.db)
        .await
        .context("insert product")?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), MarketError> {
        products::ActiveModel {
            id: Set(product.id),
            category_id: Set(product.category_id),
            name: Set(product.name.clone()),
            description: Set(product.description.clone()),
            price: Set(product.price),
            stock: Set(product.stock),
            status: Set(product.status.as_str().to_owned()),
            rejection_reason: Set(product.rejection_reason.clone()),
            updated_at: Set(product.updated_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update product")?;
        Ok(())
    }

    async fn set_image(&self, id: Uuid, key: &str) -> Result<(), MarketError> {
        products::Entity::update_many()
            .col_expr(products::Column::Image, Expr::value(Some(key.to_owned())))
            .col_expr(
                products::Column::Status,
                Expr::value(ProductStatus::Pending.as_str()),
            )
            .col_expr(
                products::Column::RejectionReason,
                Expr::value(Option::<String>::None),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("set product image")?;
        Ok(())
    }

    async fn is_ordered(&self, id: Uuid) -> Result<bool, MarketError> {
        let count = order_details::Entity::find()
            .filter(order_details::Column::ProductId.eq(id))
            .count(&self.db)
            .await
            .context("count order lines for product")?;
        Ok(count > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<(), MarketError> {
        products::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete product")?;
        Ok(())
    }

    async fn decide(
        &self,
        id: Uuid,
        status: ProductStatus,
        reason: Option<&str>,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let txn = self.db.begin().await.context("begin product decision")?;
        let result = products::Entity::update_many()
            .col_expr(products::Column::Status, Expr::value(status.as_str()))
            .col_expr(
                products::Column::RejectionReason,
                Expr::value(reason.map(str::to_owned)),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(products::Column::Id.eq(id))
            .filter(products::Column::Status.eq(ProductStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .context("apply product decision")?;
        if result.rows_affected == 0 {
            return Ok(false);
        }
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit product decision")?;
        Ok(true)
    }
}

/// Unknown stored statuses are treated as archived so they never surface publicly.
pub(super) fn product_status_from_db(value: &str) -> ProductStatus {
    ProductStatus::parse(value).unwrap_or(ProductStatus::Archived)
}

pub(super) fn product_from_model(model: products::Model) -> Product {
    Product {
        id: model.id,
        store_id: model.store_id,
        category_id: model.category_id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        image: model.image,
        status: product_status_from_db(&model.status),
        rejection_reason: model.rejection_reason,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
