use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use cmse_market_schema::{categories, products};

use super::{insert_audit, map_unique_violation};
use crate::domain::repository::CategoryRepository;
use crate::domain::types::{AuditEntry, Category};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbCategoryRepository {
    pub db: DatabaseConnection,
}

impl CategoryRepository for DbCategoryRepository {
    async fn list_all(&self) -> Result<Vec<Category>, MarketError> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::SortOrder)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
            .context("list categories")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, MarketError> {
        let model = categories::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find category by id")?;
        Ok(model.map(category_from_model))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, MarketError> {
        let model = categories::Entity::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find category by slug")?;
        Ok(model.map(category_from_model))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError> {
        let mut query = categories::Entity::find().filter(categories::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(categories::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.context("count category slug")?;
        Ok(count > 0)
    }

    async fn is_in_use(&self, id: Uuid) -> Result<bool, MarketError> {
        let children = categories::Entity::find()
            .filter(categories::Column::ParentId.eq(id))
            .count(&self.db)
            .await
            .context("count child categories")?;
        if children > 0 {
            return Ok(true);
        }
        let products = products::Entity::find()
            .filter(products::Column::CategoryId.eq(id))
            .count(&self.db)
            .await
            .context("count category products")?;
        Ok(products > 0)
    }

    async fn create(&self, category: &Category, audit: &AuditEntry) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin category create")?;
        categories::ActiveModel {
            id: Set(category.id),
            name: Set(category.name.clone()),
            slug: Set(category.slug.clone()),
            parent_id: Set(category.parent_id),
            sort_order: Set(category.sort_order),
            created_at: Set(category.created_at),
        }
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, "insert category"))?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit category create")?;
        Ok(())
    }

    async fn update(&self, category: &Category, audit: &AuditEntry) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin category update")?;
        categories::ActiveModel {
            id: Set(category.id),
            name: Set(category.name.clone()),
            slug: Set(category.slug.clone()),
            parent_id: Set(category.parent_id),
            sort_order: Set(category.sort_order),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| map_unique_violation(e, "update category"))?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit category update")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid, audit: &AuditEntry) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin category delete")?;
        categories::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete category")?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit category delete")?;
        Ok(())
    }
}

fn category_from_model(model: categories::Model) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        parent_id: model.parent_id,
        sort_order: model.sort_order,
        created_at: model.created_at,
    }
}
