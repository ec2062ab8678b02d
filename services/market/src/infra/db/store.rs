use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::stores;

use super::{insert_audit, map_unique_violation};
use crate::domain::repository::StoreRepository;
use crate::domain::types::{AuditEntry, Store};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbStoreRepository {
    pub db: DatabaseConnection,
}

impl StoreRepository for DbStoreRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, MarketError> {
        let model = stores::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find store by id")?;
        Ok(model.map(store_from_model))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Store>, MarketError> {
        let model = stores::Entity::find()
            .filter(stores::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find store by slug")?;
        Ok(model.map(store_from_model))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Store>, MarketError> {
        let model = stores::Entity::find()
            .filter(stores::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await
            .context("find store by owner")?;
        Ok(model.map(store_from_model))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError> {
        let mut query = stores::Entity::find().filter(stores::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(stores::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.context("count store slug")?;
        Ok(count > 0)
    }

    async fn list_active(&self, page: PageRequest) -> Result<Vec<Store>, MarketError> {
        let models = stores::Entity::find()
            .filter(stores::Column::IsActive.eq(true))
            .order_by_desc(stores::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list active stores")?;
        Ok(models.into_iter().map(store_from_model).collect())
    }

    async fn create(&self, store: &Store) -> Result<(), MarketError> {
        stores::ActiveModel {
            id: Set(store.id),
            owner_id: Set(store.owner_id),
            name: Set(store.name.clone()),
            slug: Set(store.slug.clone()),
            description: Set(store.description.clone()),
            contact_email: Set(store.contact_email.clone()),
            is_active: Set(store.is_active),
            created_at: Set(store.created_at),
            updated_at: Set(store.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "insert store"))?;
        Ok(())
    }

    async fn update(&self, store: &Store) -> Result<(), MarketError> {
        stores::ActiveModel {
            id: Set(store.id),
            name: Set(store.name.clone()),
            slug: Set(store.slug.clone()),
            description: Set(store.description.clone()),
            contact_email: Set(store.contact_email.clone()),
            updated_at: Set(store.updated_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "update store"))?;
        Ok(())
    }

    async fn set_active(
        &self,
        id: Uuid,
        active: bool,
        audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin store activation")?;
        stores::Entity::update_many()
            .col_expr(stores::Column::IsActive, Expr::value(active))
            .col_expr(stores::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(stores::Column::Id.eq(id))
            .exec(&txn)
            .await
            .context("set store active")?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit store activation")?;
        Ok(())
    }
}

fn store_from_model(model: stores::Model) -> Store {
    Store {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        contact_email: model.contact_email,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
