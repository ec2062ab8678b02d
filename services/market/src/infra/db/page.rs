use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use cmse_market_schema::pages;

use super::map_unique_violation;
use crate::domain::repository::PageRepository;
use crate::domain::types::Page;
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbPageRepository {
    pub db: DatabaseConnection,
}

impl PageRepository for DbPageRepository {
    async fn list(&self, published_only: bool) -> Result<Vec<Page>, MarketError> {
        let mut query = pages::Entity::find();
        if published_only {
            query = query.filter(pages::Column::IsPublished.eq(true));
        }
        let models = query
            .order_by_asc(pages::Column::SortOrder)
            .order_by_asc(pages::Column::Title)
            .all(&self.db)
            .await
            .context("list pages")?;
        Ok(models.into_iter().map(page_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>, MarketError> {
        let model = pages::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find page by id")?;
        Ok(model.map(page_from_model))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, MarketError> {
        let model = pages::Entity::find()
            .filter(pages::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find page by slug")?;
        Ok(model.map(page_from_model))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError> {
        let mut query = pages::Entity::find().filter(pages::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(pages::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.context("count page slug")?;
        Ok(count > 0)
    }

    async fn create(&self, page: &Page) -> Result<(), MarketError> {
        pages::ActiveModel {
            id: Set(page.id),
            title: Set(page.title.clone()),
            slug: Set(page.slug.clone()),
            content: Set(page.content.clone()),
            sort_order: Set(page.sort_order),
            is_published: Set(page.is_published),
            created_at: Set(page.created_at),
            updated_at: Set(page.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "insert page"))?;
        Ok(())
    }

    async fn update(&self, page: &Page) -> Result<(), MarketError> {
        pages::ActiveModel {
            id: Set(page.id),
            title: Set(page.title.clone()),
            slug: Set(page.slug.clone()),
            content: Set(page.content.clone()),
            sort_order: Set(page.sort_order),
            is_published: Set(page.is_published),
            updated_at: Set(page.updated_at),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "update page"))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), MarketError> {
        pages::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete page")?;
        Ok(())
    }
}

fn page_from_model(model: pages::Model) -> Page {
    Page {
        id: model.id,
        title: model.title,
        slug: model.slug,
        content: model.content,
        sort_order: model.sort_order,
        is_published: model.is_published,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
