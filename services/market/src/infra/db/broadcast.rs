use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::broadcast_messages;

use crate::domain::repository::BroadcastRepository;
use crate::domain::types::Broadcast;
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbBroadcastRepository {
    pub db: DatabaseConnection,
}

impl BroadcastRepository for DbBroadcastRepository {
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Broadcast>, MarketError> {
        let models = broadcast_messages::Entity::find()
            .filter(broadcast_messages::Column::IsActive.eq(true))
            .filter(broadcast_messages::Column::StartsAt.lte(now))
            .filter(
                Condition::any()
                    .add(broadcast_messages::Column::ExpiresAt.is_null())
                    .add(broadcast_messages::Column::ExpiresAt.gt(now)),
            )
            .order_by_desc(broadcast_messages::Column::StartsAt)
            .all(&self.db)
            .await
            .context("list active broadcasts")?;
        Ok(models.into_iter().map(broadcast_from_model).collect())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Broadcast>, MarketError> {
        let models = broadcast_messages::Entity::find()
            .order_by_desc(broadcast_messages::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list broadcasts")?;
        Ok(models.into_iter().map(broadcast_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Broadcast>, MarketError> {
        let model = broadcast_messages::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find broadcast")?;
        Ok(model.map(broadcast_from_model))
    }

    async fn create(&self, broadcast: &Broadcast) -> Result<(), MarketError> {
        broadcast_messages::ActiveModel {
            id: Set(broadcast.id),
            title: Set(broadcast.title.clone()),
            body: Set(broadcast.body.clone()),
            created_by: Set(broadcast.created_by),
            starts_at: Set(broadcast.starts_at),
            expires_at: Set(broadcast.expires_at),
            is_active: Set(broadcast.is_active),
            created_at: Set(broadcast.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert broadcast")?;
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), MarketError> {
        broadcast_messages::Entity::update_many()
            .col_expr(broadcast_messages::Column::IsActive, Expr::value(false))
            .filter(broadcast_messages::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("deactivate broadcast")?;
        Ok(())
    }
}

fn broadcast_from_model(model: broadcast_messages::Model) -> Broadcast {
    Broadcast {
        id: model.id,
        title: model.title,
        body: model.body,
        created_by: model.created_by,
        starts_at: model.starts_at,
        expires_at: model.expires_at,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}
