use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::chat_messages;

use crate::domain::repository::ChatRepository;
use crate::domain::types::ChatMessage;
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbChatRepository {
    pub db: DatabaseConnection,
}

impl ChatRepository for DbChatRepository {
    async fn create(&self, message: &ChatMessage) -> Result<(), MarketError> {
        chat_messages::ActiveModel {
            id: Set(message.id),
            sender_id: Set(message.sender_id),
            recipient_id: Set(message.recipient_id),
            body: Set(message.body.clone()),
            read_at: Set(message.read_at),
            created_at: Set(message.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert chat message")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>, MarketError> {
        let model = chat_messages::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find chat message")?;
        Ok(model.map(message_from_model))
    }

    async fn conversation(
        &self,
        a: Uuid,
        b: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        let between = Condition::any()
            .add(
                Condition::all()
                    .add(chat_messages::Column::SenderId.eq(a))
                    .add(chat_messages::Column::RecipientId.eq(b)),
            )
            .add(
                Condition::all()
                    .add(chat_messages::Column::SenderId.eq(b))
                    .add(chat_messages::Column::RecipientId.eq(a)),
            );
        let models = chat_messages::Entity::find()
            .filter(between)
            .order_by_asc(chat_messages::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list conversation")?;
        Ok(models.into_iter().map(message_from_model).collect())
    }

    async fn inbox(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        let models = chat_messages::Entity::find()
            .filter(chat_messages::Column::RecipientId.eq(user_id))
            .order_by_desc(chat_messages::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list inbox")?;
        Ok(models.into_iter().map(message_from_model).collect())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<u64, MarketError> {
        let count = chat_messages::Entity::find()
            .filter(chat_messages::Column::RecipientId.eq(user_id))
            .filter(chat_messages::Column::ReadAt.is_null())
            .count(&self.db)
            .await
            .context("count unread messages")?;
        Ok(count)
    }

    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), MarketError> {
        chat_messages::Entity::update_many()
            .col_expr(chat_messages::Column::ReadAt, Expr::value(Some(at)))
            .filter(chat_messages::Column::Id.eq(id))
            .filter(chat_messages::Column::ReadAt.is_null())
            .exec(&self.db)
            .await
            .context("mark message read")?;
        Ok(())
    }
}

fn message_from_model(model: chat_messages::Model) -> ChatMessage {
    ChatMessage {
        id: model.id,
        sender_id: model.sender_id,
        recipient_id: model.recipient_id,
        body: model.body,
        read_at: model.read_at,
        created_at: model.created_at,
    }
}
