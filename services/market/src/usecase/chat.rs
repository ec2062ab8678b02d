use chrono::Utc;
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;

use crate::domain::repository::{AccountRepository, ChatRepository};
use crate::domain::types::ChatMessage;
use crate::error::MarketError;
use crate::usecase::required_text;

const MAX_MESSAGE_CHARS: usize = 2000;

pub struct SendMessageUseCase<C: ChatRepository, A: AccountRepository> {
    pub chat: C,
    pub accounts: A,
}

impl<C: ChatRepository, A: AccountRepository> SendMessageUseCase<C, A> {
    pub async fn execute(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        body: &str,
    ) -> Result<ChatMessage, MarketError> {
        if sender_id == recipient_id {
            return Err(MarketError::InvalidInput("cannot send a message to yourself"));
        }
        let body = required_text(body, MAX_MESSAGE_CHARS, "message is too long")?;
        if self.accounts.find_user(recipient_id).await?.is_none() {
            return Err(MarketError::UserNotFound);
        }
        let message = ChatMessage {
            id: Uuid::now_v7(),
            sender_id,
            recipient_id,
            body,
            read_at: None,
            created_at: Utc::now(),
        };
        self.chat.create(&message).await?;
        Ok(message)
    }
}

pub struct ConversationUseCase<C: ChatRepository> {
    pub chat: C,
}

impl<C: ChatRepository> ConversationUseCase<C> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        self.chat.conversation(user_id, other_id, page).await
    }
}

pub struct Inbox {
    pub messages: Vec<ChatMessage>,
    pub unread: u64,
}

pub struct InboxUseCase<C: ChatRepository> {
    pub chat: C,
}

impl<C: ChatRepository> InboxUseCase<C> {
    pub async fn execute(&self, user_id: Uuid, page: PageRequest) -> Result<Inbox, MarketError> {
        let messages = self.chat.inbox(user_id, page).await?;
        let unread = self.chat.unread_count(user_id).await?;
        Ok(Inbox { messages, unread })
    }
}

pub struct MarkReadUseCase<C: ChatRepository> {
    pub chat: C,
}

impl<C: ChatRepository> MarkReadUseCase<C> {
    /// Only the recipient may mark a message. Repeating the call is a no-op.
    pub async fn execute(&self, user_id: Uuid, message_id: Uuid) -> Result<(), MarketError> {
        let message = self
            .chat
            .find_by_id(message_id)
            .await?
            .filter(|m| m.sender_id == user_id || m.recipient_id == user_id)
            .ok_or(MarketError::MessageNotFound)?;
        if message.recipient_id != user_id {
            return Err(MarketError::Forbidden);
        }
        if message.read_at.is_none() {
            self.chat.mark_read(message_id, Utc::now()).await?;
        }
        Ok(())
    }
}
