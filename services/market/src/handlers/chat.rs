use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;

use crate::domain::types::ChatMessage;
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::chat::{ConversationUseCase, InboxUseCase, MarkReadUseCase, SendMessageUseCase};

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub read_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            body: message.body,
            read_at: message.read_at,
            created_at: message.created_at,
        }
    }
}

// ── POST /messages ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub body: String,
}

pub async fn send_message(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), MarketError> {
    let usecase = SendMessageUseCase {
        chat: state.chat_repo(),
        accounts: state.account_repo(),
    };
    let message = usecase
        .execute(identity.user_id, body.recipient_id, &body.body)
        .await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

// ── GET /messages/inbox ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct InboxResponse {
    pub messages: Vec<MessageResponse>,
    pub unread: u64,
}

pub async fn inbox(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<InboxResponse>, MarketError> {
    let usecase = InboxUseCase {
        chat: state.chat_repo(),
    };
    let inbox = usecase
        .execute(identity.user_id, query.page_request())
        .await?;
    Ok(Json(InboxResponse {
        messages: inbox.messages.into_iter().map(Into::into).collect(),
        unread: inbox.unread,
    }))
}

// ── GET /messages/with/{user_id} ─────────────────────────────────────────────

pub async fn conversation(
    identity: Identity,
    State(state): State<AppState>,
    Path(other_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MessageResponse>>, MarketError> {
    let usecase = ConversationUseCase {
        chat: state.chat_repo(),
    };
    let messages = usecase
        .execute(identity.user_id, other_id, query.page_request())
        .await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

// ── POST /messages/{id}/read ─────────────────────────────────────────────────

pub async fn mark_read(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = MarkReadUseCase {
        chat: state.chat_repo(),
    };
    usecase.execute(identity.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
