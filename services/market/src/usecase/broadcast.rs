use chrono::{DateTime, Utc};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;

use crate::domain::repository::{AuditRepository, BroadcastRepository};
use crate::domain::types::{AuditEntry, Broadcast};
use crate::error::MarketError;
use crate::usecase::required_text;

pub struct ListActiveBroadcastsUseCase<B: BroadcastRepository> {
    pub broadcasts: B,
}

impl<B: BroadcastRepository> ListActiveBroadcastsUseCase<B> {
    pub async fn execute(&self) -> Result<Vec<Broadcast>, MarketError> {
        let now = Utc::now();
        let mut active = self.broadcasts.list_active(now).await?;
        active.retain(|b| b.is_visible(now));
        Ok(active)
    }
}

pub struct CreateBroadcastInput {
    pub title: String,
    pub body: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct ManageBroadcastsUseCase<B: BroadcastRepository, L: AuditRepository> {
    pub broadcasts: B,
    pub audit: L,
}

impl<B: BroadcastRepository, L: AuditRepository> ManageBroadcastsUseCase<B, L> {
    pub async fn list(
        &self,
        actor: &Identity,
        page: PageRequest,
    ) -> Result<Vec<Broadcast>, MarketError> {
        if !actor.has_role(UserRole::SuperAdmin) {
            return Err(MarketError::Forbidden);
        }
        self.broadcasts.list(page).await
    }

    pub async fn create(
        &self,
        actor: &Identity,
        input: CreateBroadcastInput,
    ) -> Result<Broadcast, MarketError> {
        if !actor.has_role(UserRole::SuperAdmin) {
            return Err(MarketError::Forbidden);
        }
        let title = required_text(&input.title, 200, "title is too long")?;
        let body = required_text(&input.body, 4000, "body is too long")?;
        let now = Utc::now();
        let starts_at = input.starts_at.unwrap_or(now);
        if input.expires_at.is_some_and(|exp| exp <= starts_at) {
            return Err(MarketError::InvalidInput("expiry must be after the start"));
        }
        let broadcast = Broadcast {
            id: Uuid::now_v7(),
            title,
            body,
            created_by: actor.user_id,
            starts_at,
            expires_at: input.expires_at,
            is_active: true,
            created_at: now,
        };
        self.broadcasts.create(&broadcast).await?;
        self.audit
            .record(&AuditEntry::new(
                actor.user_id,
                "broadcast.create",
                "broadcast",
                broadcast.id,
            ))
            .await?;
        Ok(broadcast)
    }

    pub async fn deactivate(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        if !actor.has_role(UserRole::SuperAdmin) {
            return Err(MarketError::Forbidden);
        }
        if self.broadcasts.find_by_id(id).await?.is_none() {
            return Err(MarketError::BroadcastNotFound);
        }
        self.broadcasts.deactivate(id).await?;
        self.audit
            .record(&AuditEntry::new(
                actor.user_id,
                "broadcast.deactivate",
                "broadcast",
                id,
            ))
            .await
    }
}
