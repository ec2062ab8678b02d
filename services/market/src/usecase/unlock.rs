use chrono::Utc;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::account::normalize_email;
use cmse_domain::pagination::PageRequest;

use crate::domain::repository::{AccountRepository, UnlockRequestRepository};
use crate::domain::types::{AuditEntry, RequestStatus, UnlockRequest};
use crate::error::MarketError;
use crate::usecase::required_text;

const MAX_REASON_CHARS: usize = 1000;

// ── SubmitUnlockRequest (anonymous) ──────────────────────────────────────────

pub struct SubmitUnlockRequestUseCase<A: AccountRepository, U: UnlockRequestRepository> {
    pub accounts: A,
    pub unlocks: U,
}

impl<A: AccountRepository, U: UnlockRequestRepository> SubmitUnlockRequestUseCase<A, U> {
    pub async fn execute(&self, email: &str, reason: &str) -> Result<UnlockRequest, MarketError> {
        let reason = required_text(reason, MAX_REASON_CHARS, "reason is too long")?;
        let email = normalize_email(email).ok_or(MarketError::InvalidEmail)?;
        let user = self
            .accounts
            .find_user_by_email(&email)
            .await?
            .ok_or(MarketError::UserNotFound)?;
        if !user.is_locked {
            return Err(MarketError::AccountNotLocked);
        }
        if self.unlocks.has_pending(user.id).await? {
            return Err(MarketError::RequestAlreadyPending);
        }
        let request = UnlockRequest {
            id: Uuid::now_v7(),
            user_id: user.id,
            reason,
            status: RequestStatus::Pending,
            decided_by: None,
            decided_at: None,
            created_at: Utc::now(),
        };
        self.unlocks.create(&request).await?;
        Ok(request)
    }
}

// ── Admin ────────────────────────────────────────────────────────────────────

pub struct ListUnlockRequestsUseCase<U: UnlockRequestRepository> {
    pub unlocks: U,
}

impl<U: UnlockRequestRepository> ListUnlockRequestsUseCase<U> {
    pub async fn execute(
        &self,
        actor: &Identity,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<UnlockRequest>, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        self.unlocks.list(status, page).await
    }
}

pub struct DecideUnlockRequestUseCase<U: UnlockRequestRepository> {
    pub unlocks: U,
}

impl<U: UnlockRequestRepository> DecideUnlockRequestUseCase<U> {
    /// Approval unlocks the account.
    pub async fn approve(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        self.decide(actor, id, RequestStatus::Approved).await
    }

    pub async fn reject(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        self.decide(actor, id, RequestStatus::Rejected).await
    }

    async fn decide(
        &self,
        actor: &Identity,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<(), MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let request = self
            .unlocks
            .find_by_id(id)
            .await?
            .ok_or(MarketError::RequestNotFound)?;
        if request.status != RequestStatus::Pending {
            return Err(MarketError::InvalidState);
        }
        let action = match status {
            RequestStatus::Approved => "unlock.approve",
            _ => "unlock.reject",
        };
        let audit = AuditEntry::new(actor.user_id, action, "unlock_request", id)
            .with_details(format!("user {}", request.user_id));
        if !self
            .unlocks
            .decide(&request, status, actor.user_id, &audit)
            .await?
        {
            return Err(MarketError::InvalidState);
        }
        Ok(())
    }
}
