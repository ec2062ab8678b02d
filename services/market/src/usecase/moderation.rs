use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;

use crate::domain::repository::{AccountRepository, FileStorage};
use crate::domain::types::{AuditEntry, Profile, User};
use crate::error::MarketError;

fn require_admin(actor: &Identity) -> Result<(), MarketError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(MarketError::Forbidden)
    }
}

async fn delete_quietly<F: FileStorage>(storage: &F, key: &str) {
    if let Err(e) = storage.delete(key).await {
        tracing::warn!(error = ?e, key, "failed to delete profile image");
    }
}

// ── Profile images ───────────────────────────────────────────────────────────

pub struct ListPendingProfileImagesUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> ListPendingProfileImagesUseCase<A> {
    pub async fn execute(
        &self,
        actor: &Identity,
        page: PageRequest,
    ) -> Result<Vec<Profile>, MarketError> {
        require_admin(actor)?;
        self.accounts.list_pending_images(page).await
    }
}

pub struct ReviewProfileImageUseCase<A: AccountRepository, F: FileStorage> {
    pub accounts: A,
    pub storage: F,
}

impl<A: AccountRepository, F: FileStorage> ReviewProfileImageUseCase<A, F> {
    async fn pending(&self, user_id: Uuid) -> Result<(Profile, String), MarketError> {
        let profile = self
            .accounts
            .find_profile(user_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;
        let pending = profile
            .pending_profile_image
            .clone()
            .ok_or(MarketError::InvalidState)?;
        Ok((profile, pending))
    }

    /// Promote the pending image. The previously approved file is removed.
    pub async fn approve(&self, actor: &Identity, user_id: Uuid) -> Result<(), MarketError> {
        require_admin(actor)?;
        let (profile, pending) = self.pending(user_id).await?;
        let audit = AuditEntry::new(actor.user_id, "profile_image.approve", "user", user_id)
            .with_details(pending.clone());
        self.accounts
            .approve_pending_image(user_id, &pending, &audit)
            .await?;
        if let Some(old) = profile.profile_image.filter(|old| *old != pending) {
            delete_quietly(&self.storage, &old).await;
        }
        Ok(())
    }

    pub async fn reject(&self, actor: &Identity, user_id: Uuid) -> Result<(), MarketError> {
        require_admin(actor)?;
        let (_, pending) = self.pending(user_id).await?;
        let audit = AuditEntry::new(actor.user_id, "profile_image.reject", "user", user_id)
            .with_details(pending.clone());
        self.accounts.clear_pending_image(user_id, &audit).await?;
        delete_quietly(&self.storage, &pending).await;
        Ok(())
    }
}

// ── Users ────────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> ListUsersUseCase<A> {
    pub async fn execute(
        &self,
        actor: &Identity,
        role: Option<UserRole>,
        q: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<User>, MarketError> {
        require_admin(actor)?;
        let q = q.map(str::trim).filter(|q| !q.is_empty());
        self.accounts.list_users(role, q, page).await
    }
}

pub struct SetUserLockedUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> SetUserLockedUseCase<A> {
    /// Admins cannot lock themselves or anyone at or above their own role.
    pub async fn execute(
        &self,
        actor: &Identity,
        user_id: Uuid,
        locked: bool,
    ) -> Result<(), MarketError> {
        require_admin(actor)?;
        if user_id == actor.user_id {
            return Err(MarketError::Forbidden);
        }
        let target = self
            .accounts
            .find_user(user_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;
        if target.role >= actor.role {
            return Err(MarketError::Forbidden);
        }
        let action = if locked { "user.lock" } else { "user.unlock" };
        let audit = AuditEntry::new(actor.user_id, action, "user", user_id);
        self.accounts.set_locked(user_id, locked, &audit).await?;
        tracing::info!(user_id = %user_id, locked, by = %actor.user_id, "user lock changed");
        Ok(())
    }
}

pub struct SetUserRoleUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> SetUserRoleUseCase<A> {
    pub async fn execute(
        &self,
        actor: &Identity,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<(), MarketError> {
        if !actor.has_role(UserRole::SuperAdmin) || user_id == actor.user_id {
            return Err(MarketError::Forbidden);
        }
        let target = self
            .accounts
            .find_user(user_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;
        if role == UserRole::Seller && target.its_number.is_none() {
            return Err(MarketError::InvalidItsNumber);
        }
        if target.role == role {
            return Ok(());
        }
        let audit = AuditEntry::new(actor.user_id, "user.role", "user", user_id).with_details(
            format!("{} -> {}", target.role.as_str(), role.as_str()),
        );
        self.accounts.set_role(user_id, role, &audit).await
    }
}
