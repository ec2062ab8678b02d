use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;

use crate::domain::repository::{
    AccountRepository, AuditRepository, SubscriptionRepository, TierInput,
};
use crate::domain::subscription::{Proration, prorate};
use crate::domain::types::{
    AuditEntry, DEFAULT_PRODUCT_LIMIT, Profile, RequestStatus, SubscriptionRequest,
    SubscriptionState, Tier,
};
use crate::error::MarketError;
use crate::usecase::{optional_text, required_text};

fn require_superadmin(actor: &Identity) -> Result<(), MarketError> {
    if actor.has_role(UserRole::SuperAdmin) {
        Ok(())
    } else {
        Err(MarketError::Forbidden)
    }
}

fn check_tier_input(input: &TierInput) -> Result<TierInput, MarketError> {
    let name = required_text(&input.name, 80, "tier name is too long")?;
    let description = optional_text(input.description.as_deref(), 2000, "description is too long")?;
    if input.price < Decimal::ZERO {
        return Err(MarketError::InvalidInput("price cannot be negative"));
    }
    if input.product_limit < 1 {
        return Err(MarketError::InvalidInput("product limit must be at least 1"));
    }
    if input.duration_days < 1 {
        return Err(MarketError::InvalidInput("duration must be at least one day"));
    }
    Ok(TierInput {
        name,
        description,
        price: input.price.round_dp(2),
        product_limit: input.product_limit,
        duration_days: input.duration_days,
    })
}

// ── Tiers ────────────────────────────────────────────────────────────────────

pub struct ListTiersUseCase<T: SubscriptionRepository> {
    pub subscriptions: T,
}

impl<T: SubscriptionRepository> ListTiersUseCase<T> {
    /// Active tiers by price. Inactive ones are included only for superadmins.
    pub async fn execute(&self, viewer: Option<&Identity>) -> Result<Vec<Tier>, MarketError> {
        let include_inactive = viewer.is_some_and(|v| v.has_role(UserRole::SuperAdmin));
        self.subscriptions.list_tiers(include_inactive).await
    }
}

pub struct CreateTierUseCase<T: SubscriptionRepository, L: AuditRepository> {
    pub subscriptions: T,
    pub audit: L,
}

impl<T: SubscriptionRepository, L: AuditRepository> CreateTierUseCase<T, L> {
    pub async fn execute(&self, actor: &Identity, input: TierInput) -> Result<Tier, MarketError> {
        require_superadmin(actor)?;
        let input = check_tier_input(&input)?;
        if self.subscriptions.tier_name_taken(&input.name, None).await? {
            return Err(MarketError::TierNameTaken);
        }
        let tier = self.subscriptions.create_tier(&input).await?;
        self.audit
            .record(
                &AuditEntry::new(actor.user_id, "tier.create", "tier", tier.id)
                    .with_details(tier.name.clone()),
            )
            .await?;
        Ok(tier)
    }
}

pub struct UpdateTierUseCase<T: SubscriptionRepository, L: AuditRepository> {
    pub subscriptions: T,
    pub audit: L,
}

impl<T: SubscriptionRepository, L: AuditRepository> UpdateTierUseCase<T, L> {
    /// Existing subscribers keep the limit they were granted until their next approval.
    pub async fn execute(
        &self,
        actor: &Identity,
        id: i32,
        input: TierInput,
    ) -> Result<(), MarketError> {
        require_superadmin(actor)?;
        if self.subscriptions.find_tier(id).await?.is_none() {
            return Err(MarketError::TierNotFound);
        }
        let input = check_tier_input(&input)?;
        if self
            .subscriptions
            .tier_name_taken(&input.name, Some(id))
            .await?
        {
            return Err(MarketError::TierNameTaken);
        }
        self.subscriptions.update_tier(id, &input).await?;
        self.audit
            .record(&AuditEntry::new(actor.user_id, "tier.update", "tier", id))
            .await
    }
}

pub struct SetTierActiveUseCase<T: SubscriptionRepository, L: AuditRepository> {
    pub subscriptions: T,
    pub audit: L,
}

impl<T: SubscriptionRepository, L: AuditRepository> SetTierActiveUseCase<T, L> {
    pub async fn execute(
        &self,
        actor: &Identity,
        id: i32,
        active: bool,
    ) -> Result<(), MarketError> {
        require_superadmin(actor)?;
        if self.subscriptions.find_tier(id).await?.is_none() {
            return Err(MarketError::TierNotFound);
        }
        self.subscriptions.set_tier_active(id, active).await?;
        let action = if active { "tier.activate" } else { "tier.deactivate" };
        self.audit
            .record(&AuditEntry::new(actor.user_id, action, "tier", id))
            .await
    }
}

// ── Quote / Request upgrade ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UpgradeQuote {
    pub current: Option<Tier>,
    pub target: Tier,
    pub proration: Proration,
}

/// Validate an upgrade from the user's current subscription to `tier_id`.
async fn plan_upgrade<A: AccountRepository, T: SubscriptionRepository>(
    accounts: &A,
    subscriptions: &T,
    user_id: Uuid,
    tier_id: i32,
    now: DateTime<Utc>,
) -> Result<UpgradeQuote, MarketError> {
    let target = subscriptions
        .find_tier(tier_id)
        .await?
        .filter(|t| t.is_active)
        .ok_or(MarketError::TierNotFound)?;
    let profile = accounts
        .find_profile(user_id)
        .await?
        .unwrap_or_else(|| Profile::empty(user_id, DEFAULT_PRODUCT_LIMIT, now));

    let current = match profile.tier_id {
        Some(id) => subscriptions.find_tier(id).await?,
        None => None,
    };
    if current.as_ref().is_some_and(|c| c.id == target.id) {
        return Err(MarketError::NotAnUpgrade);
    }

    let held = match (&current, profile.subscription_expires_at) {
        (Some(tier), Some(expires_at)) if profile.has_active_subscription(now) => {
            if target.price <= tier.price {
                return Err(MarketError::NotAnUpgrade);
            }
            Some((tier, expires_at))
        }
        _ => None,
    };
    let proration = prorate(held, &target, now);
    Ok(UpgradeQuote {
        current,
        target,
        proration,
    })
}

pub struct QuoteUpgradeUseCase<A: AccountRepository, T: SubscriptionRepository> {
    pub accounts: A,
    pub subscriptions: T,
}

impl<A: AccountRepository, T: SubscriptionRepository> QuoteUpgradeUseCase<A, T> {
    pub async fn execute(&self, user_id: Uuid, tier_id: i32) -> Result<UpgradeQuote, MarketError> {
        plan_upgrade(
            &self.accounts,
            &self.subscriptions,
            user_id,
            tier_id,
            Utc::now(),
        )
        .await
    }
}

pub struct RequestUpgradeUseCase<A: AccountRepository, T: SubscriptionRepository> {
    pub accounts: A,
    pub subscriptions: T,
}

impl<A: AccountRepository, T: SubscriptionRepository> RequestUpgradeUseCase<A, T> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        tier_id: i32,
        note: Option<&str>,
    ) -> Result<SubscriptionRequest, MarketError> {
        let now = Utc::now();
        let quote = plan_upgrade(&self.accounts, &self.subscriptions, user_id, tier_id, now).await?;
        if self.subscriptions.has_pending_request(user_id).await? {
            return Err(MarketError::RequestAlreadyPending);
        }
        let request = SubscriptionRequest {
            id: Uuid::now_v7(),
            user_id,
            requested_tier_id: quote.target.id,
            status: RequestStatus::Pending,
            prorated_credit: quote.proration.credit,
            amount_due: quote.proration.amount_due,
            note: optional_text(note, 1000, "note is too long")?,
            previous: None,
            decided_by: None,
            decided_at: None,
            created_at: now,
        };
        self.subscriptions.create_request(&request).await?;
        tracing::info!(
            request_id = %request.id,
            user_id = %user_id,
            tier_id,
            amount_due = %request.amount_due,
            "subscription upgrade requested"
        );
        Ok(request)
    }
}

// ── Listing ──────────────────────────────────────────────────────────────────

pub struct ListMyRequestsUseCase<T: SubscriptionRepository> {
    pub subscriptions: T,
}

impl<T: SubscriptionRepository> ListMyRequestsUseCase<T> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError> {
        self.subscriptions.list_requests_by_user(user_id, page).await
    }
}

pub struct ListRequestsUseCase<T: SubscriptionRepository> {
    pub subscriptions: T,
}

impl<T: SubscriptionRepository> ListRequestsUseCase<T> {
    pub async fn execute(
        &self,
        actor: &Identity,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        self.subscriptions.list_requests(status, page).await
    }
}

// ── Approve / Reject / Revert ────────────────────────────────────────────────

async fn find_request<T: SubscriptionRepository>(
    subscriptions: &T,
    id: Uuid,
    expected: RequestStatus,
) -> Result<SubscriptionRequest, MarketError> {
    let request = subscriptions
        .find_request(id)
        .await?
        .ok_or(MarketError::RequestNotFound)?;
    if request.status != expected {
        return Err(MarketError::InvalidState);
    }
    Ok(request)
}

pub struct ApproveRequestUseCase<A: AccountRepository, T: SubscriptionRepository> {
    pub accounts: A,
    pub subscriptions: T,
}

impl<A: AccountRepository, T: SubscriptionRepository> ApproveRequestUseCase<A, T> {
    /// Grant the requested tier. Customers are promoted to seller; other roles stay.
    pub async fn execute(
        &self,
        actor: &Identity,
        id: Uuid,
    ) -> Result<SubscriptionState, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let request = find_request(&self.subscriptions, id, RequestStatus::Pending).await?;
        let tier = self
            .subscriptions
            .find_tier(request.requested_tier_id)
            .await?
            .ok_or(MarketError::TierNotFound)?;
        let user = self
            .accounts
            .find_user(request.user_id)
            .await?
            .ok_or(MarketError::UserNotFound)?;
        let now = Utc::now();
        let profile = self
            .accounts
            .find_profile(user.id)
            .await?
            .unwrap_or_else(|| Profile::empty(user.id, DEFAULT_PRODUCT_LIMIT, now));

        let previous = SubscriptionState {
            tier_id: profile.tier_id,
            role: user.role,
            product_limit: profile.product_limit,
            started_at: profile.subscription_started_at,
            expires_at: profile.subscription_expires_at,
        };
        let grant = SubscriptionState {
            tier_id: Some(tier.id),
            role: match user.role {
                UserRole::Customer => UserRole::Seller,
                other => other,
            },
            product_limit: tier.product_limit,
            started_at: Some(now),
            expires_at: Some(now + Duration::days(i64::from(tier.duration_days))),
        };
        let audit =
            AuditEntry::new(actor.user_id, "subscription.approve", "subscription_request", id)
                .with_details(format!("tier {} for user {}", tier.id, user.id));
        if !self
            .subscriptions
            .approve_request(&request, &previous, &grant, &audit)
            .await?
        {
            return Err(MarketError::InvalidState);
        }
        tracing::info!(
            request_id = %id,
            user_id = %user.id,
            tier_id = tier.id,
            "subscription approved"
        );
        Ok(grant)
    }
}

pub struct RejectRequestUseCase<T: SubscriptionRepository> {
    pub subscriptions: T,
}

impl<T: SubscriptionRepository> RejectRequestUseCase<T> {
    pub async fn execute(
        &self,
        actor: &Identity,
        id: Uuid,
        reason: Option<&str>,
    ) -> Result<(), MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        find_request(&self.subscriptions, id, RequestStatus::Pending).await?;
        let reason = optional_text(reason, 1000, "reason is too long")?;
        let mut audit =
            AuditEntry::new(actor.user_id, "subscription.reject", "subscription_request", id);
        if let Some(reason) = reason.as_deref() {
            audit = audit.with_details(reason);
        }
        if !self
            .subscriptions
            .reject_request(id, actor.user_id, reason.as_deref(), &audit)
            .await?
        {
            return Err(MarketError::InvalidState);
        }
        Ok(())
    }
}

pub struct RevertRequestUseCase<T: SubscriptionRepository> {
    pub subscriptions: T,
}

impl<T: SubscriptionRepository> RevertRequestUseCase<T> {
    /// Undo the user's most recent approval, restoring what it replaced.
    pub async fn execute(
        &self,
        actor: &Identity,
        id: Uuid,
    ) -> Result<SubscriptionState, MarketError> {
        require_superadmin(actor)?;
        let request = find_request(&self.subscriptions, id, RequestStatus::Approved).await?;
        let latest = self
            .subscriptions
            .latest_approved_request(request.user_id)
            .await?;
        if latest.is_none_or(|l| l.id != request.id) {
            return Err(MarketError::InvalidState);
        }
        let previous = request.previous.clone().ok_or(MarketError::InvalidState)?;

        let product_limit = match previous.tier_id {
            Some(tier_id) => self
                .subscriptions
                .find_tier(tier_id)
                .await?
                .map_or(previous.product_limit, |t| t.product_limit),
            None => DEFAULT_PRODUCT_LIMIT,
        };
        let restore = SubscriptionState {
            product_limit,
            ..previous
        };
        let audit =
            AuditEntry::new(actor.user_id, "subscription.revert", "subscription_request", id)
                .with_details(format!("user {}", request.user_id));
        if !self
            .subscriptions
            .revert_request(&request, &restore, &audit)
            .await?
        {
            return Err(MarketError::InvalidState);
        }
        tracing::info!(request_id = %id, user_id = %request.user_id, "subscription reverted");
        Ok(restore)
    }
}
