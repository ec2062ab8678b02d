use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use cmse_domain::user::UserRole;

/// Product limit granted to sellers without a subscription tier.
pub const DEFAULT_PRODUCT_LIMIT: i32 = 3;

/// Marketplace account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub its_number: Option<String>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user profile and subscription state.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub pending_profile_image: Option<String>,
    pub tier_id: Option<i32>,
    pub product_limit: i32,
    pub subscription_started_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn empty(user_id: Uuid, product_limit: i32, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            phone: None,
            address: None,
            profile_image: None,
            pending_profile_image: None,
            tier_id: None,
            product_limit,
            subscription_started_at: None,
            subscription_expires_at: None,
            updated_at: now,
        }
    }

    /// A tier is held and has not yet expired.
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.tier_id.is_some() && self.subscription_expires_at.is_some_and(|exp| exp > now)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
    Archived,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
    pub status: ProductStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sort options for public product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    pub fn from_kebab_case(s: &str) -> Option<Self> {
        match s {
            "newest" => Some(Self::Newest),
            "price-asc" => Some(Self::PriceAsc),
            "price-desc" => Some(Self::PriceDesc),
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

/// Resolved public catalogue filter. Slugs are already turned into ids.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_ids: Option<Vec<Uuid>>,
    pub q: Option<String>,
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct Tier {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub product_limit: i32,
    pub duration_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of subscription and unlock requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Reverted,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Reverted => "reverted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "reverted" => Some(Self::Reverted),
            _ => None,
        }
    }
}

/// Subscription-related profile and role values. Captured before an approval so a
/// revert can write them back.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionState {
    pub tier_id: Option<i32>,
    pub role: UserRole,
    pub product_limit: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_tier_id: i32,
    pub status: RequestStatus,
    pub prorated_credit: Decimal,
    pub amount_due: Decimal,
    pub note: Option<String>,
    pub previous: Option<SubscriptionState>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewStats {
    pub count: u64,
    pub average: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One row of the administrative audit trail.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: impl ToString,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_id,
            action: action.to_owned(),
            entity_type: entity_type.to_owned(),
            entity_id: entity_id.to_string(),
            details: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct UnlockRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub status: RequestStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub sort_order: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Broadcast {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_by: Uuid,
    pub starts_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Broadcast {
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && self.expires_at.is_none_or(|exp| now < exp)
    }
}
