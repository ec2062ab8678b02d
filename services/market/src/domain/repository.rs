#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;

use crate::domain::order::{CheckoutLine, Order, OrderStatus};
use crate::domain::types::{
    AuditEntry, Broadcast, Category, ChatMessage, Page, Product, ProductFilter, ProductSort,
    ProductStatus, Profile, ProfileUpdate, RequestStatus, Review, ReviewStats, Store,
    SubscriptionRequest, SubscriptionState, Tier, UnlockRequest, User,
};
use crate::error::MarketError;

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, MarketError>;
    /// `false` for a wrong password and for an unparseable hash alike.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Blob storage for uploaded images, addressed by relative key.
pub trait FileStorage: Send + Sync {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), MarketError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), MarketError>;
}

/// Everything created by a registration, written in one transaction.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user: User,
    pub profile: Profile,
    pub store: Option<Store>,
}

/// Users and their profiles.
pub trait AccountRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, MarketError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, MarketError>;
    async fn its_number_exists(&self, its_number: &str) -> Result<bool, MarketError>;

    /// Insert user, profile and optional store atomically. Unique violations map to
    /// the matching conflict error.
    async fn create_account(&self, account: &NewAccount) -> Result<(), MarketError>;

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, MarketError>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<(), MarketError>;

    /// Store a new pending image key, returning the one it replaced.
    async fn set_pending_image(
        &self,
        user_id: Uuid,
        key: &str,
    ) -> Result<Option<String>, MarketError>;
    async fn list_pending_images(&self, page: PageRequest) -> Result<Vec<Profile>, MarketError>;
    /// Promote `pending` to the approved image.
    async fn approve_pending_image(
        &self,
        user_id: Uuid,
        pending: &str,
        audit: &AuditEntry,
    ) -> Result<(), MarketError>;
    async fn clear_pending_image(
        &self,
        user_id: Uuid,
        audit: &AuditEntry,
    ) -> Result<(), MarketError>;

    async fn list_users(
        &self,
        role: Option<UserRole>,
        q: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<User>, MarketError>;
    async fn set_locked(
        &self,
        user_id: Uuid,
        locked: bool,
        audit: &AuditEntry,
    ) -> Result<(), MarketError>;
    async fn set_role(
        &self,
        user_id: Uuid,
        role: UserRole,
        audit: &AuditEntry,
    ) -> Result<(), MarketError>;
}

pub trait StoreRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, MarketError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Store>, MarketError>;
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Store>, MarketError>;
    /// Whether another store (not `exclude`) already uses `slug`.
    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError>;
    async fn list_active(&self, page: PageRequest) -> Result<Vec<Store>, MarketError>;
    /// Unique violations on slug or owner map to the matching conflict error.
    async fn create(&self, store: &Store) -> Result<(), MarketError>;
    async fn update(&self, store: &Store) -> Result<(), MarketError>;
    async fn set_active(
        &self,
        id: Uuid,
        active: bool,
        audit: &AuditEntry,
    ) -> Result<(), MarketError>;
}

pub trait CategoryRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Category>, MarketError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, MarketError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, MarketError>;
    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError>;
    /// Has child categories or products.
    async fn is_in_use(&self, id: Uuid) -> Result<bool, MarketError>;
    async fn create(&self, category: &Category, audit: &AuditEntry) -> Result<(), MarketError>;
    async fn update(&self, category: &Category, audit: &AuditEntry) -> Result<(), MarketError>;
    async fn delete(&self, id: Uuid, audit: &AuditEntry) -> Result<(), MarketError>;
}

pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, MarketError>;
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, MarketError>;

    /// Approved products of active stores.
    async fn list_public(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError>;
    async fn random_public(&self, limit: u64) -> Result<Vec<Product>, MarketError>;
    async fn list_by_store(
        &self,
        store_id: Uuid,
        status: Option<ProductStatus>,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError>;
    async fn list_by_status(
        &self,
        status: ProductStatus,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError>;

    /// Products that count against the store's limit (pending or approved).
    async fn count_live(&self, store_id: Uuid) -> Result<u64, MarketError>;
    async fn create(&self, product: &Product) -> Result<(), MarketError>;
    async fn update(&self, product: &Product) -> Result<(), MarketError>;
    async fn set_image(&self, id: Uuid, key: &str) -> Result<(), MarketError>;
    async fn is_ordered(&self, id: Uuid) -> Result<bool, MarketError>;
    async fn delete(&self, id: Uuid) -> Result<(), MarketError>;

    /// Moderation decision. Only applies while the product is still pending; returns
    /// `false` otherwise.
    async fn decide(
        &self,
        id: Uuid,
        status: ProductStatus,
        reason: Option<&str>,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError>;
}

pub trait OrderRepository: Send + Sync {
    /// Re-read every product, decrement stock conditionally and insert the order with
    /// snapshotted lines, all in one transaction.
    async fn place(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        shipping_address: &str,
        lines: &[CheckoutLine],
    ) -> Result<Order, MarketError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, MarketError>;
    async fn list_by_user(&self, user_id: Uuid, page: PageRequest)
    -> Result<Vec<Order>, MarketError>;
    async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError>;
    /// Orders with a line from `store_id`; only that store's lines are included.
    async fn list_for_store(
        &self,
        store_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError>;

    /// Move `id` from `from` to `to` in one transaction, restoring stock when `to` is
    /// cancelled. Returns `false` if the order was no longer in `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        audit: Option<&AuditEntry>,
    ) -> Result<bool, MarketError>;

    /// Has a non-cancelled order containing `product_id`.
    async fn has_purchased(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, MarketError>;
}

/// New tier values. Also used for updates.
#[derive(Debug, Clone)]
pub struct TierInput {
    pub name: String,
    pub description: Option<String>,
    pub price: rust_decimal::Decimal,
    pub product_limit: i32,
    pub duration_days: i32,
}

pub trait SubscriptionRepository: Send + Sync {
    async fn list_tiers(&self, include_inactive: bool) -> Result<Vec<Tier>, MarketError>;
    async fn find_tier(&self, id: i32) -> Result<Option<Tier>, MarketError>;
    async fn tier_name_taken(&self, name: &str, exclude: Option<i32>)
    -> Result<bool, MarketError>;
    async fn create_tier(&self, input: &TierInput) -> Result<Tier, MarketError>;
    async fn update_tier(&self, id: i32, input: &TierInput) -> Result<(), MarketError>;
    async fn set_tier_active(&self, id: i32, active: bool) -> Result<(), MarketError>;

    async fn find_request(&self, id: Uuid) -> Result<Option<SubscriptionRequest>, MarketError>;
    async fn has_pending_request(&self, user_id: Uuid) -> Result<bool, MarketError>;
    async fn create_request(&self, request: &SubscriptionRequest) -> Result<(), MarketError>;
    async fn list_requests_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError>;
    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError>;
    async fn latest_approved_request(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRequest>, MarketError>;

    /// Pending → approved: store `previous` on the request and apply `grant` to the user.
    /// Returns `false` if the request was no longer pending.
    async fn approve_request(
        &self,
        request: &SubscriptionRequest,
        previous: &SubscriptionState,
        grant: &SubscriptionState,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError>;
    /// Pending → rejected. Returns `false` if the request was no longer pending.
    async fn reject_request(
        &self,
        id: Uuid,
        decided_by: Uuid,
        note: Option<&str>,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError>;
    /// Approved → reverted, writing `restore` back to the user.
    /// Returns `false` if the request was no longer approved.
    async fn revert_request(
        &self,
        request: &SubscriptionRequest,
        restore: &SubscriptionState,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError>;
}

pub trait ReviewRepository: Send + Sync {
    async fn list_for_product(
        &self,
        product_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Review>, MarketError>;
    async fn stats(&self, product_id: Uuid) -> Result<ReviewStats, MarketError>;
    async fn exists(&self, product_id: Uuid, user_id: Uuid) -> Result<bool, MarketError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, MarketError>;
    async fn create(&self, review: &Review) -> Result<(), MarketError>;
    async fn delete(&self, id: Uuid) -> Result<(), MarketError>;
}

pub trait ChatRepository: Send + Sync {
    async fn create(&self, message: &ChatMessage) -> Result<(), MarketError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>, MarketError>;
    /// Both directions between `a` and `b`, oldest first.
    async fn conversation(
        &self,
        a: Uuid,
        b: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, MarketError>;
    async fn inbox(&self, user_id: Uuid, page: PageRequest)
    -> Result<Vec<ChatMessage>, MarketError>;
    async fn unread_count(&self, user_id: Uuid) -> Result<u64, MarketError>;
    /// Sets `read_at` only if still unread.
    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), MarketError>;
}

pub trait AuditRepository: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), MarketError>;
    async fn list(
        &self,
        actor_id: Option<Uuid>,
        entity_type: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<AuditEntry>, MarketError>;
}

pub trait UnlockRequestRepository: Send + Sync {
    async fn has_pending(&self, user_id: Uuid) -> Result<bool, MarketError>;
    async fn create(&self, request: &UnlockRequest) -> Result<(), MarketError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UnlockRequest>, MarketError>;
    async fn list(
        &self,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<UnlockRequest>, MarketError>;
    /// Pending → `status`. Approval also unlocks the user in the same transaction.
    /// Returns `false` if the request was no longer pending.
    async fn decide(
        &self,
        request: &UnlockRequest,
        status: RequestStatus,
        decided_by: Uuid,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError>;
}

pub trait PageRepository: Send + Sync {
    async fn list(&self, published_only: bool) -> Result<Vec<Page>, MarketError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>, MarketError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, MarketError>;
    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError>;
    async fn create(&self, page: &Page) -> Result<(), MarketError>;
    async fn update(&self, page: &Page) -> Result<(), MarketError>;
    async fn delete(&self, id: Uuid) -> Result<(), MarketError>;
}

pub trait BroadcastRepository: Send + Sync {
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Broadcast>, MarketError>;
    async fn list(&self, page: PageRequest) -> Result<Vec<Broadcast>, MarketError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Broadcast>, MarketError>;
    async fn create(&self, broadcast: &Broadcast) -> Result<(), MarketError>;
    async fn deactivate(&self, id: Uuid) -> Result<(), MarketError>;
}
