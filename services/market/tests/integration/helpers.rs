use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;
use cmse_market::domain::order::{CheckoutLine, Order, OrderLine, OrderStatus};
use cmse_market::domain::repository::{
    AccountRepository, AuditRepository, BroadcastRepository, CategoryRepository, ChatRepository,
    FileStorage, NewAccount, OrderRepository, PageRepository, PasswordHasher, ProductRepository,
    ReviewRepository, StoreRepository, SubscriptionRepository, TierInput,
    UnlockRequestRepository,
};
use cmse_market::domain::types::{
    AuditEntry, Broadcast, Category, ChatMessage, DEFAULT_PRODUCT_LIMIT, Page, Product,
    ProductFilter, ProductSort, ProductStatus, Profile, ProfileUpdate, RequestStatus, Review, ReviewStats,
    Store, SubscriptionRequest, SubscriptionState, Tier, UnlockRequest, User,
};
use cmse_market::error::MarketError;

fn paged<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let page = page.clamped();
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn identity(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        role: user.role,
    }
}

pub fn anyone(role: UserRole) -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        role,
    }
}

pub fn test_user(role: UserRole) -> User {
    let now = Utc::now();
    let id = Uuid::new_v4();
    User {
        id,
        email: format!("{}@example.com", id.simple()),
        password_hash: MockHasher.hash("correct horse battery").unwrap(),
        full_name: "Test User".to_owned(),
        role,
        its_number: (role == UserRole::Seller).then(|| "12345678".to_owned()),
        is_locked: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_profile(user_id: Uuid) -> Profile {
    Profile::empty(user_id, DEFAULT_PRODUCT_LIMIT, Utc::now())
}

pub fn test_store(owner_id: Uuid) -> Store {
    let now = Utc::now();
    Store {
        id: Uuid::new_v4(),
        owner_id,
        name: "Corner Shop".to_owned(),
        slug: format!("corner-shop-{}", owner_id.simple()),
        description: None,
        contact_email: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_category(name: &str, parent_id: Option<Uuid>) -> Category {
    Category {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        slug: cmse_domain::slug::slugify(name),
        parent_id,
        sort_order: 0,
        created_at: Utc::now(),
    }
}

pub fn test_product(
    store_id: Uuid,
    price_cents: i64,
    stock: i32,
    status: ProductStatus,
) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        store_id,
        category_id: Uuid::new_v4(),
        name: "Brass Lamp".to_owned(),
        description: "Hand polished".to_owned(),
        price: Decimal::new(price_cents, 2),
        stock,
        image: None,
        status,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_tier(id: i32, price_cents: i64, product_limit: i32, duration_days: i32) -> Tier {
    Tier {
        id,
        name: format!("tier-{id}"),
        description: None,
        price: Decimal::new(price_cents, 2),
        product_limit,
        duration_days,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// Profile holding `tier` with `days_left` remaining.
pub fn subscribed_profile(user_id: Uuid, tier: &Tier, days_left: i64) -> Profile {
    let now = Utc::now();
    Profile {
        tier_id: Some(tier.id),
        product_limit: tier.product_limit,
        subscription_started_at: Some(
            now - Duration::days(i64::from(tier.duration_days) - days_left),
        ),
        subscription_expires_at: Some(now + Duration::days(days_left) - Duration::minutes(1)),
        ..test_profile(user_id)
    }
}

/// A single-line order of `product` placed by `user_id`.
pub fn test_order(user_id: Uuid, product: &Product, status: OrderStatus) -> Order {
    let now = Utc::now();
    let id = Uuid::new_v4();
    Order {
        id,
        user_id,
        status,
        grand_total: product.price,
        shipping_address: "1 Main St".to_owned(),
        created_at: now,
        updated_at: now,
        lines: vec![OrderLine {
            id: Uuid::new_v4(),
            order_id: id,
            product_id: product.id,
            store_id: product.store_id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
        }],
    }
}

// ── MockHasher ───────────────────────────────────────────────────────────────

/// Reversible stand-in so tests skip the argon2 work factor.
pub struct MockHasher;

impl PasswordHasher for MockHasher {
    fn hash(&self, password: &str) -> Result<String, MarketError> {
        Ok(format!("hashed:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("hashed:") == Some(password)
    }
}

// ── MockAccountRepo ──────────────────────────────────────────────────────────

pub struct MockAccountRepo {
    pub users: Arc<Mutex<Vec<User>>>,
    pub profiles: Arc<Mutex<Vec<Profile>>>,
    pub stores: Arc<Mutex<Vec<Store>>>,
}

impl MockAccountRepo {
    pub fn new(users: Vec<User>, profiles: Vec<Profile>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
            profiles: Arc::new(Mutex::new(profiles)),
            stores: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![], vec![])
    }

    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }

    pub fn stores_handle(&self) -> Arc<Mutex<Vec<Store>>> {
        Arc::clone(&self.stores)
    }

    fn with_profile(&self, user_id: Uuid, f: impl FnOnce(&mut Profile)) -> Result<(), MarketError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or(MarketError::UserNotFound)?;
        f(profile);
        Ok(())
    }

    fn with_user(&self, user_id: Uuid, f: impl FnOnce(&mut User)) -> Result<(), MarketError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(MarketError::UserNotFound)?;
        f(user);
        Ok(())
    }
}

impl AccountRepository for MockAccountRepo {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, MarketError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, MarketError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn its_number_exists(&self, its_number: &str) -> Result<bool, MarketError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.its_number.as_deref() == Some(its_number)))
    }

    async fn create_account(&self, account: &NewAccount) -> Result<(), MarketError> {
        self.users.lock().unwrap().push(account.user.clone());
        self.profiles.lock().unwrap().push(account.profile.clone());
        if let Some(store) = &account.store {
            self.stores.lock().unwrap().push(store.clone());
        }
        Ok(())
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, MarketError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<(), MarketError> {
        if let Some(name) = &update.full_name {
            self.with_user(user_id, |u| u.full_name = name.clone())?;
        }
        self.with_profile(user_id, |p| {
            if let Some(phone) = &update.phone {
                p.phone = Some(phone.clone());
            }
            if let Some(address) = &update.address {
                p.address = Some(address.clone());
            }
        })
    }

    async fn set_pending_image(
        &self,
        user_id: Uuid,
        key: &str,
    ) -> Result<Option<String>, MarketError> {
        let mut replaced = None;
        self.with_profile(user_id, |p| {
            replaced = p.pending_profile_image.replace(key.to_owned());
        })?;
        Ok(replaced)
    }

    async fn list_pending_images(&self, page: PageRequest) -> Result<Vec<Profile>, MarketError> {
        let pending = self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.pending_profile_image.is_some())
            .cloned()
            .collect();
        Ok(paged(pending, page))
    }

    async fn approve_pending_image(
        &self,
        user_id: Uuid,
        pending: &str,
        _audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        self.with_profile(user_id, |p| {
            p.profile_image = Some(pending.to_owned());
            p.pending_profile_image = None;
        })
    }

    async fn clear_pending_image(
        &self,
        user_id: Uuid,
        _audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        self.with_profile(user_id, |p| p.pending_profile_image = None)
    }

    async fn list_users(
        &self,
        role: Option<UserRole>,
        q: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<User>, MarketError> {
        let users = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .filter(|u| q.is_none_or(|q| u.email.contains(q) || u.full_name.contains(q)))
            .cloned()
            .collect();
        Ok(paged(users, page))
    }

    async fn set_locked(
        &self,
        user_id: Uuid,
        locked: bool,
        _audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        self.with_user(user_id, |u| u.is_locked = locked)
    }

    async fn set_role(
        &self,
        user_id: Uuid,
        role: UserRole,
        _audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        self.with_user(user_id, |u| u.role = role)
    }
}

// ── MockStoreRepo ────────────────────────────────────────────────────────────

pub struct MockStoreRepo {
    pub stores: Arc<Mutex<Vec<Store>>>,
}

impl MockStoreRepo {
    pub fn new(stores: Vec<Store>) -> Self {
        Self {
            stores: Arc::new(Mutex::new(stores)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn stores_handle(&self) -> Arc<Mutex<Vec<Store>>> {
        Arc::clone(&self.stores)
    }

    fn find(&self, keep: impl Fn(&Store) -> bool) -> Option<Store> {
        self.stores.lock().unwrap().iter().find(|s| keep(s)).cloned()
    }
}

impl StoreRepository for MockStoreRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Store>, MarketError> {
        Ok(self.find(|s| s.id == id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Store>, MarketError> {
        Ok(self.find(|s| s.slug == slug))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Store>, MarketError> {
        Ok(self.find(|s| s.owner_id == owner_id))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError> {
        Ok(self.find(|s| s.slug == slug && Some(s.id) != exclude).is_some())
    }

    async fn list_active(&self, page: PageRequest) -> Result<Vec<Store>, MarketError> {
        let active = self
            .stores
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        Ok(paged(active, page))
    }

    async fn create(&self, store: &Store) -> Result<(), MarketError> {
        self.stores.lock().unwrap().push(store.clone());
        Ok(())
    }

    async fn update(&self, store: &Store) -> Result<(), MarketError> {
        for stored in self.stores.lock().unwrap().iter_mut() {
            if stored.id == store.id {
                *stored = store.clone();
            }
        }
        Ok(())
    }

    async fn set_active(
        &self,
        id: Uuid,
        active: bool,
        _audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        for stored in self.stores.lock().unwrap().iter_mut() {
            if stored.id == id {
                stored.is_active = active;
            }
        }
        Ok(())
    }
}

// ── MockCategoryRepo ─────────────────────────────────────────────────────────

pub struct MockCategoryRepo {
    pub categories: Arc<Mutex<Vec<Category>>>,
    pub in_use: Vec<Uuid>,
}

impl MockCategoryRepo {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories: Arc::new(Mutex::new(categories)),
            in_use: vec![],
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn categories_handle(&self) -> Arc<Mutex<Vec<Category>>> {
        Arc::clone(&self.categories)
    }
}

impl CategoryRepository for MockCategoryRepo {
    async fn list_all(&self) -> Result<Vec<Category>, MarketError> {
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, MarketError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, MarketError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != exclude))
    }

    async fn is_in_use(&self, id: Uuid) -> Result<bool, MarketError> {
        let has_children = self
            .categories
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.parent_id == Some(id));
        Ok(has_children || self.in_use.contains(&id))
    }

    async fn create(&self, category: &Category, _audit: &AuditEntry) -> Result<(), MarketError> {
        self.categories.lock().unwrap().push(category.clone());
        Ok(())
    }

    async fn update(&self, category: &Category, _audit: &AuditEntry) -> Result<(), MarketError> {
        let mut categories = self.categories.lock().unwrap();
        if let Some(c) = categories.iter_mut().find(|c| c.id == category.id) {
            *c = category.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid, _audit: &AuditEntry) -> Result<(), MarketError> {
        self.categories.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

// ── MockProductRepo ──────────────────────────────────────────────────────────

pub struct MockProductRepo {
    pub products: Arc<Mutex<Vec<Product>>>,
    /// Products referenced by an order line.
    pub ordered: Vec<Uuid>,
}

impl MockProductRepo {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(Mutex::new(products)),
            ordered: vec![],
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn products_handle(&self) -> Arc<Mutex<Vec<Product>>> {
        Arc::clone(&self.products)
    }

    fn filtered(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| keep(p))
            .cloned()
            .collect()
    }
}

impl ProductRepository for MockProductRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, MarketError> {
        Ok(self.filtered(|p| p.id == id).into_iter().next())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Product>, MarketError> {
        Ok(self.filtered(|p| ids.contains(&p.id)))
    }

    async fn list_public(
        &self,
        filter: &ProductFilter,
        _sort: ProductSort,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        let products = self.filtered(|p| {
            p.status == ProductStatus::Approved
                && filter.store_id.is_none_or(|s| p.store_id == s)
                && filter
                    .category_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&p.category_id))
        });
        Ok(paged(products, page))
    }

    async fn random_public(&self, limit: u64) -> Result<Vec<Product>, MarketError> {
        let mut products = self.filtered(|p| p.status == ProductStatus::Approved);
        products.truncate(limit as usize);
        Ok(products)
    }

    async fn list_by_store(
        &self,
        store_id: Uuid,
        status: Option<ProductStatus>,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        let products =
            self.filtered(|p| p.store_id == store_id && status.is_none_or(|s| p.status == s));
        Ok(paged(products, page))
    }

    async fn list_by_status(
        &self,
        status: ProductStatus,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        Ok(paged(self.filtered(|p| p.status == status), page))
    }

    async fn count_live(&self, store_id: Uuid) -> Result<u64, MarketError> {
        let live = self.filtered(|p| {
            p.store_id == store_id
                && matches!(p.status, ProductStatus::Pending | ProductStatus::Approved)
        });
        Ok(live.len() as u64)
    }

    async fn create(&self, product: &Product) -> Result<(), MarketError> {
        self.products.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), MarketError> {
        let mut products = self.products.lock().unwrap();
        if let Some(p) = products.iter_mut().find(|p| p.id == product.id) {
            *p = product.clone();
        }
        Ok(())
    }

    async fn set_image(&self, id: Uuid, key: &str) -> Result<(), MarketError> {
        let mut products = self.products.lock().unwrap();
        if let Some(p) = products.iter_mut().find(|p| p.id == id) {
            p.image = Some(key.to_owned());
        }
        Ok(())
    }

    async fn is_ordered(&self, id: Uuid) -> Result<bool, MarketError> {
        Ok(self.ordered.contains(&id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), MarketError> {
        self.products.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn decide(
        &self,
        id: Uuid,
        status: ProductStatus,
        reason: Option<&str>,
        _audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let mut products = self.products.lock().unwrap();
        match products
            .iter_mut()
            .find(|p| p.id == id && p.status == ProductStatus::Pending)
        {
            Some(p) => {
                p.status = status;
                p.rejection_reason = reason.map(str::to_owned);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── MockOrderRepo ────────────────────────────────────────────────────────────

/// Orders over a shared product list. `place` works on a copy of the products and
/// only writes it back when every line succeeds.
pub struct MockOrderRepo {
    pub orders: Arc<Mutex<Vec<Order>>>,
    pub products: Arc<Mutex<Vec<Product>>>,
    pub inactive_stores: Vec<Uuid>,
}

impl MockOrderRepo {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            orders: Arc::new(Mutex::new(vec![])),
            products: Arc::new(Mutex::new(products)),
            inactive_stores: vec![],
        }
    }

    pub fn with_orders(orders: Vec<Order>, products: Vec<Product>) -> Self {
        let repo = Self::new(products);
        *repo.orders.lock().unwrap() = orders;
        repo
    }

    pub fn orders_handle(&self) -> Arc<Mutex<Vec<Order>>> {
        Arc::clone(&self.orders)
    }

    pub fn products_handle(&self) -> Arc<Mutex<Vec<Product>>> {
        Arc::clone(&self.products)
    }
}

impl OrderRepository for MockOrderRepo {
    async fn place(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        shipping_address: &str,
        lines: &[CheckoutLine],
    ) -> Result<Order, MarketError> {
        let mut products = self.products.lock().unwrap();
        let mut working = products.clone();
        let mut order_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let product = working
                .iter_mut()
                .find(|p| p.id == line.product_id)
                .filter(|p| p.status == ProductStatus::Approved)
                .filter(|p| !self.inactive_stores.contains(&p.store_id))
                .ok_or(MarketError::ProductUnavailable)?;
            if product.stock < line.quantity {
                return Err(MarketError::InsufficientStock);
            }
            product.stock -= line.quantity;
            order_lines.push(OrderLine {
                id: Uuid::new_v4(),
                order_id,
                product_id: product.id,
                store_id: product.store_id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
            });
        }
        *products = working;

        let now = Utc::now();
        let order = Order {
            id: order_id,
            user_id,
            status: OrderStatus::Pending,
            grand_total: order_lines.iter().map(OrderLine::line_total).sum(),
            shipping_address: shipping_address.to_owned(),
            created_at: now,
            updated_at: now,
            lines: order_lines,
        };
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, MarketError> {
        Ok(self.orders.lock().unwrap().iter().find(|o| o.id == id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        let orders = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(paged(orders, page))
    }

    async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        let orders = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        Ok(paged(orders, page))
    }

    async fn list_for_store(
        &self,
        store_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Order>, MarketError> {
        let orders = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.has_store(store_id))
            .map(|o| Order {
                lines: o
                    .lines
                    .iter()
                    .filter(|l| l.store_id == store_id)
                    .cloned()
                    .collect(),
                ..o.clone()
            })
            .collect();
        Ok(paged(orders, page))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        _audit: Option<&AuditEntry>,
    ) -> Result<bool, MarketError> {
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders.iter_mut().find(|o| o.id == id && o.status == from) else {
            return Ok(false);
        };
        order.status = to;
        if to == OrderStatus::Cancelled {
            let mut products = self.products.lock().unwrap();
            for line in &order.lines {
                if let Some(p) = products.iter_mut().find(|p| p.id == line.product_id) {
                    p.stock += line.quantity;
                }
            }
        }
        Ok(true)
    }

    async fn has_purchased(&self, user_id: Uuid, product_id: Uuid) -> Result<bool, MarketError> {
        Ok(self.orders.lock().unwrap().iter().any(|o| {
            o.user_id == user_id
                && o.status != OrderStatus::Cancelled
                && o.lines.iter().any(|l| l.product_id == product_id)
        }))
    }
}

// ── MockSubscriptionRepo ─────────────────────────────────────────────────────

pub struct MockSubscriptionRepo {
    pub tiers: Vec<Tier>,
    pub requests: Arc<Mutex<Vec<SubscriptionRequest>>>,
    /// Every subscription state written to a user, in order.
    pub applied: Arc<Mutex<Vec<(Uuid, SubscriptionState)>>>,
}

impl MockSubscriptionRepo {
    pub fn new(tiers: Vec<Tier>, requests: Vec<SubscriptionRequest>) -> Self {
        Self {
            tiers,
            requests: Arc::new(Mutex::new(requests)),
            applied: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn requests_handle(&self) -> Arc<Mutex<Vec<SubscriptionRequest>>> {
        Arc::clone(&self.requests)
    }

    pub fn applied_handle(&self) -> Arc<Mutex<Vec<(Uuid, SubscriptionState)>>> {
        Arc::clone(&self.applied)
    }

    fn requests_where(
        &self,
        keep: impl Fn(&SubscriptionRequest) -> bool,
    ) -> Vec<SubscriptionRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| keep(r))
            .cloned()
            .collect()
    }
}

impl SubscriptionRepository for MockSubscriptionRepo {
    async fn list_tiers(&self, include_inactive: bool) -> Result<Vec<Tier>, MarketError> {
        Ok(self
            .tiers
            .iter()
            .filter(|t| include_inactive || t.is_active)
            .cloned()
            .collect())
    }

    async fn find_tier(&self, id: i32) -> Result<Option<Tier>, MarketError> {
        Ok(self.tiers.iter().find(|t| t.id == id).cloned())
    }

    async fn tier_name_taken(
        &self,
        name: &str,
        exclude: Option<i32>,
    ) -> Result<bool, MarketError> {
        Ok(self
            .tiers
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(name) && Some(t.id) != exclude))
    }

    async fn create_tier(&self, input: &TierInput) -> Result<Tier, MarketError> {
        Ok(Tier {
            id: self.tiers.iter().map(|t| t.id).max().unwrap_or(0) + 1,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            product_limit: input.product_limit,
            duration_days: input.duration_days,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    async fn update_tier(&self, _id: i32, _input: &TierInput) -> Result<(), MarketError> {
        Ok(())
    }

    async fn set_tier_active(&self, _id: i32, _active: bool) -> Result<(), MarketError> {
        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<SubscriptionRequest>, MarketError> {
        Ok(self.requests_where(|r| r.id == id).into_iter().next())
    }

    async fn has_pending_request(&self, user_id: Uuid) -> Result<bool, MarketError> {
        Ok(!self
            .requests_where(|r| r.user_id == user_id && r.status == RequestStatus::Pending)
            .is_empty())
    }

    async fn create_request(&self, request: &SubscriptionRequest) -> Result<(), MarketError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn list_requests_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError> {
        Ok(paged(self.requests_where(|r| r.user_id == user_id), page))
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError> {
        Ok(paged(
            self.requests_where(|r| status.is_none_or(|s| r.status == s)),
            page,
        ))
    }

    async fn latest_approved_request(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRequest>, MarketError> {
        Ok(self
            .requests_where(|r| r.user_id == user_id && r.status == RequestStatus::Approved)
            .into_iter()
            .max_by_key(|r| r.decided_at))
    }

    async fn approve_request(
        &self,
        request: &SubscriptionRequest,
        previous: &SubscriptionState,
        grant: &SubscriptionState,
        _audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let mut requests = self.requests.lock().unwrap();
        let Some(r) = requests
            .iter_mut()
            .find(|r| r.id == request.id && r.status == RequestStatus::Pending)
        else {
            return Ok(false);
        };
        r.status = RequestStatus::Approved;
        r.previous = Some(previous.clone());
        r.decided_at = Some(Utc::now());
        self.applied
            .lock()
            .unwrap()
            .push((request.user_id, grant.clone()));
        Ok(true)
    }

    async fn reject_request(
        &self,
        id: Uuid,
        decided_by: Uuid,
        note: Option<&str>,
        _audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let mut requests = self.requests.lock().unwrap();
        let Some(r) = requests
            .iter_mut()
            .find(|r| r.id == id && r.status == RequestStatus::Pending)
        else {
            return Ok(false);
        };
        r.status = RequestStatus::Rejected;
        r.decided_by = Some(decided_by);
        r.decided_at = Some(Utc::now());
        if let Some(note) = note {
            r.note = Some(note.to_owned());
        }
        Ok(true)
    }

    async fn revert_request(
        &self,
        request: &SubscriptionRequest,
        restore: &SubscriptionState,
        _audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let mut requests = self.requests.lock().unwrap();
        let Some(r) = requests
            .iter_mut()
            .find(|r| r.id == request.id && r.status == RequestStatus::Approved)
        else {
            return Ok(false);
        };
        r.status = RequestStatus::Reverted;
        self.applied
            .lock()
            .unwrap()
            .push((request.user_id, restore.clone()));
        Ok(true)
    }
}

// ── MockAuditRepo ────────────────────────────────────────────────────────────

pub struct MockAuditRepo {
    pub entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MockAuditRepo {
    pub fn empty() -> Self {
        Self {
            entries: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn entries_handle(&self) -> Arc<Mutex<Vec<AuditEntry>>> {
        Arc::clone(&self.entries)
    }
}

impl AuditRepository for MockAuditRepo {
    async fn record(&self, entry: &AuditEntry) -> Result<(), MarketError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list(
        &self,
        actor_id: Option<Uuid>,
        entity_type: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<AuditEntry>, MarketError> {
        let entries = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| actor_id.is_none_or(|a| e.actor_id == a))
            .filter(|e| entity_type.is_none_or(|t| e.entity_type == t))
            .cloned()
            .collect();
        Ok(paged(entries, page))
    }
}

// ── MockStorage ──────────────────────────────────────────────────────────────

/// Records saved and deleted keys instead of touching the disk.
#[derive(Default)]
pub struct MockStorage {
    pub saved: Arc<Mutex<Vec<String>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
}

impl MockStorage {
    pub fn deleted_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.deleted)
    }
}

impl FileStorage for MockStorage {
    async fn save(&self, key: &str, _bytes: &[u8]) -> Result<(), MarketError> {
        self.saved.lock().unwrap().push(key.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), MarketError> {
        self.deleted.lock().unwrap().push(key.to_owned());
        Ok(())
    }
}

// ── MockReviewRepo ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockReviewRepo {
    pub reviews: Arc<Mutex<Vec<Review>>>,
}

impl MockReviewRepo {
    pub fn reviews_handle(&self) -> Arc<Mutex<Vec<Review>>> {
        Arc::clone(&self.reviews)
    }
}

impl ReviewRepository for MockReviewRepo {
    async fn list_for_product(
        &self,
        product_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Review>, MarketError> {
        let reviews = self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        Ok(paged(reviews, page))
    }

    async fn stats(&self, product_id: Uuid) -> Result<ReviewStats, MarketError> {
        let ratings: Vec<i16> = self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.rating)
            .collect();
        let count = ratings.len() as u64;
        let average = (count > 0).then(|| {
            let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
            (Decimal::from(sum) / Decimal::from(count)).round_dp(2)
        });
        Ok(ReviewStats { count, average })
    }

    async fn exists(&self, product_id: Uuid, user_id: Uuid) -> Result<bool, MarketError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.product_id == product_id && r.user_id == user_id))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, MarketError> {
        Ok(self.reviews.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, review: &Review) -> Result<(), MarketError> {
        self.reviews.lock().unwrap().push(review.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), MarketError> {
        self.reviews.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

// ── MockChatRepo ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockChatRepo {
    pub messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl MockChatRepo {
    pub fn messages_handle(&self) -> Arc<Mutex<Vec<ChatMessage>>> {
        Arc::clone(&self.messages)
    }
}

impl ChatRepository for MockChatRepo {
    async fn create(&self, message: &ChatMessage) -> Result<(), MarketError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>, MarketError> {
        Ok(self.messages.lock().unwrap().iter().find(|m| m.id == id).cloned())
    }

    async fn conversation(
        &self,
        a: Uuid,
        b: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        let messages = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.recipient_id == b)
                    || (m.sender_id == b && m.recipient_id == a)
            })
            .cloned()
            .collect();
        Ok(paged(messages, page))
    }

    async fn inbox(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<ChatMessage>, MarketError> {
        let messages = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|m| m.recipient_id == user_id)
            .cloned()
            .collect();
        Ok(paged(messages, page))
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<u64, MarketError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.recipient_id == user_id && m.read_at.is_none())
            .count() as u64)
    }

    async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), MarketError> {
        if let Some(m) = self
            .messages
            .lock()
            .unwrap()
            .iter_mut()
            .find(|m| m.id == id && m.read_at.is_none())
        {
            m.read_at = Some(at);
        }
        Ok(())
    }
}

// ── MockUnlockRepo ───────────────────────────────────────────────────────────

/// Unlock requests over the account mock's users, so approval can unlock them.
pub struct MockUnlockRepo {
    pub requests: Arc<Mutex<Vec<UnlockRequest>>>,
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUnlockRepo {
    pub fn new(users: Arc<Mutex<Vec<User>>>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(vec![])),
            users,
        }
    }

    pub fn requests_handle(&self) -> Arc<Mutex<Vec<UnlockRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl UnlockRequestRepository for MockUnlockRepo {
    async fn has_pending(&self, user_id: Uuid) -> Result<bool, MarketError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.user_id == user_id && r.status == RequestStatus::Pending))
    }

    async fn create(&self, request: &UnlockRequest) -> Result<(), MarketError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UnlockRequest>, MarketError> {
        Ok(self.requests.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<UnlockRequest>, MarketError> {
        let requests = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        Ok(paged(requests, page))
    }

    async fn decide(
        &self,
        request: &UnlockRequest,
        status: RequestStatus,
        decided_by: Uuid,
        _audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let mut requests = self.requests.lock().unwrap();
        let Some(stored) = requests
            .iter_mut()
            .find(|r| r.id == request.id && r.status == RequestStatus::Pending)
        else {
            return Ok(false);
        };
        stored.status = status;
        stored.decided_by = Some(decided_by);
        stored.decided_at = Some(Utc::now());
        if status == RequestStatus::Approved {
            for user in self.users.lock().unwrap().iter_mut() {
                if user.id == request.user_id {
                    user.is_locked = false;
                }
            }
        }
        Ok(true)
    }
}

// ── MockBroadcastRepo ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBroadcastRepo {
    pub broadcasts: Arc<Mutex<Vec<Broadcast>>>,
}

impl MockBroadcastRepo {
    pub fn new(broadcasts: Vec<Broadcast>) -> Self {
        Self {
            broadcasts: Arc::new(Mutex::new(broadcasts)),
        }
    }
}

impl BroadcastRepository for MockBroadcastRepo {
    /// Returns every active row; the time window is left to the caller.
    async fn list_active(&self, _now: DateTime<Utc>) -> Result<Vec<Broadcast>, MarketError> {
        Ok(self
            .broadcasts
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.is_active)
            .cloned()
            .collect())
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<Broadcast>, MarketError> {
        Ok(paged(self.broadcasts.lock().unwrap().clone(), page))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Broadcast>, MarketError> {
        Ok(self
            .broadcasts
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn create(&self, broadcast: &Broadcast) -> Result<(), MarketError> {
        self.broadcasts.lock().unwrap().push(broadcast.clone());
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), MarketError> {
        for b in self.broadcasts.lock().unwrap().iter_mut() {
            if b.id == id {
                b.is_active = false;
            }
        }
        Ok(())
    }
}

// ── MockPageRepo ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPageRepo {
    pub pages: Arc<Mutex<Vec<Page>>>,
}

impl MockPageRepo {
    pub fn pages_handle(&self) -> Arc<Mutex<Vec<Page>>> {
        Arc::clone(&self.pages)
    }
}

impl PageRepository for MockPageRepo {
    async fn list(&self, published_only: bool) -> Result<Vec<Page>, MarketError> {
        let mut pages: Vec<Page> = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| !published_only || p.is_published)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.sort_order);
        Ok(pages)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>, MarketError> {
        Ok(self.pages.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, MarketError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool, MarketError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != exclude))
    }

    async fn create(&self, page: &Page) -> Result<(), MarketError> {
        self.pages.lock().unwrap().push(page.clone());
        Ok(())
    }

    async fn update(&self, page: &Page) -> Result<(), MarketError> {
        for stored in self.pages.lock().unwrap().iter_mut() {
            if stored.id == page.id {
                *stored = page.clone();
            }
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), MarketError> {
        self.pages.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}
