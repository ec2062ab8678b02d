use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;

use crate::domain::category::with_descendants;
use crate::domain::repository::{
    AccountRepository, AuditRepository, CategoryRepository, FileStorage, ProductRepository,
    StoreRepository,
};
use crate::domain::types::{
    AuditEntry, DEFAULT_PRODUCT_LIMIT, Product, ProductFilter, ProductSort, ProductStatus, Store,
};
use crate::domain::upload::{UploadKind, check_size, image_extension, storage_key};
use crate::error::MarketError;
use crate::usecase::required_text;

/// Number of products on the featured shelf.
pub const FEATURED_COUNT: u64 = 8;

const MAX_PRODUCT_NAME_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 10_000;

/// `numeric(12,2)` upper bound.
fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn check_price(price: Decimal) -> Result<Decimal, MarketError> {
    if price <= Decimal::ZERO {
        return Err(MarketError::InvalidInput("price must be greater than zero"));
    }
    if price.scale() > 2 && price.normalize().scale() > 2 {
        return Err(MarketError::InvalidInput(
            "price must have at most two decimal places",
        ));
    }
    if price > max_price() {
        return Err(MarketError::InvalidInput("price is too large"));
    }
    Ok(price.round_dp(2))
}

fn check_stock(stock: i32) -> Result<i32, MarketError> {
    if stock < 0 {
        return Err(MarketError::InvalidInput("stock cannot be negative"));
    }
    Ok(stock)
}

/// The product plus the caller's store, when the caller owns it.
async fn owned_product<P: ProductRepository, S: StoreRepository>(
    products: &P,
    stores: &S,
    owner_id: Uuid,
    product_id: Uuid,
) -> Result<(Product, Store), MarketError> {
    let product = products
        .find_by_id(product_id)
        .await?
        .ok_or(MarketError::ProductNotFound)?;
    let store = stores
        .find_by_owner(owner_id)
        .await?
        .filter(|s| s.id == product.store_id)
        .ok_or(MarketError::Forbidden)?;
    Ok((product, store))
}

// ── ListProducts (public) ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub store: Option<String>,
    pub sort: ProductSort,
}

pub struct ListProductsUseCase<P: ProductRepository, C: CategoryRepository, S: StoreRepository> {
    pub products: P,
    pub categories: C,
    pub stores: S,
}

impl<P: ProductRepository, C: CategoryRepository, S: StoreRepository>
    ListProductsUseCase<P, C, S>
{
    pub async fn execute(
        &self,
        query: ProductQuery,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        let mut filter = ProductFilter {
            q: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
            ..Default::default()
        };
        if let Some(slug) = query.category.as_deref() {
            let all = self.categories.list_all().await?;
            let root = all
                .iter()
                .find(|c| c.slug == slug)
                .ok_or(MarketError::CategoryNotFound)?;
            filter.category_ids = Some(with_descendants(&all, root.id));
        }
        if let Some(slug) = query.store.as_deref() {
            let store = self
                .stores
                .find_by_slug(slug)
                .await?
                .filter(|s| s.is_active)
                .ok_or(MarketError::StoreNotFound)?;
            filter.store_id = Some(store.id);
        }
        self.products.list_public(&filter, query.sort, page).await
    }
}

// ── FeaturedProducts ─────────────────────────────────────────────────────────

pub struct FeaturedProductsUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> FeaturedProductsUseCase<P> {
    pub async fn execute(&self) -> Result<Vec<Product>, MarketError> {
        self.products.random_public(FEATURED_COUNT).await
    }
}

// ── GetProduct ───────────────────────────────────────────────────────────────

pub struct GetProductUseCase<P: ProductRepository, S: StoreRepository> {
    pub products: P,
    pub stores: S,
}

impl<P: ProductRepository, S: StoreRepository> GetProductUseCase<P, S> {
    /// Anyone sees approved products of active stores; owners and admins see everything.
    pub async fn execute(
        &self,
        viewer: Option<&Identity>,
        id: Uuid,
    ) -> Result<Product, MarketError> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or(MarketError::ProductNotFound)?;
        let store = self
            .stores
            .find_by_id(product.store_id)
            .await?
            .ok_or(MarketError::ProductNotFound)?;

        let public = product.status == ProductStatus::Approved && store.is_active;
        let privileged = viewer.is_some_and(|v| v.is_admin() || v.user_id == store.owner_id);
        if public || privileged {
            Ok(product)
        } else {
            Err(MarketError::ProductNotFound)
        }
    }
}

// ── CreateProduct ────────────────────────────────────────────────────────────

pub struct CreateProductInput {
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
}

pub struct CreateProductUseCase<
    P: ProductRepository,
    S: StoreRepository,
    C: CategoryRepository,
    A: AccountRepository,
> {
    pub products: P,
    pub stores: S,
    pub categories: C,
    pub accounts: A,
}

impl<P: ProductRepository, S: StoreRepository, C: CategoryRepository, A: AccountRepository>
    CreateProductUseCase<P, S, C, A>
{
    pub async fn execute(
        &self,
        actor: &Identity,
        input: CreateProductInput,
    ) -> Result<Product, MarketError> {
        if !actor.has_role(UserRole::Seller) {
            return Err(MarketError::Forbidden);
        }
        let store = self
            .stores
            .find_by_owner(actor.user_id)
            .await?
            .ok_or(MarketError::StoreNotFound)?;
        let name = required_text(&input.name, MAX_PRODUCT_NAME_CHARS, "name is too long")?;
        let description = required_text(
            &input.description,
            MAX_DESCRIPTION_CHARS,
            "description is too long",
        )?;
        let price = check_price(input.price)?;
        let stock = check_stock(input.stock)?;
        if self.categories.find_by_id(input.category_id).await?.is_none() {
            return Err(MarketError::CategoryNotFound);
        }

        let limit = self
            .accounts
            .find_profile(actor.user_id)
            .await?
            .map_or(DEFAULT_PRODUCT_LIMIT, |p| p.product_limit);
        let live = self.products.count_live(store.id).await?;
        if live >= u64::try_from(limit.max(0)).unwrap_or_default() {
            return Err(MarketError::ProductLimitReached);
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            store_id: store.id,
            category_id: input.category_id,
            name,
            description,
            price,
            stock,
            image: None,
            status: ProductStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.products.create(&product).await?;
        tracing::info!(product_id = %product.id, store_id = %store.id, "product submitted");
        Ok(product)
    }
}

// ── UpdateProduct ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct UpdateProductInput {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

pub struct UpdateProductUseCase<P: ProductRepository, S: StoreRepository, C: CategoryRepository> {
    pub products: P,
    pub stores: S,
    pub categories: C,
}

impl<P: ProductRepository, S: StoreRepository, C: CategoryRepository>
    UpdateProductUseCase<P, S, C>
{
    /// Any accepted edit sends the product back to moderation.
    pub async fn execute(
        &self,
        actor: &Identity,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<Product, MarketError> {
        let (mut product, _) =
            owned_product(&self.products, &self.stores, actor.user_id, id).await?;
        if product.status == ProductStatus::Archived {
            return Err(MarketError::InvalidState);
        }
        let mut changed = false;
        if let Some(category_id) = input.category_id {
            if self.categories.find_by_id(category_id).await?.is_none() {
                return Err(MarketError::CategoryNotFound);
            }
            product.category_id = category_id;
            changed = true;
        }
        if let Some(name) = input.name.as_deref() {
            product.name = required_text(name, MAX_PRODUCT_NAME_CHARS, "name is too long")?;
            changed = true;
        }
        if let Some(description) = input.description.as_deref() {
            product.description =
                required_text(description, MAX_DESCRIPTION_CHARS, "description is too long")?;
            changed = true;
        }
        if let Some(price) = input.price {
            product.price = check_price(price)?;
            changed = true;
        }
        if let Some(stock) = input.stock {
            product.stock = check_stock(stock)?;
            changed = true;
        }
        if !changed {
            return Err(MarketError::MissingData);
        }
        product.status = ProductStatus::Pending;
        product.rejection_reason = None;
        product.updated_at = Utc::now();
        self.products.update(&product).await?;
        Ok(product)
    }
}

// ── DeleteProduct ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Archived,
}

pub struct DeleteProductUseCase<P: ProductRepository, S: StoreRepository, L: AuditRepository> {
    pub products: P,
    pub stores: S,
    pub audit: L,
}

impl<P: ProductRepository, S: StoreRepository, L: AuditRepository> DeleteProductUseCase<P, S, L> {
    /// Ordered products are archived so order history keeps its references.
    pub async fn execute(&self, actor: &Identity, id: Uuid) -> Result<DeleteOutcome, MarketError> {
        let mut product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or(MarketError::ProductNotFound)?;
        let is_owner = self
            .stores
            .find_by_owner(actor.user_id)
            .await?
            .is_some_and(|s| s.id == product.store_id);
        if !is_owner && !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }

        let outcome = if self.products.is_ordered(id).await? {
            product.status = ProductStatus::Archived;
            product.updated_at = Utc::now();
            self.products.update(&product).await?;
            DeleteOutcome::Archived
        } else {
            self.products.delete(id).await?;
            DeleteOutcome::Deleted
        };

        if !is_owner {
            let action = match outcome {
                DeleteOutcome::Deleted => "product.delete",
                DeleteOutcome::Archived => "product.archive",
            };
            self.audit
                .record(&AuditEntry::new(actor.user_id, action, "product", id))
                .await?;
        }
        Ok(outcome)
    }
}

// ── UploadProductImage ───────────────────────────────────────────────────────

pub struct UploadProductImageUseCase<P: ProductRepository, S: StoreRepository, F: FileStorage> {
    pub products: P,
    pub stores: S,
    pub storage: F,
    pub max_upload_bytes: usize,
}

impl<P: ProductRepository, S: StoreRepository, F: FileStorage> UploadProductImageUseCase<P, S, F> {
    pub async fn execute(
        &self,
        actor: &Identity,
        id: Uuid,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, MarketError> {
        let (product, _) = owned_product(&self.products, &self.stores, actor.user_id, id).await?;
        if product.status == ProductStatus::Archived {
            return Err(MarketError::InvalidState);
        }
        let ext = image_extension(filename)?;
        check_size(bytes.len(), self.max_upload_bytes)?;
        let key = storage_key(UploadKind::Product, id, &ext);
        self.storage.save(&key, bytes).await?;
        self.products.set_image(id, &key).await?;
        if let Some(old) = product.image {
            if let Err(e) = self.storage.delete(&old).await {
                tracing::warn!(error = ?e, key = %old, "failed to delete replaced product image");
            }
        }
        Ok(key)
    }
}

// ── ListMyProducts ───────────────────────────────────────────────────────────

pub struct ListMyProductsUseCase<P: ProductRepository, S: StoreRepository> {
    pub products: P,
    pub stores: S,
}

impl<P: ProductRepository, S: StoreRepository> ListMyProductsUseCase<P, S> {
    pub async fn execute(
        &self,
        owner_id: Uuid,
        status: Option<ProductStatus>,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        let store = self
            .stores
            .find_by_owner(owner_id)
            .await?
            .ok_or(MarketError::StoreNotFound)?;
        self.products.list_by_store(store.id, status, page).await
    }
}

// ── Moderation (admin) ───────────────────────────────────────────────────────

pub struct ListPendingProductsUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> ListPendingProductsUseCase<P> {
    pub async fn execute(
        &self,
        actor: &Identity,
        page: PageRequest,
    ) -> Result<Vec<Product>, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        self.products
            .list_by_status(ProductStatus::Pending, page)
            .await
    }
}

pub struct ModerateProductUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> ModerateProductUseCase<P> {
    pub async fn approve(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        self.decide(actor, id, ProductStatus::Approved, None).await
    }

    pub async fn reject(
        &self,
        actor: &Identity,
        id: Uuid,
        reason: &str,
    ) -> Result<(), MarketError> {
        let reason = required_text(reason, 1000, "reason is too long")?;
        self.decide(actor, id, ProductStatus::Rejected, Some(&reason))
            .await
    }

    async fn decide(
        &self,
        actor: &Identity,
        id: Uuid,
        status: ProductStatus,
        reason: Option<&str>,
    ) -> Result<(), MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or(MarketError::ProductNotFound)?;
        if product.status != ProductStatus::Pending {
            return Err(MarketError::InvalidState);
        }
        let action = match status {
            ProductStatus::Approved => "product.approve",
            _ => "product.reject",
        };
        let mut audit = AuditEntry::new(actor.user_id, action, "product", id);
        if let Some(reason) = reason {
            audit = audit.with_details(reason);
        }
        if !self.products.decide(id, status, reason, &audit).await? {
            return Err(MarketError::InvalidState);
        }
        Ok(())
    }
}
