use chrono::Utc;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::account::normalize_email;
use cmse_domain::pagination::PageRequest;
use cmse_domain::slug::slugify;
use cmse_domain::user::UserRole;

use crate::domain::repository::{ProductRepository, StoreRepository};
use crate::domain::types::{AuditEntry, Product, ProductFilter, ProductSort, Store};
use crate::error::MarketError;
use crate::usecase::{optional_text, required_text};

const MAX_STORE_NAME_CHARS: usize = 120;
const MAX_STORE_DESCRIPTION_CHARS: usize = 4000;

/// Trimmed store name and the slug derived from it.
fn store_name_and_slug(name: &str) -> Result<(String, String), MarketError> {
    let name = required_text(name, MAX_STORE_NAME_CHARS, "store name is too long")?;
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(MarketError::InvalidInput(
            "store name must contain letters or digits",
        ));
    }
    Ok((name, slug))
}

fn contact_email(email: &str) -> Result<Option<String>, MarketError> {
    if email.trim().is_empty() {
        Ok(None)
    } else {
        normalize_email(email).map(Some).ok_or(MarketError::InvalidEmail)
    }
}

// ── ListStores ───────────────────────────────────────────────────────────────

pub struct ListStoresUseCase<S: StoreRepository> {
    pub stores: S,
}

impl<S: StoreRepository> ListStoresUseCase<S> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<Store>, MarketError> {
        self.stores.list_active(page).await
    }
}

// ── GetStore (public) ────────────────────────────────────────────────────────

pub struct GetStoreUseCase<S: StoreRepository, P: ProductRepository> {
    pub stores: S,
    pub products: P,
}

impl<S: StoreRepository, P: ProductRepository> GetStoreUseCase<S, P> {
    /// Active store by slug, with a page of its approved products.
    pub async fn execute(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<(Store, Vec<Product>), MarketError> {
        let store = self
            .stores
            .find_by_slug(slug)
            .await?
            .filter(|s| s.is_active)
            .ok_or(MarketError::StoreNotFound)?;
        let filter = ProductFilter {
            store_id: Some(store.id),
            ..Default::default()
        };
        let products = self
            .products
            .list_public(&filter, ProductSort::Newest, page)
            .await?;
        Ok((store, products))
    }
}

// ── CreateMyStore ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CreateStoreInput {
    pub name: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
}

pub struct CreateMyStoreUseCase<S: StoreRepository> {
    pub stores: S,
}

impl<S: StoreRepository> CreateMyStoreUseCase<S> {
    /// Opens a store for a seller who has none, e.g. after a subscription approval or a
    /// role change promoted them.
    pub async fn execute(
        &self,
        actor: &Identity,
        input: CreateStoreInput,
    ) -> Result<Store, MarketError> {
        if !actor.has_role(UserRole::Seller) {
            return Err(MarketError::Forbidden);
        }
        let (name, slug) = store_name_and_slug(&input.name)?;
        let description = optional_text(
            input.description.as_deref(),
            MAX_STORE_DESCRIPTION_CHARS,
            "description is too long",
        )?;
        let contact_email = match input.contact_email.as_deref() {
            Some(email) => contact_email(email)?,
            None => None,
        };
        if self.stores.find_by_owner(actor.user_id).await?.is_some() {
            return Err(MarketError::StoreAlreadyExists);
        }
        if self.stores.slug_taken(&slug, None).await? {
            return Err(MarketError::StoreSlugTaken);
        }

        let now = Utc::now();
        let store = Store {
            id: Uuid::now_v7(),
            owner_id: actor.user_id,
            name,
            slug,
            description,
            contact_email,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.stores.create(&store).await?;
        tracing::info!(store_id = %store.id, owner_id = %store.owner_id, "store created");
        Ok(store)
    }
}

// ── GetMyStore / UpdateMyStore ───────────────────────────────────────────────

pub struct GetMyStoreUseCase<S: StoreRepository> {
    pub stores: S,
}

impl<S: StoreRepository> GetMyStoreUseCase<S> {
    pub async fn execute(&self, owner_id: Uuid) -> Result<Store, MarketError> {
        self.stores
            .find_by_owner(owner_id)
            .await?
            .ok_or(MarketError::StoreNotFound)
    }
}

#[derive(Debug, Default)]
pub struct UpdateStoreInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub contact_email: Option<String>,
}

pub struct UpdateMyStoreUseCase<S: StoreRepository> {
    pub stores: S,
}

impl<S: StoreRepository> UpdateMyStoreUseCase<S> {
    pub async fn execute(
        &self,
        owner_id: Uuid,
        input: UpdateStoreInput,
    ) -> Result<Store, MarketError> {
        if input.name.is_none() && input.description.is_none() && input.contact_email.is_none() {
            return Err(MarketError::MissingData);
        }
        let mut store = self
            .stores
            .find_by_owner(owner_id)
            .await?
            .ok_or(MarketError::StoreNotFound)?;

        if let Some(name) = input.name.as_deref() {
            let (name, slug) = store_name_and_slug(name)?;
            if slug != store.slug && self.stores.slug_taken(&slug, Some(store.id)).await? {
                return Err(MarketError::StoreSlugTaken);
            }
            store.name = name;
            store.slug = slug;
        }
        if input.description.is_some() {
            store.description = optional_text(
                input.description.as_deref(),
                MAX_STORE_DESCRIPTION_CHARS,
                "description is too long",
            )?;
        }
        if let Some(email) = input.contact_email.as_deref() {
            store.contact_email = contact_email(email)?;
        }
        store.updated_at = Utc::now();
        self.stores.update(&store).await?;
        Ok(store)
    }
}

// ── SetStoreActive (admin) ───────────────────────────────────────────────────

pub struct SetStoreActiveUseCase<S: StoreRepository> {
    pub stores: S,
}

impl<S: StoreRepository> SetStoreActiveUseCase<S> {
    pub async fn execute(
        &self,
        actor: &Identity,
        store_id: Uuid,
        active: bool,
    ) -> Result<(), MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        if self.stores.find_by_id(store_id).await?.is_none() {
            return Err(MarketError::StoreNotFound);
        }
        let action = if active { "store.activate" } else { "store.deactivate" };
        let audit = AuditEntry::new(actor.user_id, action, "store", store_id);
        self.stores.set_active(store_id, active, &audit).await
    }
}
