use chrono::Utc;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::slug::{is_valid_slug, slugify};

use crate::domain::category::{CategoryNode, build_tree, would_create_cycle};
use crate::domain::repository::CategoryRepository;
use crate::domain::types::{AuditEntry, Category};
use crate::error::MarketError;
use crate::usecase::required_text;

const MAX_CATEGORY_NAME_CHARS: usize = 120;

/// Use the caller's slug when given (it must already be canonical), else derive one.
fn resolve_slug(name: &str, slug: Option<&str>) -> Result<String, MarketError> {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) if is_valid_slug(s) => Ok(s.to_owned()),
        Some(_) => Err(MarketError::InvalidInput(
            "slug must be lowercase letters, digits and hyphens",
        )),
        None => {
            let derived = slugify(name);
            if derived.is_empty() {
                return Err(MarketError::InvalidInput(
                    "category name must contain letters or digits",
                ));
            }
            Ok(derived)
        }
    }
}

// ── ListCategories ───────────────────────────────────────────────────────────

pub struct CategoryListing {
    pub flat: Vec<Category>,
    pub tree: Vec<CategoryNode>,
}

pub struct ListCategoriesUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> ListCategoriesUseCase<C> {
    pub async fn execute(&self) -> Result<CategoryListing, MarketError> {
        let mut flat = self.categories.list_all().await?;
        flat.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        let tree = build_tree(&flat);
        Ok(CategoryListing { flat, tree })
    }
}

// ── GetCategory ──────────────────────────────────────────────────────────────

pub struct GetCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> GetCategoryUseCase<C> {
    pub async fn execute(&self, slug: &str) -> Result<Category, MarketError> {
        self.categories
            .find_by_slug(slug)
            .await?
            .ok_or(MarketError::CategoryNotFound)
    }
}

// ── CreateCategory ───────────────────────────────────────────────────────────

pub struct CreateCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: Option<i32>,
}

pub struct CreateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> CreateCategoryUseCase<C> {
    pub async fn execute(
        &self,
        actor: &Identity,
        input: CreateCategoryInput,
    ) -> Result<Category, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let name = required_text(&input.name, MAX_CATEGORY_NAME_CHARS, "name is too long")?;
        let slug = resolve_slug(&name, input.slug.as_deref())?;
        if self.categories.slug_taken(&slug, None).await? {
            return Err(MarketError::CategorySlugTaken);
        }
        if let Some(parent) = input.parent_id {
            if self.categories.find_by_id(parent).await?.is_none() {
                return Err(MarketError::CategoryNotFound);
            }
        }
        let category = Category {
            id: Uuid::now_v7(),
            name,
            slug,
            parent_id: input.parent_id,
            sort_order: input.sort_order.unwrap_or(0),
            created_at: Utc::now(),
        };
        let audit = AuditEntry::new(actor.user_id, "category.create", "category", category.id)
            .with_details(category.slug.clone());
        self.categories.create(&category, &audit).await?;
        Ok(category)
    }
}

// ── UpdateCategory ───────────────────────────────────────────────────────────

/// `parent_id: Some(None)` moves the category to the root.
#[derive(Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
}

pub struct UpdateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> UpdateCategoryUseCase<C> {
    pub async fn execute(
        &self,
        actor: &Identity,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<Category, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let all = self.categories.list_all().await?;
        let mut category = all
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(MarketError::CategoryNotFound)?;

        if let Some(name) = input.name.as_deref() {
            category.name = required_text(name, MAX_CATEGORY_NAME_CHARS, "name is too long")?;
        }
        if let Some(slug) = input.slug.as_deref() {
            let slug = resolve_slug(&category.name, Some(slug))?;
            if slug != category.slug && self.categories.slug_taken(&slug, Some(id)).await? {
                return Err(MarketError::CategorySlugTaken);
            }
            category.slug = slug;
        }
        if let Some(parent) = input.parent_id {
            if let Some(parent_id) = parent {
                if !all.iter().any(|c| c.id == parent_id) {
                    return Err(MarketError::CategoryNotFound);
                }
                if would_create_cycle(&all, id, parent_id) {
                    return Err(MarketError::CategoryCycle);
                }
            }
            category.parent_id = parent;
        }
        if let Some(sort_order) = input.sort_order {
            category.sort_order = sort_order;
        }

        let audit = AuditEntry::new(actor.user_id, "category.update", "category", id);
        self.categories.update(&category, &audit).await?;
        Ok(category)
    }
}

// ── DeleteCategory ───────────────────────────────────────────────────────────

pub struct DeleteCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> DeleteCategoryUseCase<C> {
    pub async fn execute(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or(MarketError::CategoryNotFound)?;
        if self.categories.is_in_use(id).await? {
            return Err(MarketError::CategoryInUse);
        }
        let audit = AuditEntry::new(actor.user_id, "category.delete", "category", id)
            .with_details(category.slug);
        self.categories.delete(id, &audit).await
    }
}
