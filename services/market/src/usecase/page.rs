use chrono::Utc;
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::slug::{is_valid_slug, slugify};

use crate::domain::repository::{AuditRepository, PageRepository};
use crate::domain::types::{AuditEntry, Page};
use crate::error::MarketError;
use crate::usecase::required_text;

const MAX_TITLE_CHARS: usize = 200;
const MAX_CONTENT_CHARS: usize = 100_000;

fn page_slug(title: &str, slug: Option<&str>) -> Result<String, MarketError> {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_owned(),
        None => slugify(title),
    };
    if !is_valid_slug(&slug) {
        return Err(MarketError::InvalidInput(
            "slug must be lowercase letters, digits and hyphens",
        ));
    }
    Ok(slug)
}

// ── Public ───────────────────────────────────────────────────────────────────

pub struct ListPagesUseCase<P: PageRepository> {
    pub pages: P,
}

impl<P: PageRepository> ListPagesUseCase<P> {
    /// Published pages for everyone; admins also see drafts.
    pub async fn execute(&self, viewer: Option<&Identity>) -> Result<Vec<Page>, MarketError> {
        let published_only = !viewer.is_some_and(Identity::is_admin);
        self.pages.list(published_only).await
    }
}

pub struct GetPageUseCase<P: PageRepository> {
    pub pages: P,
}

impl<P: PageRepository> GetPageUseCase<P> {
    pub async fn execute(&self, slug: &str) -> Result<Page, MarketError> {
        self.pages
            .find_by_slug(slug)
            .await?
            .filter(|p| p.is_published)
            .ok_or(MarketError::PageNotFound)
    }
}

// ── Admin ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PageInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub sort_order: Option<i32>,
    pub is_published: Option<bool>,
}

pub struct ManagePagesUseCase<P: PageRepository, L: AuditRepository> {
    pub pages: P,
    pub audit: L,
}

impl<P: PageRepository, L: AuditRepository> ManagePagesUseCase<P, L> {
    pub async fn create(&self, actor: &Identity, input: PageInput) -> Result<Page, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let title = required_text(
            input.title.as_deref().unwrap_or_default(),
            MAX_TITLE_CHARS,
            "title is too long",
        )?;
        let content = required_text(
            input.content.as_deref().unwrap_or_default(),
            MAX_CONTENT_CHARS,
            "content is too long",
        )?;
        let slug = page_slug(&title, input.slug.as_deref())?;
        if self.pages.slug_taken(&slug, None).await? {
            return Err(MarketError::PageSlugTaken);
        }
        let now = Utc::now();
        let page = Page {
            id: Uuid::now_v7(),
            title,
            slug,
            content,
            sort_order: input.sort_order.unwrap_or(0),
            is_published: input.is_published.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        self.pages.create(&page).await?;
        self.audit
            .record(
                &AuditEntry::new(actor.user_id, "page.create", "page", page.id)
                    .with_details(page.slug.clone()),
            )
            .await?;
        Ok(page)
    }

    pub async fn update(
        &self,
        actor: &Identity,
        id: Uuid,
        input: PageInput,
    ) -> Result<Page, MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let mut page = self
            .pages
            .find_by_id(id)
            .await?
            .ok_or(MarketError::PageNotFound)?;
        if let Some(title) = input.title.as_deref() {
            page.title = required_text(title, MAX_TITLE_CHARS, "title is too long")?;
        }
        if let Some(content) = input.content.as_deref() {
            page.content = required_text(content, MAX_CONTENT_CHARS, "content is too long")?;
        }
        if let Some(slug) = input.slug.as_deref() {
            let slug = page_slug(&page.title, Some(slug))?;
            if slug != page.slug && self.pages.slug_taken(&slug, Some(id)).await? {
                return Err(MarketError::PageSlugTaken);
            }
            page.slug = slug;
        }
        if let Some(sort_order) = input.sort_order {
            page.sort_order = sort_order;
        }
        if let Some(is_published) = input.is_published {
            page.is_published = is_published;
        }
        page.updated_at = Utc::now();
        self.pages.update(&page).await?;
        self.audit
            .record(&AuditEntry::new(actor.user_id, "page.update", "page", id))
            .await?;
        Ok(page)
    }

    pub async fn delete(&self, actor: &Identity, id: Uuid) -> Result<(), MarketError> {
        if !actor.is_admin() {
            return Err(MarketError::Forbidden);
        }
        let page = self
            .pages
            .find_by_id(id)
            .await?
            .ok_or(MarketError::PageNotFound)?;
        self.pages.delete(id).await?;
        self.audit
            .record(
                &AuditEntry::new(actor.user_id, "page.delete", "page", id).with_details(page.slug),
            )
            .await
    }
}
