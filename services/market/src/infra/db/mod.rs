//! sea-orm implementations of the repository ports.

mod account;
mod audit;
mod broadcast;
mod category;
mod chat;
mod order;
mod page;
mod product;
mod review;
mod store;
mod subscription;
mod unlock;

pub use account::DbAccountRepository;
pub use audit::DbAuditRepository;
pub use broadcast::DbBroadcastRepository;
pub use category::DbCategoryRepository;
pub use chat::DbChatRepository;
pub use order::DbOrderRepository;
pub use page::DbPageRepository;
pub use product::DbProductRepository;
pub use review::DbReviewRepository;
pub use store::DbStoreRepository;
pub use subscription::DbSubscriptionRepository;
pub use unlock::DbUnlockRequestRepository;

use anyhow::Context as _;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DbErr, SqlErr};

use cmse_market_schema::audit_logs;

use crate::domain::types::AuditEntry;
use crate::error::MarketError;

/// Insert an audit row on `conn`, usually the transaction of the change it describes.
pub(crate) async fn insert_audit<C: ConnectionTrait>(
    conn: &C,
    entry: &AuditEntry,
) -> Result<(), MarketError> {
    audit_logs::ActiveModel {
        id: Set(entry.id),
        actor_id: Set(entry.actor_id),
        action: Set(entry.action.clone()),
        entity_type: Set(entry.entity_type.clone()),
        entity_id: Set(entry.entity_id.clone()),
        details: Set(entry.details.clone()),
        created_at: Set(entry.created_at),
    }
    .insert(conn)
    .await
    .context("insert audit log")?;
    Ok(())
}

/// Map a unique-constraint violation to its conflict error. Everything else is internal.
pub(crate) fn map_unique_violation(err: DbErr, context: &'static str) -> MarketError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        let conflict = [
            ("users_email_key", MarketError::EmailAlreadyExists),
            ("users_its_number_key", MarketError::ItsNumberAlreadyExists),
            ("stores_slug_key", MarketError::StoreSlugTaken),
            ("stores_owner_id_key", MarketError::StoreAlreadyExists),
            ("categories_slug_key", MarketError::CategorySlugTaken),
            ("pages_slug_key", MarketError::PageSlugTaken),
            ("subscription_tiers_name_key", MarketError::TierNameTaken),
            ("uq_reviews_product_user", MarketError::ReviewAlreadyExists),
        ]
        .into_iter()
        .find(|(constraint, _)| detail.contains(constraint));
        if let Some((_, conflict)) = conflict {
            return conflict;
        }
    }
    MarketError::Internal(anyhow::Error::new(err).context(context))
}

/// Escape `%`, `_` and `\` for a `LIKE` pattern.
pub(crate) fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
