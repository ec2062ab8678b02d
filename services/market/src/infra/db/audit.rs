use anyhow::Context as _;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::audit_logs;

use super::insert_audit;
use crate::domain::repository::AuditRepository;
use crate::domain::types::AuditEntry;
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbAuditRepository {
    pub db: DatabaseConnection,
}

impl AuditRepository for DbAuditRepository {
    async fn record(&self, entry: &AuditEntry) -> Result<(), MarketError> {
        insert_audit(&self.db, entry).await
    }

    async fn list(
        &self,
        actor_id: Option<Uuid>,
        entity_type: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<AuditEntry>, MarketError> {
        let mut query = audit_logs::Entity::find();
        if let Some(actor_id) = actor_id {
            query = query.filter(audit_logs::Column::ActorId.eq(actor_id));
        }
        if let Some(entity_type) = entity_type {
            query = query.filter(audit_logs::Column::EntityType.eq(entity_type));
        }
        let models = query
            .order_by_desc(audit_logs::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list audit logs")?;
        Ok(models
            .into_iter()
            .map(|m| AuditEntry {
                id: m.id,
                actor_id: m.actor_id,
                action: m.action,
                entity_type: m.entity_type,
                entity_id: m.entity_id,
                details: m.details,
                created_at: m.created_at,
            })
            .collect())
    }
}
