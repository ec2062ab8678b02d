use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;

use crate::domain::repository::AuditRepository;
use crate::domain::types::AuditEntry;
use crate::error::MarketError;

pub struct ListAuditLogsUseCase<L: AuditRepository> {
    pub audit: L,
}

impl<L: AuditRepository> ListAuditLogsUseCase<L> {
    /// Newest first.
    pub async fn execute(
        &self,
        actor: &Identity,
        actor_filter: Option<Uuid>,
        entity_type: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<AuditEntry>, MarketError> {
        if !actor.has_role(UserRole::SuperAdmin) {
            return Err(MarketError::Forbidden);
        }
        let entity_type = entity_type.map(str::trim).filter(|t| !t.is_empty());
        self.audit.list(actor_filter, entity_type, page).await
    }
}
