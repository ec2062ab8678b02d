use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::{unlock_requests, users};

use super::insert_audit;
use crate::domain::repository::UnlockRequestRepository;
use crate::domain::types::{AuditEntry, RequestStatus, UnlockRequest};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbUnlockRequestRepository {
    pub db: DatabaseConnection,
}

impl UnlockRequestRepository for DbUnlockRequestRepository {
    async fn has_pending(&self, user_id: Uuid) -> Result<bool, MarketError> {
        let count = unlock_requests::Entity::find()
            .filter(unlock_requests::Column::UserId.eq(user_id))
            .filter(unlock_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .count(&self.db)
            .await
            .context("count pending unlock requests")?;
        Ok(count > 0)
    }

    async fn create(&self, request: &UnlockRequest) -> Result<(), MarketError> {
        unlock_requests::ActiveModel {
            id: Set(request.id),
            user_id: Set(request.user_id),
            reason: Set(request.reason.clone()),
            status: Set(request.status.as_str().to_owned()),
            decided_by: Set(request.decided_by),
            decided_at: Set(request.decided_at),
            created_at: Set(request.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert unlock request")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UnlockRequest>, MarketError> {
        let model = unlock_requests::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find unlock request")?;
        Ok(model.map(unlock_from_model))
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<UnlockRequest>, MarketError> {
        let mut query = unlock_requests::Entity::find();
        if let Some(status) = status {
            query = query.filter(unlock_requests::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(unlock_requests::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list unlock requests")?;
        Ok(models.into_iter().map(unlock_from_model).collect())
    }

    async fn decide(
        &self,
        request: &UnlockRequest,
        status: RequestStatus,
        decided_by: Uuid,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let now = Utc::now();
        let txn = self.db.begin().await.context("begin unlock decision")?;
        let result = unlock_requests::Entity::update_many()
            .col_expr(unlock_requests::Column::Status, Expr::value(status.as_str()))
            .col_expr(unlock_requests::Column::DecidedBy, Expr::value(Some(decided_by)))
            .col_expr(unlock_requests::Column::DecidedAt, Expr::value(Some(now)))
            .filter(unlock_requests::Column::Id.eq(request.id))
            .filter(unlock_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .context("apply unlock decision")?;
        if result.rows_affected == 0 {
            return Ok(false);
        }
        if status == RequestStatus::Approved {
            users::Entity::update_many()
                .col_expr(users::Column::IsLocked, Expr::value(false))
                .col_expr(users::Column::UpdatedAt, Expr::value(now))
                .filter(users::Column::Id.eq(request.user_id))
                .exec(&txn)
                .await
                .context("unlock user")?;
        }
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit unlock decision")?;
        Ok(true)
    }
}

fn unlock_from_model(model: unlock_requests::Model) -> UnlockRequest {
    UnlockRequest {
        id: model.id,
        user_id: model.user_id,
        reason: model.reason,
        status: RequestStatus::parse(&model.status).unwrap_or(RequestStatus::Rejected),
        decided_by: model.decided_by,
        decided_at: model.decided_at,
        created_at: model.created_at,
    }
}
