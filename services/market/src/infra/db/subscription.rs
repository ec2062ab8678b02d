use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_market_schema::{subscription_requests, subscription_tiers, user_profiles, users};

use super::account::{role_from_db, role_to_db};
use super::{insert_audit, map_unique_violation};
use crate::domain::repository::{SubscriptionRepository, TierInput};
use crate::domain::types::{
    AuditEntry, DEFAULT_PRODUCT_LIMIT, RequestStatus, SubscriptionRequest, SubscriptionState,
    Tier,
};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbSubscriptionRepository {
    pub db: DatabaseConnection,
}

impl SubscriptionRepository for DbSubscriptionRepository {
    async fn list_tiers(&self, include_inactive: bool) -> Result<Vec<Tier>, MarketError> {
        let mut query = subscription_tiers::Entity::find();
        if !include_inactive {
            query = query.filter(subscription_tiers::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_asc(subscription_tiers::Column::Price)
            .order_by_asc(subscription_tiers::Column::Id)
            .all(&self.db)
            .await
            .context("list tiers")?;
        Ok(models.into_iter().map(tier_from_model).collect())
    }

    async fn find_tier(&self, id: i32) -> Result<Option<Tier>, MarketError> {
        let model = subscription_tiers::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find tier")?;
        Ok(model.map(tier_from_model))
    }

    async fn tier_name_taken(
        &self,
        name: &str,
        exclude: Option<i32>,
    ) -> Result<bool, MarketError> {
        let mut query =
            subscription_tiers::Entity::find().filter(subscription_tiers::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(subscription_tiers::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.context("count tier name")?;
        Ok(count > 0)
    }

    async fn create_tier(&self, input: &TierInput) -> Result<Tier, MarketError> {
        let model = subscription_tiers::ActiveModel {
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            price: Set(input.price),
            product_limit: Set(input.product_limit),
            duration_days: Set(input.duration_days),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "insert tier"))?;
        Ok(tier_from_model(model))
    }

    async fn update_tier(&self, id: i32, input: &TierInput) -> Result<(), MarketError> {
        subscription_tiers::ActiveModel {
            id: Set(id),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            price: Set(input.price),
            product_limit: Set(input.product_limit),
            duration_days: Set(input.duration_days),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "update tier"))?;
        Ok(())
    }

    async fn set_tier_active(&self, id: i32, active: bool) -> Result<(), MarketError> {
        subscription_tiers::Entity::update_many()
            .col_expr(subscription_tiers::Column::IsActive, Expr::value(active))
            .filter(subscription_tiers::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("set tier active")?;
        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<SubscriptionRequest>, MarketError> {
        let model = subscription_requests::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find subscription request")?;
        Ok(model.map(request_from_model))
    }

    async fn has_pending_request(&self, user_id: Uuid) -> Result<bool, MarketError> {
        let count = subscription_requests::Entity::find()
            .filter(subscription_requests::Column::UserId.eq(user_id))
            .filter(subscription_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .count(&self.db)
            .await
            .context("count pending requests")?;
        Ok(count > 0)
    }

    async fn create_request(&self, request: &SubscriptionRequest) -> Result<(), MarketError> {
        subscription_requests::ActiveModel {
            id: Set(request.id),
            user_id: Set(request.user_id),
            requested_tier_id: Set(request.requested_tier_id),
            status: Set(request.status.as_str().to_owned()),
            prorated_credit: Set(request.prorated_credit),
            amount_due: Set(request.amount_due),
            note: Set(request.note.clone()),
            previous_tier_id: Set(None),
            previous_role: Set(None),
            previous_product_limit: Set(None),
            previous_started_at: Set(None),
            previous_expires_at: Set(None),
            decided_by: Set(None),
            decided_at: Set(None),
            created_at: Set(request.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert subscription request")?;
        Ok(())
    }

    async fn list_requests_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError> {
        let models = subscription_requests::Entity::find()
            .filter(subscription_requests::Column::UserId.eq(user_id))
            .order_by_desc(subscription_requests::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list user subscription requests")?;
        Ok(models.into_iter().map(request_from_model).collect())
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
        page: PageRequest,
    ) -> Result<Vec<SubscriptionRequest>, MarketError> {
        let mut query = subscription_requests::Entity::find();
        if let Some(status) = status {
            query = query.filter(subscription_requests::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(subscription_requests::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list subscription requests")?;
        Ok(models.into_iter().map(request_from_model).collect())
    }

    async fn latest_approved_request(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRequest>, MarketError> {
        let model = subscription_requests::Entity::find()
            .filter(subscription_requests::Column::UserId.eq(user_id))
            .filter(subscription_requests::Column::Status.eq(RequestStatus::Approved.as_str()))
            .order_by_desc(subscription_requests::Column::DecidedAt)
            .order_by_desc(subscription_requests::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest approved request")?;
        Ok(model.map(request_from_model))
    }

    async fn approve_request(
        &self,
        request: &SubscriptionRequest,
        previous: &SubscriptionState,
        grant: &SubscriptionState,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let now = Utc::now();
        let txn = self.db.begin().await.context("begin subscription approval")?;
        let result = subscription_requests::Entity::update_many()
            .col_expr(
                subscription_requests::Column::Status,
                Expr::value(RequestStatus::Approved.as_str()),
            )
            .col_expr(
                subscription_requests::Column::PreviousTierId,
                Expr::value(previous.tier_id),
            )
            .col_expr(
                subscription_requests::Column::PreviousRole,
                Expr::value(Some(role_to_db(previous.role))),
            )
            .col_expr(
                subscription_requests::Column::PreviousProductLimit,
                Expr::value(Some(previous.product_limit)),
            )
            .col_expr(
                subscription_requests::Column::PreviousStartedAt,
                Expr::value(previous.started_at),
            )
            .col_expr(
                subscription_requests::Column::PreviousExpiresAt,
                Expr::value(previous.expires_at),
            )
            .col_expr(
                subscription_requests::Column::DecidedBy,
                Expr::value(Some(audit.actor_id)),
            )
            .col_expr(subscription_requests::Column::DecidedAt, Expr::value(Some(now)))
            .filter(subscription_requests::Column::Id.eq(request.id))
            .filter(subscription_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .context("mark request approved")?;
        if result.rows_affected == 0 {
            return Ok(false);
        }
        apply_state(&txn, request.user_id, grant).await?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit subscription approval")?;
        Ok(true)
    }

    async fn reject_request(
        &self,
        id: Uuid,
        decided_by: Uuid,
        note: Option<&str>,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let txn = self.db.begin().await.context("begin subscription rejection")?;
        let mut update = subscription_requests::Entity::update_many()
            .col_expr(
                subscription_requests::Column::Status,
                Expr::value(RequestStatus::Rejected.as_str()),
            )
            .col_expr(
                subscription_requests::Column::DecidedBy,
                Expr::value(Some(decided_by)),
            )
            .col_expr(
                subscription_requests::Column::DecidedAt,
                Expr::value(Some(Utc::now())),
            );
        if let Some(note) = note {
            update = update.col_expr(
                subscription_requests::Column::Note,
                Expr::value(Some(note.to_owned())),
            );
        }
        let result = update
            .filter(subscription_requests::Column::Id.eq(id))
            .filter(subscription_requests::Column::Status.eq(RequestStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .context("mark request rejected")?;
        if result.rows_affected == 0 {
            return Ok(false);
        }
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit subscription rejection")?;
        Ok(true)
    }

    async fn revert_request(
        &self,
        request: &SubscriptionRequest,
        restore: &SubscriptionState,
        audit: &AuditEntry,
    ) -> Result<bool, MarketError> {
        let txn = self.db.begin().await.context("begin subscription revert")?;
        let result = subscription_requests::Entity::update_many()
            .col_expr(
                subscription_requests::Column::Status,
                Expr::value(RequestStatus::Reverted.as_str()),
            )
            .filter(subscription_requests::Column::Id.eq(request.id))
            .filter(subscription_requests::Column::Status.eq(RequestStatus::Approved.as_str()))
            .exec(&txn)
            .await
            .context("mark request reverted")?;
        if result.rows_affected == 0 {
            return Ok(false);
        }
        apply_state(&txn, request.user_id, restore).await?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit subscription revert")?;
        Ok(true)
    }
}

/// Write tier, limit, dates and role for `user_id`.
async fn apply_state<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    state: &SubscriptionState,
) -> Result<(), MarketError> {
    let now = Utc::now();
    let profile = user_profiles::Entity::update_many()
        .col_expr(user_profiles::Column::TierId, Expr::value(state.tier_id))
        .col_expr(
            user_profiles::Column::ProductLimit,
            Expr::value(state.product_limit),
        )
        .col_expr(
            user_profiles::Column::SubscriptionStartedAt,
            Expr::value(state.started_at),
        )
        .col_expr(
            user_profiles::Column::SubscriptionExpiresAt,
            Expr::value(state.expires_at),
        )
        .col_expr(user_profiles::Column::UpdatedAt, Expr::value(now))
        .filter(user_profiles::Column::UserId.eq(user_id))
        .exec(conn)
        .await
        .context("apply subscription to profile")?;
    require_profile_updated(profile.rows_affected, user_id)?;
    users::Entity::update_many()
        .col_expr(users::Column::Role, Expr::value(role_to_db(state.role)))
        .col_expr(users::Column::UpdatedAt, Expr::value(now))
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await
        .context("apply subscription role")?;
    Ok(())
}

fn require_profile_updated(rows_affected: u64, user_id: Uuid) -> Result<(), MarketError> {
    if rows_affected == 0 {
        tracing::warn!(%user_id, "no profile row to apply subscription to");
        return Err(MarketError::UserNotFound);
    }
    Ok(())
}

fn request_status_from_db(value: &str) -> RequestStatus {
    RequestStatus::parse(value).unwrap_or(RequestStatus::Rejected)
}

fn tier_from_model(model: subscription_tiers::Model) -> Tier {
    Tier {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        product_limit: model.product_limit,
        duration_days: model.duration_days,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

fn request_from_model(model: subscription_requests::Model) -> SubscriptionRequest {
    let previous = model.previous_role.map(|role| SubscriptionState {
        tier_id: model.previous_tier_id,
        role: role_from_db(role),
        product_limit: model.previous_product_limit.unwrap_or(DEFAULT_PRODUCT_LIMIT),
        started_at: model.previous_started_at,
        expires_at: model.previous_expires_at,
    });
    SubscriptionRequest {
        id: model.id,
        user_id: model.user_id,
        requested_tier_id: model.requested_tier_id,
        status: request_status_from_db(&model.status),
        prorated_credit: model.prorated_credit,
        amount_due: model.amount_due,
        note: model.note,
        previous,
        decided_by: model.decided_by,
        decided_at: model.decided_at,
        created_at: model.created_at,
    }
}
