use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use cmse_domain::pagination::PageRequest;
use cmse_domain::user::UserRole;
use cmse_market_schema::{stores, user_profiles, users};

use super::{insert_audit, like_pattern, map_unique_violation};
use crate::domain::repository::{AccountRepository, NewAccount};
use crate::domain::types::{AuditEntry, Profile, ProfileUpdate, User};
use crate::error::MarketError;

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, MarketError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, MarketError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn its_number_exists(&self, its_number: &str) -> Result<bool, MarketError> {
        let count = users::Entity::find()
            .filter(users::Column::ItsNumber.eq(its_number))
            .count(&self.db)
            .await
            .context("count users by ITS number")?;
        Ok(count > 0)
    }

    async fn create_account(&self, account: &NewAccount) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin registration")?;
        let user = &account.user;
        users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            full_name: Set(user.full_name.clone()),
            role: Set(role_to_db(user.role)),
            its_number: Set(user.its_number.clone()),
            is_locked: Set(user.is_locked),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, "insert user"))?;

        let profile = &account.profile;
        user_profiles::ActiveModel {
            user_id: Set(profile.user_id),
            phone: Set(profile.phone.clone()),
            address: Set(profile.address.clone()),
            profile_image: Set(None),
            pending_profile_image: Set(None),
            tier_id: Set(profile.tier_id),
            product_limit: Set(profile.product_limit),
            subscription_started_at: Set(profile.subscription_started_at),
            subscription_expires_at: Set(profile.subscription_expires_at),
            updated_at: Set(profile.updated_at),
        }
        .insert(&txn)
        .await
        .context("insert user profile")?;

        if let Some(store) = &account.store {
            stores::ActiveModel {
                id: Set(store.id),
                owner_id: Set(store.owner_id),
                name: Set(store.name.clone()),
                slug: Set(store.slug.clone()),
                description: Set(store.description.clone()),
                contact_email: Set(store.contact_email.clone()),
                is_active: Set(store.is_active),
                created_at: Set(store.created_at),
                updated_at: Set(store.updated_at),
            }
            .insert(&txn)
            .await
            .map_err(|e| map_unique_violation(e, "insert store"))?;
        }
        txn.commit().await.context("commit registration")?;
        Ok(())
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, MarketError> {
        let model = user_profiles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .context("find profile")?;
        Ok(model.map(profile_from_model))
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<(), MarketError> {
        let now = Utc::now();
        let txn = self.db.begin().await.context("begin profile update")?;
        if let Some(full_name) = &update.full_name {
            users::Entity::update_many()
                .col_expr(users::Column::FullName, Expr::value(full_name.clone()))
                .col_expr(users::Column::UpdatedAt, Expr::value(now))
                .filter(users::Column::Id.eq(user_id))
                .exec(&txn)
                .await
                .context("update full name")?;
        }
        if update.phone.is_some() || update.address.is_some() {
            let mut am = user_profiles::ActiveModel {
                user_id: Set(user_id),
                updated_at: Set(now),
                ..Default::default()
            };
            if let Some(phone) = &update.phone {
                am.phone = Set(Some(phone.clone()).filter(|p| !p.is_empty()));
            }
            if let Some(address) = &update.address {
                am.address = Set(Some(address.clone()).filter(|a| !a.is_empty()));
            }
            am.update(&txn).await.context("update profile")?;
        }
        txn.commit().await.context("commit profile update")?;
        Ok(())
    }

    async fn set_pending_image(
        &self,
        user_id: Uuid,
        key: &str,
    ) -> Result<Option<String>, MarketError> {
        let txn = self.db.begin().await.context("begin pending image")?;
        let previous = user_profiles::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .context("lock profile")?
            .ok_or(MarketError::UserNotFound)?
            .pending_profile_image;
        user_profiles::ActiveModel {
            user_id: Set(user_id),
            pending_profile_image: Set(Some(key.to_owned())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .context("set pending profile image")?;
        txn.commit().await.context("commit pending image")?;
        Ok(previous.filter(|p| p != key))
    }

    async fn list_pending_images(&self, page: PageRequest) -> Result<Vec<Profile>, MarketError> {
        let models = user_profiles::Entity::find()
            .filter(user_profiles::Column::PendingProfileImage.is_not_null())
            .order_by_asc(user_profiles::Column::UpdatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list pending profile images")?;
        Ok(models.into_iter().map(profile_from_model).collect())
    }

    async fn approve_pending_image(
        &self,
        user_id: Uuid,
        pending: &str,
        audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin image approval")?;
        let result = user_profiles::Entity::update_many()
            .col_expr(
                user_profiles::Column::ProfileImage,
                Expr::value(Some(pending.to_owned())),
            )
            .col_expr(
                user_profiles::Column::PendingProfileImage,
                Expr::value(Option::<String>::None),
            )
            .col_expr(user_profiles::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user_profiles::Column::UserId.eq(user_id))
            .filter(user_profiles::Column::PendingProfileImage.eq(pending))
            .exec(&txn)
            .await
            .context("approve pending image")?;
        if result.rows_affected == 0 {
            return Err(MarketError::InvalidState);
        }
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit image approval")?;
        Ok(())
    }

    async fn clear_pending_image(
        &self,
        user_id: Uuid,
        audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin image rejection")?;
        user_profiles::Entity::update_many()
            .col_expr(
                user_profiles::Column::PendingProfileImage,
                Expr::value(Option::<String>::None),
            )
            .col_expr(user_profiles::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user_profiles::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .context("clear pending image")?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit image rejection")?;
        Ok(())
    }

    async fn list_users(
        &self,
        role: Option<UserRole>,
        q: Option<&str>,
        page: PageRequest,
    ) -> Result<Vec<User>, MarketError> {
        let mut query = users::Entity::find();
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role_to_db(role)));
        }
        if let Some(q) = q {
            let pattern = like_pattern(&q.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(users::Column::Email.like(pattern.clone()))
                    .add(Expr::expr(sea_orm::sea_query::Func::lower(Expr::col(
                        users::Column::FullName,
                    )))
                    .like(pattern)),
            );
        }
        let models = query
            .order_by_desc(users::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list users")?;
        Ok(models.into_iter().map(user_from_model).collect())
    }

    async fn set_locked(
        &self,
        user_id: Uuid,
        locked: bool,
        audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin lock change")?;
        users::Entity::update_many()
            .col_expr(users::Column::IsLocked, Expr::value(locked))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await
            .context("set user locked")?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit lock change")?;
        Ok(())
    }

    async fn set_role(
        &self,
        user_id: Uuid,
        role: UserRole,
        audit: &AuditEntry,
    ) -> Result<(), MarketError> {
        let txn = self.db.begin().await.context("begin role change")?;
        users::Entity::update_many()
            .col_expr(users::Column::Role, Expr::value(role_to_db(role)))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await
            .context("set user role")?;
        insert_audit(&txn, audit).await?;
        txn.commit().await.context("commit role change")?;
        Ok(())
    }
}

pub(super) fn role_to_db(role: UserRole) -> i16 {
    i16::from(role.as_u8())
}

/// Unknown stored values fall back to the least privileged role.
pub(super) fn role_from_db(value: i16) -> UserRole {
    u8::try_from(value)
        .ok()
        .and_then(UserRole::from_u8)
        .unwrap_or(UserRole::Customer)
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        full_name: model.full_name,
        role: role_from_db(model.role),
        its_number: model.its_number,
        is_locked: model.is_locked,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn profile_from_model(model: user_profiles::Model) -> Profile {
    Profile {
        user_id: model.user_id,
        phone: model.phone,
        address: model.address,
        profile_image: model.profile_image,
        pending_profile_image: model.pending_profile_image,
        tier_id: model.tier_id,
        product_limit: model.product_limit,
        subscription_started_at: model.subscription_started_at,
        subscription_expires_at: model.subscription_expires_at,
        updated_at: model.updated_at,
    }
}
