use anyhow::{Result, bail};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use cmse_domain::account::{is_acceptable_password, normalize_email};
use cmse_domain::user::UserRole;
use cmse_market::domain::repository::{
    AccountRepository, NewAccount, PasswordHasher, SubscriptionRepository, TierInput,
};
use cmse_market::domain::types::{AuditEntry, DEFAULT_PRODUCT_LIMIT, Profile, User};
use cmse_market::infra::db::{DbAccountRepository, DbSubscriptionRepository};
use cmse_market::infra::password::Argon2Hasher;

pub async fn create_superadmin(
    db: DatabaseConnection,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<()> {
    let Some(email) = normalize_email(email) else {
        bail!("invalid email address: {email}");
    };
    let accounts = DbAccountRepository { db };

    if let Some(user) = accounts.find_user_by_email(&email).await? {
        if user.role == UserRole::SuperAdmin {
            tracing::info!(user_id = %user.id, "already a superadmin");
            return Ok(());
        }
        let audit = AuditEntry::new(user.id, "user.role", "user", user.id)
            .with_details(format!("{} -> superadmin (cmse-admin)", user.role.as_str()));
        accounts
            .set_role(user.id, UserRole::SuperAdmin, &audit)
            .await?;
        tracing::info!(user_id = %user.id, "promoted existing account to superadmin");
        return Ok(());
    }

    if !is_acceptable_password(password) {
        bail!("password must be between 8 and 128 characters");
    }
    let full_name = full_name.trim();
    if full_name.is_empty() {
        bail!("full name is required");
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        email,
        password_hash: Argon2Hasher.hash(password)?,
        full_name: full_name.to_owned(),
        role: UserRole::SuperAdmin,
        its_number: None,
        is_locked: false,
        created_at: now,
        updated_at: now,
    };
    let account = NewAccount {
        profile: Profile::empty(user.id, DEFAULT_PRODUCT_LIMIT, now),
        user,
        store: None,
    };
    accounts.create_account(&account).await?;
    tracing::info!(user_id = %account.user.id, "superadmin created");
    Ok(())
}

/// Tiers offered on a fresh install.
pub fn default_tiers() -> Vec<TierInput> {
    let tier = |name: &str, description: &str, cents: i64, product_limit: i32| TierInput {
        name: name.to_owned(),
        description: Some(description.to_owned()),
        price: Decimal::new(cents, 2),
        product_limit,
        duration_days: 30,
    };
    vec![
        tier("Basic", "Room for a small catalogue", 0, DEFAULT_PRODUCT_LIMIT),
        tier("Standard", "For growing stores", 1999, 15),
        tier("Premium", "For established sellers", 4999, 50),
    ]
}

pub async fn seed_tiers(db: DatabaseConnection) -> Result<()> {
    let subscriptions = DbSubscriptionRepository { db };
    for input in default_tiers() {
        if subscriptions.tier_name_taken(&input.name, None).await? {
            tracing::info!(name = %input.name, "tier exists, skipping");
            continue;
        }
        let tier = subscriptions.create_tier(&input).await?;
        tracing::info!(tier_id = tier.id, name = %tier.name, "tier created");
    }
    Ok(())
}
