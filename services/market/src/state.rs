use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use cmse_auth_types::identity::JwtSecret;

use crate::infra::db::{
    DbAccountRepository, DbAuditRepository, DbBroadcastRepository, DbCategoryRepository,
    DbChatRepository, DbOrderRepository, DbPageRepository, DbProductRepository,
    DbReviewRepository, DbStoreRepository, DbSubscriptionRepository, DbUnlockRequestRepository,
};
use crate::infra::password::Argon2Hasher;
use crate::infra::storage::LocalFileStorage;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: JwtSecret,
    pub cookie_domain: String,
    pub storage: LocalFileStorage,
    pub max_upload_bytes: usize,
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl AppState {
    pub fn account_repo(&self) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn store_repo(&self) -> DbStoreRepository {
        DbStoreRepository {
            db: self.db.clone(),
        }
    }

    pub fn category_repo(&self) -> DbCategoryRepository {
        DbCategoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }

    pub fn subscription_repo(&self) -> DbSubscriptionRepository {
        DbSubscriptionRepository {
            db: self.db.clone(),
        }
    }

    pub fn review_repo(&self) -> DbReviewRepository {
        DbReviewRepository {
            db: self.db.clone(),
        }
    }

    pub fn chat_repo(&self) -> DbChatRepository {
        DbChatRepository {
            db: self.db.clone(),
        }
    }

    pub fn audit_repo(&self) -> DbAuditRepository {
        DbAuditRepository {
            db: self.db.clone(),
        }
    }

    pub fn unlock_repo(&self) -> DbUnlockRequestRepository {
        DbUnlockRequestRepository {
            db: self.db.clone(),
        }
    }

    pub fn page_repo(&self) -> DbPageRepository {
        DbPageRepository {
            db: self.db.clone(),
        }
    }

    pub fn broadcast_repo(&self) -> DbBroadcastRepository {
        DbBroadcastRepository {
            db: self.db.clone(),
        }
    }

    pub fn hasher(&self) -> Argon2Hasher {
        Argon2Hasher
    }

    pub fn storage(&self) -> LocalFileStorage {
        self.storage.clone()
    }
}
