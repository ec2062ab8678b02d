use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::identity::Identity;
use cmse_domain::user::UserRole;

use crate::domain::types::Profile;
use crate::error::MarketError;
use crate::handlers::ListQuery;
use crate::handlers::account::UserResponse;
use crate::state::AppState;
use crate::usecase::moderation::{
    ListPendingProfileImagesUseCase, ListUsersUseCase, ReviewProfileImageUseCase,
    SetUserLockedUseCase, SetUserRoleUseCase,
};

// ── GET /admin/profile-images ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PendingImageResponse {
    pub user_id: Uuid,
    pub profile_image: Option<String>,
    pub pending_profile_image: Option<String>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Profile> for PendingImageResponse {
    fn from(profile: Profile) -> Self {
        Self {
            user_id: profile.user_id,
            profile_image: profile.profile_image,
            pending_profile_image: profile.pending_profile_image,
            updated_at: profile.updated_at,
        }
    }
}

pub async fn list_pending_profile_images(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PendingImageResponse>>, MarketError> {
    let usecase = ListPendingProfileImagesUseCase {
        accounts: state.account_repo(),
    };
    let profiles = usecase.execute(&identity, query.page_request()).await?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

// ── POST /admin/profile-images/{user_id}/approve ─────────────────────────────

pub async fn approve_profile_image(
    identity: Identity,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = ReviewProfileImageUseCase {
        accounts: state.account_repo(),
        storage: state.storage(),
    };
    usecase.approve(&identity, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /admin/profile-images/{user_id}/reject ──────────────────────────────

pub async fn reject_profile_image(
    identity: Identity,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, MarketError> {
    let usecase = ReviewProfileImageUseCase {
        accounts: state.account_repo(),
        storage: state.storage(),
    };
    usecase.reject(&identity, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /admin/users ─────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct UserListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub role: Option<UserRole>,
    pub q: Option<String>,
}

pub async fn list_users(
    identity: Identity,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, MarketError> {
    let page = ListQuery {
        per_page: query.per_page,
        page: query.page,
    }
    .page_request();
    let usecase = ListUsersUseCase {
        accounts: state.account_repo(),
    };
    let users = usecase
        .execute(&identity, query.role, query.q.as_deref(), page)
        .await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

// ── PUT /admin/users/{id}/locked ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetLockedRequest {
    pub locked: bool,
}

pub async fn set_user_locked(
    identity: Identity,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetLockedRequest>,
) -> Result<StatusCode, MarketError> {
    let usecase = SetUserLockedUseCase {
        accounts: state.account_repo(),
    };
    usecase.execute(&identity, user_id, body.locked).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PUT /superadmin/users/{id}/role ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

pub async fn set_user_role(
    identity: Identity,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SetRoleRequest>,
) -> Result<StatusCode, MarketError> {
    let usecase = SetUserRoleUseCase {
        accounts: state.account_repo(),
    };
    usecase.execute(&identity, user_id, body.role).await?;
    Ok(StatusCode::NO_CONTENT)
}
