use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_auth_types::cookie::{
    CMSE_REFRESH_TOKEN, clear_cookies, set_access_token_cookie, set_refresh_token_cookie,
};
use cmse_auth_types::identity::Identity;
use cmse_domain::user::UserRole;

use crate::domain::types::{Profile, ProfileUpdate, User};
use crate::error::MarketError;
use crate::handlers::read_upload;
use crate::handlers::store::StoreResponse;
use crate::handlers::subscription::TierResponse;
use crate::state::AppState;
use crate::usecase::account::{
    GetMeUseCase, LoginUseCase, RefreshTokenUseCase, RegisterCustomerInput,
    RegisterCustomerUseCase, RegisterSellerInput, RegisterSellerUseCase, TokenPair,
    UpdateProfileUseCase, UploadProfileImageUseCase,
};

const X_CMSE_ACCESS_TOKEN_EXPIRES: &str = "x-cmse-access-token-expires";

fn token_expires_header(exp: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(X_CMSE_ACCESS_TOKEN_EXPIRES),
        HeaderValue::from(exp),
    );
    headers
}

fn set_token_cookies(jar: CookieJar, tokens: TokenPair, domain: &str) -> CookieJar {
    let jar = set_access_token_cookie(jar, tokens.access_token, domain.to_owned());
    set_refresh_token_cookie(jar, tokens.refresh_token, domain.to_owned())
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub its_number: Option<String>,
    pub is_locked: bool,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            its_number: user.its_number,
            is_locked: user.is_locked,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub pending_profile_image: Option<String>,
    pub tier_id: Option<i32>,
    pub product_limit: i32,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub subscription_started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(serialize_with = "cmse_core::serde::to_rfc3339_ms_opt")]
    pub subscription_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            phone: profile.phone,
            address: profile.address,
            profile_image: profile.profile_image,
            pending_profile_image: profile.pending_profile_image,
            tier_id: profile.tier_id,
            product_limit: profile.product_limit,
            subscription_started_at: profile.subscription_started_at,
            subscription_expires_at: profile.subscription_expires_at,
        }
    }
}

// ── POST /auth/register/customer ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterCustomerRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

pub async fn register_customer(
    State(state): State<AppState>,
    Json(body): Json<RegisterCustomerRequest>,
) -> Result<(StatusCode, Json<UserResponse>), MarketError> {
    let usecase = RegisterCustomerUseCase {
        accounts: state.account_repo(),
        hasher: state.hasher(),
    };
    let user = usecase
        .execute(RegisterCustomerInput {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── POST /auth/register/seller ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterSellerRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub its_number: String,
    pub store_name: String,
    pub store_description: Option<String>,
}

#[derive(Serialize)]
pub struct SellerRegistrationResponse {
    pub user: UserResponse,
    pub store: StoreResponse,
}

pub async fn register_seller(
    State(state): State<AppState>,
    Json(body): Json<RegisterSellerRequest>,
) -> Result<(StatusCode, Json<SellerRegistrationResponse>), MarketError> {
    let usecase = RegisterSellerUseCase {
        accounts: state.account_repo(),
        stores: state.store_repo(),
        hasher: state.hasher(),
    };
    let (user, store) = usecase
        .execute(RegisterSellerInput {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            its_number: body.its_number,
            store_name: body.store_name,
            store_description: body.store_description,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SellerRegistrationResponse {
            user: user.into(),
            store: store.into(),
        }),
    ))
}

// ── POST /auth/token ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let usecase = LoginUseCase {
        accounts: state.account_repo(),
        hasher: state.hasher(),
        jwt_secret: state.jwt_secret.0.clone(),
    };
    let out = usecase.execute(&body.email, &body.password).await?;

    let headers = token_expires_header(out.tokens.access_token_exp);
    let jar = set_token_cookies(jar, out.tokens, &state.cookie_domain);
    let user: UserResponse = out.user.into();
    Ok((StatusCode::CREATED, jar, headers, Json(user)))
}

// ── PATCH /auth/token ────────────────────────────────────────────────────────

pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, MarketError> {
    let refresh_value = jar
        .get(CMSE_REFRESH_TOKEN)
        .map(|c| c.value().to_owned())
        .ok_or(MarketError::Unauthorized)?;

    let usecase = RefreshTokenUseCase {
        accounts: state.account_repo(),
        jwt_secret: state.jwt_secret.0.clone(),
    };
    let tokens = usecase.execute(&refresh_value).await?;

    let headers = token_expires_header(tokens.access_token_exp);
    let jar = set_token_cookies(jar, tokens, &state.cookie_domain);
    Ok((StatusCode::CREATED, jar, headers))
}

// ── DELETE /auth/token ───────────────────────────────────────────────────────

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = clear_cookies(jar, state.cookie_domain.clone());
    (StatusCode::NO_CONTENT, jar)
}

// ── GET /users/@me ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub profile: ProfileResponse,
    pub tier: Option<TierResponse>,
}

pub async fn get_me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, MarketError> {
    let usecase = GetMeUseCase {
        accounts: state.account_repo(),
        subscriptions: state.subscription_repo(),
    };
    let me = usecase.execute(identity.user_id).await?;
    Ok(Json(MeResponse {
        user: me.user.into(),
        profile: me.profile.into(),
        tier: me.tier.map(Into::into),
    }))
}

// ── PATCH /users/@me ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub async fn update_me(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<StatusCode, MarketError> {
    let usecase = UpdateProfileUseCase {
        accounts: state.account_repo(),
    };
    usecase
        .execute(
            identity.user_id,
            ProfileUpdate {
                full_name: body.full_name,
                phone: body.phone,
                address: body.address,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PUT /users/@me/profile-image ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct UploadResponse {
    pub key: String,
}

pub async fn upload_profile_image(
    identity: Identity,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), MarketError> {
    let upload = read_upload(multipart).await?;
    let usecase = UploadProfileImageUseCase {
        accounts: state.account_repo(),
        storage: state.storage(),
        max_upload_bytes: state.max_upload_bytes,
    };
    let key = usecase
        .execute(identity.user_id, &upload.filename, &upload.bytes)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(UploadResponse { key })))
}
