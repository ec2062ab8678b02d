//! Request identity extractors.

use axum::extract::{FromRef, FromRequestParts};
use axum_extra::extract::cookie::CookieJar;
use http::StatusCode;
use http::header::AUTHORIZATION;
use http::request::Parts;
use uuid::Uuid;

use cmse_domain::user::UserRole;

use crate::cookie::CMSE_ACCESS_TOKEN;
use crate::token::validate_access_token;

/// HMAC secret used to validate access tokens. Expose it from app state via `FromRef`.
#[derive(Clone)]
pub struct JwtSecret(pub String);

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(..)")
    }
}

/// Authenticated user, taken from the access-token cookie or an
/// `Authorization: Bearer` header (the cookie wins when both are present).
///
/// Returns 401 if no valid access token is present.
/// Role enforcement (403) is done by handlers after extraction.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Identity {
    pub fn has_role(&self, min: UserRole) -> bool {
        self.role >= min
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(CMSE_ACCESS_TOKEN) {
        return Some(cookie.value().to_owned());
    }
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_owned())
}

fn resolve(parts: &Parts, secret: &JwtSecret) -> Option<Identity> {
    let token = token_from_parts(parts)?;
    match validate_access_token(&token, &secret.0) {
        Ok(info) => Some(Identity {
            user_id: info.user_id,
            role: info.role,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "rejected access token");
            None
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = StatusCode;

    // Resolve synchronously and hand back a 'static future; see axum-core 0.5's
    // `fn -> impl Future + Send` signature.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = JwtSecret::from_ref(state);
        let identity = resolve(parts, &secret);
        async move { identity.ok_or(StatusCode::UNAUTHORIZED) }
    }
}

/// Like [`Identity`], but anonymous requests (or bad tokens) extract as `None`
/// instead of being rejected. Used by public endpoints that show more to owners.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
    JwtSecret: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = JwtSecret::from_ref(state);
        let identity = resolve(parts, &secret);
        async move { Ok(Self(identity)) }
    }
}
