//! JWT issuing and validation.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cmse_domain::user::UserRole;

use crate::cookie::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};

/// User identity extracted from a validated token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub role: UserRole,
    pub exp: u64,
}

/// Errors returned by token validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("wrong token kind")]
    WrongKind,
    #[error("failed to sign token")]
    Signing,
}

/// Distinguishes access tokens from refresh tokens so one cannot stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn lifetime(self) -> u64 {
        match self {
            Self::Access => ACCESS_TOKEN_EXP,
            Self::Refresh => REFRESH_TOKEN_EXP,
        }
    }
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user ID (UUID string) |
/// | `role` | custom | [`UserRole`] wire value |
/// | `kind` | custom | access or refresh |
/// | `exp` | `exp` | seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub role: u8,
    pub kind: TokenKind,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Sign a token of the given kind. Returns the token and its expiry (seconds since epoch).
pub fn issue_token(
    user_id: Uuid,
    role: UserRole,
    kind: TokenKind,
    secret: &str,
) -> Result<(String, u64), AuthError> {
    let exp = now_secs() + kind.lifetime();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        role: role.as_u8(),
        kind,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "jwt encode failed");
        AuthError::Signing
    })?;
    Ok((token, exp))
}

/// Decode and validate a JWT, returning raw claims.
///
/// Validation: HS256, exp checked, required claims: `exp` + `sub`.
/// Default leeway = 60s.
fn decode_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_) => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    Ok(data.claims)
}

fn validate(token: &str, secret: &str, expected: TokenKind) -> Result<TokenInfo, AuthError> {
    let claims = decode_jwt(token, secret)?;
    if claims.kind != expected {
        return Err(AuthError::WrongKind);
    }
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    let role = UserRole::from_u8(claims.role).ok_or(AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        role,
        exp: claims.exp,
    })
}

/// Validate an access token (cookie value or bearer credential).
pub fn validate_access_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    validate(token, secret, TokenKind::Access)
}

/// Validate a refresh token. The role inside is informational only; the
/// refresh flow reloads the user before issuing new tokens.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    validate(token, secret, TokenKind::Refresh)
}
