//! Mock auth helpers for integration tests.
//!
//! `MockAuth` signs a real access token with a test secret so requests pass through
//! the same `Identity` extractor production traffic does.

use http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use cmse_auth_types::cookie::CMSE_ACCESS_TOKEN;
use cmse_auth_types::token::{TokenKind, issue_token};
use cmse_domain::user::UserRole;

/// Secret shared by test apps and [`MockAuth`].
pub const TEST_JWT_SECRET: &str = "cmse-test-jwt-secret";

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn customer() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Customer)
    }

    pub fn seller() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Seller)
    }

    pub fn admin() -> Self {
        Self::new(Uuid::new_v4(), UserRole::Admin)
    }

    /// Signed access token for this identity.
    pub fn access_token(&self) -> String {
        issue_token(self.user_id, self.role, TokenKind::Access, TEST_JWT_SECRET)
            .unwrap()
            .0
    }

    /// `Authorization: Bearer` value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token())
    }

    /// `Cookie` header value carrying the access token.
    pub fn cookie(&self) -> String {
        format!("{CMSE_ACCESS_TOKEN}={}", self.access_token())
    }

    /// Return headers as a browser holding this session would send them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&self.bearer()).unwrap(),
        );
        map
    }
}
