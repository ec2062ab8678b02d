//! Cookie builders for access and refresh tokens.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const CMSE_ACCESS_TOKEN: &str = "cmse_access_token";

/// Cookie name for the refresh token.
pub const CMSE_REFRESH_TOKEN: &str = "cmse_refresh_token";

/// Path the refresh cookie is scoped to; only the token endpoints ever see it.
pub const REFRESH_COOKIE_PATH: &str = "/auth/token";

/// Access-token JWT lifetime in seconds (4 hours).
pub const ACCESS_TOKEN_EXP: u64 = 14400;

/// Refresh-token JWT lifetime and cookie Max-Age for both tokens, in seconds (7 days).
pub const REFRESH_TOKEN_EXP: u64 = 604800;

fn token_cookie(
    name: &'static str,
    value: String,
    path: &'static str,
    domain: String,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .domain(domain)
        .max_age(max_age)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Set the access-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use cmse_auth_types::cookie::{set_access_token_cookie, CMSE_ACCESS_TOKEN};
///
/// let jar = CookieJar::new();
/// let jar = set_access_token_cookie(jar, "token_value".to_string(), "example.com".to_string());
/// let cookie = jar.get(CMSE_ACCESS_TOKEN).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_access_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(token_cookie(
        CMSE_ACCESS_TOKEN,
        value,
        "/",
        domain,
        Duration::seconds(REFRESH_TOKEN_EXP as i64),
    ))
}

/// Set the refresh-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use cmse_auth_types::cookie::{set_refresh_token_cookie, CMSE_REFRESH_TOKEN};
///
/// let jar = CookieJar::new();
/// let jar = set_refresh_token_cookie(jar, "refresh_value".to_string(), "example.com".to_string());
/// let cookie = jar.get(CMSE_REFRESH_TOKEN).unwrap();
/// assert_eq!(cookie.path(), Some("/auth/token"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// ```
pub fn set_refresh_token_cookie(jar: CookieJar, value: String, domain: String) -> CookieJar {
    jar.add(token_cookie(
        CMSE_REFRESH_TOKEN,
        value,
        REFRESH_COOKIE_PATH,
        domain,
        Duration::seconds(REFRESH_TOKEN_EXP as i64),
    ))
}

/// Clear both token cookies by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use cmse_auth_types::cookie::{
///     clear_cookies, set_access_token_cookie, set_refresh_token_cookie,
///     CMSE_ACCESS_TOKEN, CMSE_REFRESH_TOKEN,
/// };
///
/// let jar = CookieJar::new();
/// let jar = set_access_token_cookie(jar, "a".to_string(), "example.com".to_string());
/// let jar = set_refresh_token_cookie(jar, "r".to_string(), "example.com".to_string());
/// let jar = clear_cookies(jar, "example.com".to_string());
/// let access = jar.get(CMSE_ACCESS_TOKEN).unwrap();
/// let refresh = jar.get(CMSE_REFRESH_TOKEN).unwrap();
/// assert_eq!(access.max_age(), Some(time::Duration::ZERO));
/// assert_eq!(refresh.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_cookies(jar: CookieJar, domain: String) -> CookieJar {
    let access = token_cookie(
        CMSE_ACCESS_TOKEN,
        String::new(),
        "/",
        domain.clone(),
        Duration::ZERO,
    );
    let refresh = token_cookie(
        CMSE_REFRESH_TOKEN,
        String::new(),
        REFRESH_COOKIE_PATH,
        domain,
        Duration::ZERO,
    );
    jar.add(access).add(refresh)
}
