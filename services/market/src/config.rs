/// Marketplace service configuration loaded from environment variables.
#[derive(Debug)]
pub struct MarketConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// HMAC secret for access and refresh tokens. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// Domain attribute for the token cookies. Env var: `COOKIE_DOMAIN`.
    pub cookie_domain: String,
    /// TCP port for the HTTP server (default 3120). Env var: `MARKET_PORT`.
    pub market_port: u16,
    /// Root directory for uploaded images (default `uploads`). Env var: `UPLOAD_DIR`.
    pub upload_dir: String,
    /// Largest accepted upload in bytes (default 5 MiB). Env var: `MAX_UPLOAD_BYTES`.
    pub max_upload_bytes: usize,
}

pub const DEFAULT_MARKET_PORT: u16 = 3120;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

impl MarketConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            cookie_domain: std::env::var("COOKIE_DOMAIN").expect("COOKIE_DOMAIN"),
            market_port: std::env::var("MARKET_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MARKET_PORT),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_owned()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}
