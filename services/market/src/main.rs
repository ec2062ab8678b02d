use sea_orm::Database;
use tracing::info;

use cmse_auth_types::identity::JwtSecret;
use cmse_core::tracing::init_tracing;

use cmse_market::config::MarketConfig;
use cmse_market::infra::storage::LocalFileStorage;
use cmse_market::router::build_router;
use cmse_market::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = MarketConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("failed to create upload directory");

    let state = AppState {
        db,
        jwt_secret: JwtSecret(config.jwt_secret),
        cookie_domain: config.cookie_domain,
        storage: LocalFileStorage::new(&config.upload_dir),
        max_upload_bytes: config.max_upload_bytes,
    };

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.market_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("market service listening on {http_addr}");
    axum::serve(listener, router).await.expect("server error");
}
