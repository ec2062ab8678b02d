use anyhow::Context as _;
use axum::extract::State;
use axum::http::StatusCode;
use sea_orm::DatabaseConnection;

use crate::error::AppError;

/// Liveness probe for `GET /healthz`.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe for `GET /readyz`. Fails while the database is unreachable.
///
/// Mount on any router whose state exposes `DatabaseConnection` via `FromRef`.
pub async fn readyz(State(db): State<DatabaseConnection>) -> Result<StatusCode, AppError> {
    db.ping().await.context("database ping")?;
    Ok(StatusCode::OK)
}
