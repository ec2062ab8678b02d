use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error rendered as the uniform `{"kind", "message"}` JSON body.
///
/// Service error enums implement this and forward `IntoResponse` to [`render`].
pub trait ErrorBody: std::error::Error {
    /// Stable `SCREAMING_SNAKE_CASE` identifier clients can match on.
    fn kind(&self) -> &'static str;
    fn status(&self) -> StatusCode;
}

/// Build the JSON error response for `err`.
///
/// Only 5xx are logged. tower-http TraceLayer already records method/uri/status for all
/// requests, and 4xx are expected client errors. The `Debug` form keeps the anyhow chain.
pub fn render<E: ErrorBody + std::fmt::Debug>(err: &E) -> Response {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = ?err, kind = err.kind(), "internal error");
    }
    let body = serde_json::json!({
        "kind": err.kind(),
        "message": err.to_string(),
    });
    (status, axum::Json(body)).into_response()
}

/// Common application error variants.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ErrorBody for AppError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        render(&self)
    }
}
