use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use cmse_core::error::{ErrorBody, render};

/// Marketplace service error variants.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    // ── 400 ──
    #[error("missing data")]
    MissingData,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be between 8 and 128 characters")]
    WeakPassword,
    #[error("ITS number must be exactly 8 digits")]
    InvalidItsNumber,
    #[error("unsupported file type")]
    InvalidFileType,
    #[error("cart is empty")]
    CartEmpty,

    // ── 401 / 403 ──
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is locked")]
    AccountLocked,
    #[error("forbidden")]
    Forbidden,
    #[error("only customers who bought this product can review it")]
    NotPurchased,

    // ── 404 ──
    #[error("user not found")]
    UserNotFound,
    #[error("store not found")]
    StoreNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("subscription tier not found")]
    TierNotFound,
    #[error("request not found")]
    RequestNotFound,
    #[error("review not found")]
    ReviewNotFound,
    #[error("message not found")]
    MessageNotFound,
    #[error("page not found")]
    PageNotFound,
    #[error("broadcast not found")]
    BroadcastNotFound,

    // ── 409 ──
    #[error("email already registered")]
    EmailAlreadyExists,
    #[error("ITS number already registered")]
    ItsNumberAlreadyExists,
    #[error("store slug already taken")]
    StoreSlugTaken,
    #[error("seller already has a store")]
    StoreAlreadyExists,
    #[error("category slug already taken")]
    CategorySlugTaken,
    #[error("category cannot be its own ancestor")]
    CategoryCycle,
    #[error("category has child categories or products")]
    CategoryInUse,
    #[error("page slug already taken")]
    PageSlugTaken,
    #[error("tier name already taken")]
    TierNameTaken,
    #[error("product limit reached")]
    ProductLimitReached,
    #[error("insufficient stock")]
    InsufficientStock,
    #[error("product unavailable")]
    ProductUnavailable,
    #[error("invalid state")]
    InvalidState,
    #[error("invalid status transition")]
    InvalidStatusTransition,
    #[error("requested tier is not an upgrade")]
    NotAnUpgrade,
    #[error("a request is already pending")]
    RequestAlreadyPending,
    #[error("review already exists")]
    ReviewAlreadyExists,
    #[error("account is not locked")]
    AccountNotLocked,

    // ── 413 / 500 ──
    #[error("file too large")]
    FileTooLarge,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for MarketError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.into())
    }
}

impl From<tower_sessions::session::Error> for MarketError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(anyhow::Error::new(err).context("session store"))
    }
}

impl ErrorBody for MarketError {
    fn kind(&self) -> &'static str {
        match self {
            Self::MissingData => "MISSING_DATA",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InvalidItsNumber => "INVALID_ITS_NUMBER",
            Self::InvalidFileType => "INVALID_FILE_TYPE",
            Self::CartEmpty => "CART_EMPTY",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotPurchased => "NOT_PURCHASED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::StoreNotFound => "STORE_NOT_FOUND",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::TierNotFound => "TIER_NOT_FOUND",
            Self::RequestNotFound => "REQUEST_NOT_FOUND",
            Self::ReviewNotFound => "REVIEW_NOT_FOUND",
            Self::MessageNotFound => "MESSAGE_NOT_FOUND",
            Self::PageNotFound => "PAGE_NOT_FOUND",
            Self::BroadcastNotFound => "BROADCAST_NOT_FOUND",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::ItsNumberAlreadyExists => "ITS_NUMBER_ALREADY_EXISTS",
            Self::StoreSlugTaken => "STORE_SLUG_TAKEN",
            Self::StoreAlreadyExists => "STORE_ALREADY_EXISTS",
            Self::CategorySlugTaken => "CATEGORY_SLUG_TAKEN",
            Self::CategoryCycle => "CATEGORY_CYCLE",
            Self::CategoryInUse => "CATEGORY_IN_USE",
            Self::PageSlugTaken => "PAGE_SLUG_TAKEN",
            Self::TierNameTaken => "TIER_NAME_TAKEN",
            Self::ProductLimitReached => "PRODUCT_LIMIT_REACHED",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::ProductUnavailable => "PRODUCT_UNAVAILABLE",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
            Self::NotAnUpgrade => "NOT_AN_UPGRADE",
            Self::RequestAlreadyPending => "REQUEST_ALREADY_PENDING",
            Self::ReviewAlreadyExists => "REVIEW_ALREADY_EXISTS",
            Self::AccountNotLocked => "ACCOUNT_NOT_LOCKED",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MissingData
            | Self::InvalidInput(_)
            | Self::InvalidEmail
            | Self::WeakPassword
            | Self::InvalidItsNumber
            | Self::InvalidFileType
            | Self::CartEmpty => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountLocked | Self::Forbidden | Self::NotPurchased => StatusCode::FORBIDDEN,
            Self::UserNotFound
            | Self::StoreNotFound
            | Self::CategoryNotFound
            | Self::ProductNotFound
            | Self::OrderNotFound
            | Self::TierNotFound
            | Self::RequestNotFound
            | Self::ReviewNotFound
            | Self::MessageNotFound
            | Self::PageNotFound
            | Self::BroadcastNotFound => StatusCode::NOT_FOUND,
            Self::EmailAlreadyExists
            | Self::ItsNumberAlreadyExists
            | Self::StoreSlugTaken
            | Self::StoreAlreadyExists
            | Self::CategorySlugTaken
            | Self::CategoryCycle
            | Self::CategoryInUse
            | Self::PageSlugTaken
            | Self::TierNameTaken
            | Self::ProductLimitReached
            | Self::InsufficientStock
            | Self::ProductUnavailable
            | Self::InvalidState
            | Self::InvalidStatusTransition
            | Self::NotAnUpgrade
            | Self::RequestAlreadyPending
            | Self::ReviewAlreadyExists
            | Self::AccountNotLocked => StatusCode::CONFLICT,
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        render(&self)
    }
}
