pub mod account;
pub mod audit;
pub mod broadcast;
pub mod cart;
pub mod category;
pub mod chat;
pub mod moderation;
pub mod order;
pub mod page;
pub mod product;
pub mod review;
pub mod store;
pub mod subscription;
pub mod unlock;

use crate::error::MarketError;

/// Trim `value`; empty is `MissingData`, more than `max_chars` is `InvalidInput(too_long)`.
pub(crate) fn required_text(
    value: &str,
    max_chars: usize,
    too_long: &'static str,
) -> Result<String, MarketError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MarketError::MissingData);
    }
    if value.chars().count() > max_chars {
        return Err(MarketError::InvalidInput(too_long));
    }
    Ok(value.to_owned())
}

/// Like [`required_text`], but blank input becomes `None`.
pub(crate) fn optional_text(
    value: Option<&str>,
    max_chars: usize,
    too_long: &'static str,
) -> Result<Option<String>, MarketError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(v, max_chars, too_long).map(Some),
    }
}
