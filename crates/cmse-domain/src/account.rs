//! Account field validation shared by the marketplace service and the admin CLI.

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length accepted before hashing.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// ITS numbers are exactly this many ASCII digits.
pub const ITS_NUMBER_LENGTH: usize = 8;

/// Trim and lowercase an email, returning `None` when it is not address-shaped.
///
/// Requires one `@`, a non-empty local part and a dotted domain.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_ascii_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') || email.len() > 254 {
        return None;
    }
    let labels_ok = domain
        .split('.')
        .all(|label| !label.is_empty() && !label.contains(char::is_whitespace));
    if !labels_ok || !domain.contains('.') || local.contains(char::is_whitespace) {
        return None;
    }
    Some(email)
}

pub fn is_acceptable_password(password: &str) -> bool {
    let len = password.chars().count();
    (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len)
}

/// Validate an ITS merchant number.
pub fn is_valid_its_number(its: &str) -> bool {
    its.len() == ITS_NUMBER_LENGTH && its.bytes().all(|b| b.is_ascii_digit())
}
