//! URL slugs for stores, categories, products and pages.

/// Maximum slug length in bytes.
pub const MAX_SLUG_LEN: usize = 80;

/// Derive a slug from free text: lowercase ASCII alphanumerics separated by
/// single hyphens. Non-ASCII characters are dropped.
///
/// Returns an empty string when nothing usable remains; callers reject that.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' || c.is_ascii_punctuation() {
            pending_hyphen = true;
        }
    }
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// A caller-supplied slug must already be in canonical form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= MAX_SLUG_LEN && slugify(slug) == slug
}
