//! Slug and SKU derivation.
//!
//! Identifiers are derived from the entity name and disambiguated against the
//! identifiers already in use by appending the smallest free numeric suffix
//! (`books`, `books-1`, `books-2`, ...). The database uniqueness constraint is
//! the final arbiter: callers retry with a freshly computed identifier on a
//! violation, at most [`MAX_IDENTIFIER_ATTEMPTS`] times.

use std::collections::HashSet;

use rand::Rng;

/// Maximum stored length of a category slug.
pub const CATEGORY_SLUG_MAX_LEN: usize = 120;

/// Maximum stored length of a product slug.
pub const PRODUCT_SLUG_MAX_LEN: usize = 220;

/// Maximum stored length of a product SKU.
pub const SKU_MAX_LEN: usize = 50;

/// Number of leading alphabetic characters of the name used as SKU prefix.
pub const SKU_PREFIX_LEN: usize = 3;

/// Prefix used when the product name has no alphabetic characters.
pub const SKU_FALLBACK_PREFIX: &str = "PRD";

/// Bound on optimistic create attempts for auto-derived identifiers.
pub const MAX_IDENTIFIER_ATTEMPTS: u32 = 5;

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Convert a display name into a URL-safe slug.
///
/// ASCII letters, digits and underscores are kept (lowercased), runs of
/// whitespace and hyphens collapse into a single hyphen, and every other
/// character is dropped. Leading and trailing hyphens/underscores are trimmed.
///
/// ```
/// use storefront_core::slug::slugify;
///
/// assert_eq!(slugify("iPhone 15"), "iphone-15");
/// assert_eq!(slugify("Books & Media"), "books-media");
/// ```
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_whitespace() {
            pending_hyphen = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Slug base for a new entity: the slugified name, or `fallback` when the
/// name contains nothing slug-worthy.
pub fn slug_base(name: &str, fallback: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Whether `value` is already in slug form (non-empty, lowercase ASCII
/// letters, digits, `-` and `_`).
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

// ---------------------------------------------------------------------------
// Disambiguation
// ---------------------------------------------------------------------------

/// Return `base` if it is free, otherwise `base-N` for the smallest `N >= 1`
/// not present in `taken`.
///
/// The base is truncated so that the result never exceeds `max_len` bytes.
/// Identifiers are ASCII, except SKU prefixes which may carry non-ASCII
/// letters; truncation always lands on a character boundary.
pub fn next_available<S: AsRef<str>>(base: &str, taken: &[S], max_len: usize) -> String {
    let taken: HashSet<&str> = taken.iter().map(AsRef::as_ref).collect();

    let base = truncate(base, max_len);
    if !taken.contains(base) {
        return base.to_string();
    }

    let mut counter: u32 = 1;
    loop {
        let candidate = with_suffix(base, counter, max_len);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

/// `base-N`, truncating `base` so the whole identifier fits in `max_len`.
fn with_suffix(base: &str, counter: u32, max_len: usize) -> String {
    let suffix = format!("-{counter}");
    let room = max_len.saturating_sub(suffix.len());
    let head = truncate(base, room).trim_end_matches('-');
    format!("{head}{suffix}")
}

fn truncate(value: &str, max_len: usize) -> &str {
    if value.len() <= max_len {
        return value;
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

// ---------------------------------------------------------------------------
// SKUs
// ---------------------------------------------------------------------------

/// Uppercased first [`SKU_PREFIX_LEN`] alphabetic characters of `name`.
pub fn sku_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(SKU_PREFIX_LEN)
        .flat_map(char::to_uppercase)
        .collect();

    if prefix.is_empty() {
        SKU_FALLBACK_PREFIX.to_string()
    } else {
        prefix
    }
}

/// Generate a SKU candidate: `<PREFIX>-<six random digits>`.
pub fn generate_sku<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    let digits: u32 = rng.random_range(100_000..1_000_000);
    format!("{}-{digits}", sku_prefix(name))
}
