//! Catalog query helpers shared by the repositories and the HTTP layer.
//!
//! The filter predicates themselves are expressed in SQL by the repositories;
//! this module owns the parts that must be validated or normalised before a
//! query is built: ordering, substring patterns, date bounds, pagination and
//! id-or-slug lookup keys.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate, NaiveTime};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Default number of rows per list page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum number of rows per list page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to `[1, max]`, defaulting to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Product fields a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    Name,
    Price,
    CreatedAt,
    ViewCount,
    StockQuantity,
}

impl ProductSortField {
    pub const ALL: [ProductSortField; 5] = [
        ProductSortField::Name,
        ProductSortField::Price,
        ProductSortField::CreatedAt,
        ProductSortField::ViewCount,
        ProductSortField::StockQuantity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductSortField::Name => "name",
            ProductSortField::Price => "price",
            ProductSortField::CreatedAt => "created_at",
            ProductSortField::ViewCount => "view_count",
            ProductSortField::StockQuantity => "stock_quantity",
        }
    }
}

impl FromStr for ProductSortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|f| f.as_str()).collect();
                CoreError::invalid_field(
                    "ordering",
                    format!("Unknown ordering field '{s}'. Allowed: {}", allowed.join(", ")),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One term of an `ordering` parameter such as `-price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductOrdering {
    pub field: ProductSortField,
    pub direction: SortDirection,
}

impl ProductOrdering {
    /// Newest first.
    pub const DEFAULT: ProductOrdering = ProductOrdering {
        field: ProductSortField::CreatedAt,
        direction: SortDirection::Desc,
    };

    /// Parse a comma-separated ordering list (`"-price,name"`).
    ///
    /// Blank input yields the default ordering; blank terms are skipped;
    /// unknown fields are rejected.
    pub fn parse_list(raw: Option<&str>) -> Result<Vec<ProductOrdering>, CoreError> {
        let mut terms: Vec<ProductOrdering> = Vec::new();
        for term in raw.unwrap_or_default().split(',') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            terms.push(term.parse::<ProductOrdering>()?);
        }

        if terms.is_empty() {
            terms.push(Self::DEFAULT);
        }
        Ok(terms)
    }
}

impl FromStr for ProductOrdering {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, name) = match s.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest),
            None => (SortDirection::Asc, s.strip_prefix('+').unwrap_or(s)),
        };
        Ok(ProductOrdering {
            field: name.parse()?,
            direction,
        })
    }
}

impl fmt::Display for ProductOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction == SortDirection::Desc {
            f.write_str("-")?;
        }
        f.write_str(self.field.as_str())
    }
}

// ---------------------------------------------------------------------------
// Substring patterns
// ---------------------------------------------------------------------------

/// Escape `LIKE` metacharacters (`\`, `%`, `_`) so user input matches
/// literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `ILIKE` pattern matching `input` anywhere. Blank input yields `None`,
/// meaning "no filter".
pub fn contains_pattern(input: Option<&str>) -> Option<String> {
    let input = input?.trim();
    if input.is_empty() {
        None
    } else {
        Some(format!("%{}%", escape_like(input)))
    }
}

// ---------------------------------------------------------------------------
// Date bounds
// ---------------------------------------------------------------------------

/// Inclusive lower bound: midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> Timestamp {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Exclusive upper bound: midnight UTC at the start of the day after `date`.
///
/// `None` only for the last representable date.
pub fn end_of_day_exclusive(date: NaiveDate) -> Option<Timestamp> {
    date.checked_add_days(Days::new(1)).map(start_of_day)
}

// ---------------------------------------------------------------------------
// Lookup keys
// ---------------------------------------------------------------------------

/// A path segment identifying an entity either by id or by slug.
///
/// When the segment parses as an id it is tried as an id first; the raw text
/// is always kept so the caller can fall back to a slug lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey<I> {
    pub id: Option<I>,
    pub slug: String,
}

impl<I: FromStr> LookupKey<I> {
    pub fn parse(raw: &str) -> Self {
        LookupKey {
            id: raw.parse().ok(),
            slug: raw.to_string(),
        }
    }
}

impl<I> fmt::Display for LookupKey<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{DbId, ProductId};

    #[test]
    fn clamp_limit_defaults_and_bounds() {
        assert_eq!(clamp_limit(None, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 20);
        assert_eq!(clamp_limit(Some(500), DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 100);
        assert_eq!(clamp_limit(Some(0), DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 1);
        assert_eq!(clamp_limit(Some(35), DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 35);
    }

    #[test]
    fn clamp_offset_floors_at_zero() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-3)), 0);
        assert_eq!(clamp_offset(Some(40)), 40);
    }

    #[test]
    fn ordering_defaults_to_newest_first() {
        assert_eq!(
            ProductOrdering::parse_list(None).unwrap(),
            vec![ProductOrdering::DEFAULT]
        );
        assert_eq!(
            ProductOrdering::parse_list(Some(" , ")).unwrap(),
            vec![ProductOrdering::DEFAULT]
        );
    }

    #[test]
    fn ordering_parses_direction_prefixes() {
        let terms = ProductOrdering::parse_list(Some("-price, name")).unwrap();
        assert_eq!(
            terms,
            vec![
                ProductOrdering {
                    field: ProductSortField::Price,
                    direction: SortDirection::Desc,
                },
                ProductOrdering {
                    field: ProductSortField::Name,
                    direction: SortDirection::Asc,
                },
            ]
        );
        assert_eq!(terms[0].to_string(), "-price");
    }

    #[test]
    fn unknown_ordering_field_is_rejected() {
        assert_matches!(
            ProductOrdering::parse_list(Some("price,seller")),
            Err(CoreError::InvalidField { field: "ordering", .. })
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like(r"50%_off\"), r"50\%\_off\\");
        assert_eq!(contains_pattern(Some("pho")), Some("%pho%".to_string()));
        assert_eq!(contains_pattern(Some("   ")), None);
        assert_eq!(contains_pattern(None), None);
    }

    #[test]
    fn date_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            start_of_day(date),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(
            end_of_day_exclusive(date),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn lookup_key_parses_ids_and_keeps_raw() {
        let key = LookupKey::<DbId>::parse("42");
        assert_eq!(key.id, Some(42));
        assert_eq!(key.slug, "42");

        let key = LookupKey::<DbId>::parse("books");
        assert_eq!(key.id, None);
        assert_eq!(key.slug, "books");

        let uuid = ProductId::new_v4();
        let key = LookupKey::<ProductId>::parse(&uuid.to_string());
        assert_eq!(key.id, Some(uuid));
    }
}
