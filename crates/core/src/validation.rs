//! Field-level validation for catalog writes.
//!
//! Each validator returns [`CoreError::InvalidField`] naming the offending
//! field so the API can report it back.

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::slug;

pub const CATEGORY_NAME_MAX_LEN: usize = 100;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;
pub const SHORT_DESCRIPTION_MAX_LEN: usize = 300;
pub const META_TITLE_MAX_LEN: usize = 60;
pub const META_DESCRIPTION_MAX_LEN: usize = 160;
pub const ALT_TEXT_MAX_LEN: usize = 200;
pub const IMAGE_REF_MAX_LEN: usize = 500;

/// Smallest accepted product price.
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Money columns are NUMERIC(10,2).
const MONEY_INTEGER_DIGITS: u32 = 8;

/// Dimension and weight columns are NUMERIC(8,2).
const MEASURE_INTEGER_DIGITS: u32 = 6;

const DECIMAL_PLACES: u32 = 2;

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Required, non-blank, at most `max_len` characters.
pub fn validate_name(field: &'static str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid_field(field, "This field may not be blank"));
    }
    validate_max_len(field, value, max_len)
}

/// At most `max_len` characters.
pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(CoreError::invalid_field(
            field,
            format!("Ensure this field has no more than {max_len} characters (it has {len})"),
        ));
    }
    Ok(())
}

/// [`validate_max_len`] for optional fields; `None` is always valid.
pub fn validate_optional_len(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<(), CoreError> {
    value.map_or(Ok(()), |v| validate_max_len(field, v, max_len))
}

/// A caller-supplied slug must already be in slug form and fit its column.
pub fn validate_slug(field: &'static str, value: &str, max_len: usize) -> Result<(), CoreError> {
    if !slug::is_valid_slug(value) {
        return Err(CoreError::invalid_field(
            field,
            "Enter a valid slug consisting of lowercase letters, numbers, underscores or hyphens",
        ));
    }
    validate_max_len(field, value, max_len)
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Price must be at least 0.01, with at most two decimal places, and fit
/// NUMERIC(10,2).
pub fn validate_price(value: Decimal) -> Result<(), CoreError> {
    if value < MIN_PRICE {
        return Err(CoreError::invalid_field(
            "price",
            "Ensure this value is greater than or equal to 0.01",
        ));
    }
    validate_decimal_shape("price", value, MONEY_INTEGER_DIGITS)
}

/// Optional money amounts (`compare_price`, `cost_price`).
pub fn validate_money(field: &'static str, value: Option<Decimal>) -> Result<(), CoreError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value.is_sign_negative() {
        return Err(CoreError::invalid_field(field, "Ensure this value is not negative"));
    }
    validate_decimal_shape(field, value, MONEY_INTEGER_DIGITS)
}

/// Optional weight and dimensions.
pub fn validate_measure(field: &'static str, value: Option<Decimal>) -> Result<(), CoreError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value.is_sign_negative() {
        return Err(CoreError::invalid_field(field, "Ensure this value is not negative"));
    }
    validate_decimal_shape(field, value, MEASURE_INTEGER_DIGITS)
}

pub fn validate_non_negative(field: &'static str, value: i32) -> Result<(), CoreError> {
    if value < 0 {
        return Err(CoreError::invalid_field(
            field,
            "Ensure this value is greater than or equal to 0",
        ));
    }
    Ok(())
}

fn validate_decimal_shape(
    field: &'static str,
    value: Decimal,
    integer_digits: u32,
) -> Result<(), CoreError> {
    if value.normalize().scale() > DECIMAL_PLACES {
        return Err(CoreError::invalid_field(
            field,
            format!("Ensure that there are no more than {DECIMAL_PLACES} decimal places"),
        ));
    }
    let limit = Decimal::from(10_i64.pow(integer_digits));
    if value.abs() >= limit {
        return Err(CoreError::invalid_field(
            field,
            format!("Ensure that there are no more than {integer_digits} digits before the decimal point"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        assert_matches!(
            validate_name("name", "   ", CATEGORY_NAME_MAX_LEN),
            Err(CoreError::InvalidField { field: "name", .. })
        );
        assert!(validate_name("name", "Books", CATEGORY_NAME_MAX_LEN).is_ok());
    }

    #[test]
    fn long_name_is_rejected() {
        let name = "x".repeat(CATEGORY_NAME_MAX_LEN + 1);
        assert!(validate_name("name", &name, CATEGORY_NAME_MAX_LEN).is_err());
        assert!(validate_name("name", &name, PRODUCT_NAME_MAX_LEN).is_ok());
    }

    #[test]
    fn optional_len_accepts_none() {
        assert!(validate_optional_len("meta_title", None, META_TITLE_MAX_LEN).is_ok());
        let title = "t".repeat(META_TITLE_MAX_LEN + 1);
        assert!(validate_optional_len("meta_title", Some(&title), META_TITLE_MAX_LEN).is_err());
    }

    #[test]
    fn supplied_slug_must_be_slug_shaped() {
        assert!(validate_slug("slug", "home-garden", slug::CATEGORY_SLUG_MAX_LEN).is_ok());
        assert!(validate_slug("slug", "Home Garden", slug::CATEGORY_SLUG_MAX_LEN).is_err());
    }

    #[test]
    fn price_bounds() {
        assert!(validate_price(dec!(0.01)).is_ok());
        assert!(validate_price(dec!(15999.99)).is_ok());
        assert!(validate_price(dec!(99999999.99)).is_ok());
        assert_matches!(
            validate_price(dec!(0)),
            Err(CoreError::InvalidField { field: "price", .. })
        );
        assert!(validate_price(dec!(-5)).is_err());
        assert!(validate_price(dec!(100000000)).is_err());
    }

    #[test]
    fn price_allows_at_most_two_decimal_places() {
        assert!(validate_price(dec!(9.999)).is_err());
        assert!(validate_price(dec!(9.990)).is_ok());
    }

    #[test]
    fn money_and_measures_must_be_non_negative() {
        assert!(validate_money("cost_price", None).is_ok());
        assert!(validate_money("cost_price", Some(dec!(0))).is_ok());
        assert!(validate_money("cost_price", Some(dec!(-0.01))).is_err());
        assert!(validate_measure("weight", Some(dec!(999999.99))).is_ok());
        assert!(validate_measure("weight", Some(dec!(1000000))).is_err());
    }

    #[test]
    fn counts_must_be_non_negative() {
        assert!(validate_non_negative("stock_quantity", 0).is_ok());
        assert_matches!(
            validate_non_negative("stock_quantity", -1),
            Err(CoreError::InvalidField { field: "stock_quantity", .. })
        );
    }
}
