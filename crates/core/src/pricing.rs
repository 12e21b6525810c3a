//! Derived product properties.
//!
//! All money arithmetic uses [`Decimal`]; percentages are rounded to two
//! decimal places using banker's rounding.

use rust_decimal::Decimal;

/// Stock level strictly below which an in-stock product counts as low.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// A product can be sold when inventory is not tracked, stock is positive, or
/// backorders are allowed.
pub fn is_in_stock(track_inventory: bool, stock_quantity: i32, allow_backorder: bool) -> bool {
    !track_inventory || stock_quantity > 0 || allow_backorder
}

/// `0 < stock_quantity < LOW_STOCK_THRESHOLD`.
pub fn is_low_stock(stock_quantity: i32) -> bool {
    stock_quantity > 0 && stock_quantity < LOW_STOCK_THRESHOLD
}

/// `(compare - price) / compare * 100` when a higher compare-at price is set,
/// otherwise zero.
pub fn discount_percentage(price: Decimal, compare_price: Option<Decimal>) -> Decimal {
    match compare_price {
        Some(compare) if compare > price && !compare.is_zero() => {
            ((compare - price) / compare * Decimal::ONE_HUNDRED).round_dp(2)
        }
        _ => Decimal::ZERO,
    }
}

/// `(price - cost) / price * 100` when a positive cost is set, otherwise zero.
pub fn profit_margin(price: Decimal, cost_price: Option<Decimal>) -> Decimal {
    match cost_price {
        Some(cost) if cost > Decimal::ZERO && !price.is_zero() => {
            ((price - cost) / price * Decimal::ONE_HUNDRED).round_dp(2)
        }
        _ => Decimal::ZERO,
    }
}

/// Alt text applied to product images uploaded without one.
pub fn default_alt_text(product_name: &str) -> String {
    format!("{product_name} image")
}
