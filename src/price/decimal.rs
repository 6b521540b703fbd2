//! Money amounts.
//!
//! Amounts are `rust_decimal::Decimal`: exact base-10 values with up to 28
//! significant digits, compared and summed without float rounding. On disk
//! they are written as strings; JSON integers and floats are also accepted
//! and read digit for digit.

pub use rust_decimal::Decimal;

use crate::error::PriceError;

/// Parse an amount typed by a user or an administrator.
pub fn parse_amount(text: &str) -> Result<Decimal, PriceError> {
    text.trim()
        .parse()
        .map_err(|_| PriceError::InvalidAmount(text.to_string()))
}

/// An amount with trailing zeros trimmed, keeping at least two decimals:
/// `100` is `100.00`, `1.2345` stays `1.2345`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let amount = amount.normalize();
    if amount.scale() < 2 {
        format!("{amount:.2}")
    } else {
        amount.to_string()
    }
}
