//! Decimal-string price helpers.
//!
//! Prices travel as strings end to end (the upstream store formats them that
//! way and floats would drift when displayed). Arithmetic, when needed, goes
//! through [`rust_decimal::Decimal`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a price string into a decimal amount.
///
/// Everything except digits, `.` and `-` is stripped first, so display
/// strings such as `"₺149.90"` or `"149.90 TRY"` parse. Returns `None` for
/// blank or unparsable input.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Percentage saved when buying at `sale` instead of `regular`.
///
/// Rounded half away from zero and clamped to `0..=100`. Returns 0 when either
/// price is missing, the regular price is not positive, or the sale price is
/// not lower.
#[must_use]
pub fn discount_percent(regular: &str, sale: &str) -> u32 {
    let (Some(regular), Some(sale)) = (parse_amount(regular), parse_amount(sale)) else {
        return 0;
    };
    if regular <= Decimal::ZERO || sale >= regular {
        return 0;
    }

    let percent = (regular - sale) / regular * Decimal::ONE_HUNDRED;
    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .map_or(0, |p| p.min(100))
}

/// Format an amount with exactly two decimal places.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
