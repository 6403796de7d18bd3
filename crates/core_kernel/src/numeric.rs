//! Decimal rounding helpers for derived metrics
//!
//! Amounts and distances are kept at full precision; only derived figures
//! (CPK, dead kilometers, ratios) are rounded, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to one decimal place
pub fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to two decimal places
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Divides `numerator` by `denominator`, or `None` when the denominator is
/// not strictly positive or the quotient overflows
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator <= Decimal::ZERO {
        return None;
    }
    numerator.checked_div(denominator)
}
