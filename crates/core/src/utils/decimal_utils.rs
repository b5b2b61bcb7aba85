//! Guarded decimal arithmetic shared by every engine.
//!
//! Nothing here panics: division by zero (or an overflowing quotient) yields
//! `Decimal::ZERO`, which callers treat as "not available".

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Divides `numerator` by `denominator`, returning zero when the denominator is
/// zero or the quotient does not fit.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// `part / |whole| * 100`, zero when `whole` is zero.
pub fn pct_of(part: Decimal, whole: Decimal) -> Decimal {
    safe_div(part, whole.abs()) * dec!(100)
}

/// True when the magnitude of `value` is below `threshold`.
pub fn is_dust(value: Decimal, threshold: Decimal) -> bool {
    value.abs() < threshold
}

/// Clamps `value` into `[low, high]`.
pub fn clamp(value: Decimal, low: Decimal, high: Decimal) -> Decimal {
    value.max(low).min(high)
}
