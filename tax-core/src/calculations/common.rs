//! Common numeric helpers shared by the bracket engine and form formulas.

use rust_decimal::Decimal;

use crate::models::RoundingMode;

/// Rounds `value` to `precision` fractional digits using `mode`. The result
/// always carries exactly `precision` digits, so `50000` becomes `50000.00`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_to;
/// use tax_core::RoundingMode;
///
/// assert_eq!(round_to(dec!(123.455), 2, RoundingMode::HalfUp), dec!(123.46));
/// assert_eq!(round_to(dec!(123.5), 0, RoundingMode::HalfUp), dec!(124));
/// assert_eq!(round_to(dec!(-123.455), 2, RoundingMode::HalfUp), dec!(-123.46)); // Away from zero
/// assert_eq!(round_to(dec!(50000), 2, RoundingMode::HalfUp).to_string(), "50000.00");
/// ```
pub fn round_to(
    value: Decimal,
    precision: u32,
    mode: RoundingMode,
) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(precision, mode.strategy());
    rounded.rescale(precision);
    rounded
}

/// Returns the larger of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the smaller of two decimal values.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// `value`, or zero when it is negative.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}
