//! Decimal helpers for reporting simulation results.
//!
//! The simulation runs in `f64`; reported figures are converted to
//! `Decimal` so summaries and CSV exports carry fixed precision.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

/// Convert an `f64` to `Decimal`.
///
/// NaN maps to zero. Values beyond `Decimal`'s range, infinities included,
/// saturate to `Decimal::MAX` / `Decimal::MIN`.
pub fn to_decimal(value: f64) -> Decimal {
    if value.is_nan() {
        warn!("NaN reported as zero");
        return Decimal::ZERO;
    }

    match Decimal::from_f64_retain(value) {
        Some(d) => d,
        None => {
            warn!("{} is outside the decimal range, saturating", value);
            if value.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        }
    }
}

/// Convert and round to a number of decimal places.
pub fn to_decimal_dp(value: f64, decimals: u32) -> Decimal {
    round_to_precision(to_decimal(value), decimals)
}

/// Round a decimal to a specific number of decimal places.
pub fn round_to_precision(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp(decimals)
}

/// Express `part` as a percentage of `whole`.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    safe_div(part, whole).saturating_mul(dec!(100))
}

/// Division that returns zero if divisor is zero and saturates on overflow.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        return Decimal::ZERO;
    }

    numerator.checked_div(denominator).unwrap_or_else(|| {
        if numerator.is_sign_negative() != denominator.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_decimal_handles_non_finite() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
        assert_eq!(to_decimal(f64::INFINITY), Decimal::MAX);
        assert_eq!(to_decimal(f64::NEG_INFINITY), Decimal::MIN);
        assert_eq!(to_decimal_dp(1234.5678, 2), dec!(1234.57));
    }

    #[test]
    fn test_to_decimal_saturates_out_of_range() {
        assert_eq!(to_decimal(1e40), Decimal::MAX);
        assert_eq!(to_decimal(-1e40), Decimal::MIN);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec!(50), dec!(1000)), dec!(5));
        assert_eq!(percent_of(dec!(50), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_safe_div_saturates() {
        assert_eq!(safe_div(Decimal::MAX, dec!(0.01)), Decimal::MAX);
        assert_eq!(safe_div(Decimal::MAX, dec!(-0.01)), Decimal::MIN);
        assert_eq!(safe_div(dec!(10), dec!(4)), dec!(2.5));
    }

    #[test]
    fn test_round_to_precision() {
        assert_eq!(round_to_precision(dec!(50123.456), 2), dec!(50123.46));
        assert_eq!(round_to_precision(dec!(50123.456), 0), dec!(50123));
    }
}
