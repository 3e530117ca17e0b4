//! Progressive-rate (bracket) tax.
//!
//! A schedule is an ascending list of `(lower_bound, rate)` pairs. Income in
//! each segment is taxed at that segment's rate, and the final segment runs
//! to infinity:
//!
//! | Lower bound | Rate |
//! |-------------|------|
//! | 0           | 10%  |
//! | 11,000      | 12%  |
//! | 44,725      | 22%  |
//!
//! Taxable income of 50,000 accrues `0.10 × 11,000 + 0.12 × 33,725 +
//! 0.22 × 5,275 = 6,307.50`.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxBracket;
//! use tax_core::calculations::brackets::compute_bracket_tax;
//!
//! let brackets = vec![
//!     TaxBracket::new(dec!(0), dec!(0.10)),
//!     TaxBracket::new(dec!(11000), dec!(0.12)),
//!     TaxBracket::new(dec!(44725), dec!(0.22)),
//! ];
//!
//! assert_eq!(compute_bracket_tax(dec!(50000), &brackets), dec!(6307.50));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::TaxBracket;

/// Ways a bracket schedule can be malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketError {
    #[error("schedule has no brackets")]
    Empty,

    #[error("first bracket must start at zero, got {0}")]
    FirstBoundNotZero(Decimal),

    #[error("bracket {index} lower bound {lower_bound} does not exceed the previous bound")]
    NotAscending { index: usize, lower_bound: Decimal },

    #[error("bracket {index} rate {rate} is outside [0, 1]")]
    RateOutOfRange { index: usize, rate: Decimal },
}

/// Checks that `brackets` is a usable schedule: non-empty, starting at zero,
/// strictly ascending lower bounds, and rates within `[0, 1]`.
///
/// # Errors
///
/// Returns the first [`BracketError`] found.
pub fn validate_brackets(brackets: &[TaxBracket]) -> Result<(), BracketError> {
    let first = brackets.first().ok_or(BracketError::Empty)?;
    if first.lower_bound != Decimal::ZERO {
        return Err(BracketError::FirstBoundNotZero(first.lower_bound));
    }

    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
            return Err(BracketError::RateOutOfRange {
                index,
                rate: bracket.rate,
            });
        }
        if index > 0 && bracket.lower_bound <= brackets[index - 1].lower_bound {
            return Err(BracketError::NotAscending {
                index,
                lower_bound: bracket.lower_bound,
            });
        }
    }
    Ok(())
}

/// Computes progressive tax on `amount`.
///
/// Each bracket whose lower bound is below `amount` accrues
/// `rate × (min(amount, next_lower_bound) − lower_bound)`; the last bracket's
/// rate applies to everything above its lower bound. Zero or negative
/// amounts yield zero. The result is unrounded; callers round when they
/// finalize a line.
pub fn compute_bracket_tax(
    amount: Decimal,
    brackets: &[TaxBracket],
) -> Decimal {
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut tax = Decimal::ZERO;
    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.lower_bound >= amount {
            break;
        }
        let upper = brackets
            .get(index + 1)
            .map_or(amount, |next| next.lower_bound.min(amount));
        tax += bracket.rate * (upper - bracket.lower_bound);
    }
    tax
}

/// Rate of the bracket that contains `amount`, or zero for non-positive
/// amounts.
pub fn marginal_rate(
    amount: Decimal,
    brackets: &[TaxBracket],
) -> Decimal {
    if amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    brackets
        .iter()
        .rev()
        .find(|b| b.lower_bound < amount)
        .map_or(Decimal::ZERO, |b| b.rate)
}
