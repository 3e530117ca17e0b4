use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FilingStatusCode;

/// A benefit that shrinks in fixed steps once income passes a threshold.
///
/// Each started `step` of income above the filing-status threshold removes
/// `reduction_per_step` from the benefit. For the child tax credit this is
/// $50 for every $1,000 (or part of $1,000) over the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOut {
    pub thresholds: BTreeMap<FilingStatusCode, Decimal>,
    pub step: Decimal,
    pub reduction_per_step: Decimal,
}

impl PhaseOut {
    /// Amount to remove from the benefit, or `None` when no threshold is
    /// defined for `status`.
    pub fn reduction(
        &self,
        status: FilingStatusCode,
        income: Decimal,
    ) -> Option<Decimal> {
        let threshold = *self.thresholds.get(&status)?;
        if income <= threshold || self.step <= Decimal::ZERO {
            return Some(Decimal::ZERO);
        }

        let steps = ((income - threshold) / self.step).ceil();
        Some(steps * self.reduction_per_step)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn child_credit_phase_out() -> PhaseOut {
        PhaseOut {
            thresholds: BTreeMap::from([
                (FilingStatusCode::Single, dec!(200000)),
                (FilingStatusCode::MarriedFilingJointly, dec!(400000)),
            ]),
            step: dec!(1000),
            reduction_per_step: dec!(50),
        }
    }

    #[test]
    fn no_reduction_at_threshold() {
        let phase_out = child_credit_phase_out();

        assert_eq!(
            phase_out.reduction(FilingStatusCode::Single, dec!(200000)),
            Some(dec!(0))
        );
    }

    #[test]
    fn partial_step_counts_as_full_step() {
        let phase_out = child_credit_phase_out();

        assert_eq!(
            phase_out.reduction(FilingStatusCode::Single, dec!(200000.01)),
            Some(dec!(50))
        );
    }

    #[test]
    fn reduction_scales_with_steps() {
        let phase_out = child_credit_phase_out();

        // 410,500 - 400,000 = 10,500 → 11 steps
        assert_eq!(
            phase_out.reduction(FilingStatusCode::MarriedFilingJointly, dec!(410500)),
            Some(dec!(550))
        );
    }

    #[test]
    fn missing_threshold_returns_none() {
        let phase_out = child_credit_phase_out();

        assert_eq!(
            phase_out.reduction(FilingStatusCode::HeadOfHousehold, dec!(500000)),
            None
        );
    }
}
