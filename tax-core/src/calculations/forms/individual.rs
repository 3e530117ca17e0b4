//! Form 1040, U.S. Individual Income Tax Return.
//!
//! Covers wage, investment and sole-proprietor income, self-employment tax
//! (Schedule SE), the standard/itemized deduction choice, the qualified
//! business income deduction and the child tax credit with its phase-out.
//!
//! ## Rule parameters
//!
//! | Name | Meaning |
//! |------|---------|
//! | `se_net_earnings_factor` | share of business income subject to SE tax (0.9235) |
//! | `se_social_security_rate` | 12.4% |
//! | `se_medicare_rate` | 2.9% |
//! | `social_security_wage_base` | SS earnings cap, shared with W-2 wages |
//! | `se_minimum_earnings` | no SE tax below this (400) |
//! | `se_deductible_share` | half of SE tax is an adjustment to income |
//! | `qbi_rate` | QBI deduction rate (20%) |
//! | `child_tax_credit_per_child` | credit per qualifying child |
//!
//! Also reads the `X`, `Y-1`, `Y-2` and `Z` schedules, the standard
//! deduction table and the `child_tax_credit` phase-out.

use rust_decimal::Decimal;

use super::FormCalculator;
use crate::calculations::common::{max, min, non_negative};
use crate::calculations::evaluator::{Clamp, LineDef, LineResult, LineScope};
use crate::models::{FilingStatusCode, FormCode, InputKind};
use crate::validation::InputSpec;

const FILING_STATUSES: &[&str] = &["S", "MFJ", "MFS", "HOH", "QSS"];

const INPUTS: &[InputSpec] = &[
    InputSpec::required("filing_status", InputKind::Status).one_of(FILING_STATUSES),
    InputSpec::required("wages", InputKind::Amount),
    InputSpec::optional("taxable_interest", InputKind::Amount),
    InputSpec::optional("ordinary_dividends", InputKind::Amount),
    InputSpec::optional("business_income", InputKind::Amount),
    InputSpec::optional("capital_gains", InputKind::Amount),
    InputSpec::optional("other_income", InputKind::Amount),
    InputSpec::optional("ira_deduction", InputKind::Amount),
    InputSpec::optional("student_loan_interest", InputKind::Amount),
    InputSpec::optional("itemized_deductions", InputKind::Amount),
    InputSpec::optional("qualifying_children", InputKind::Count),
    InputSpec::optional("other_credits", InputKind::Amount),
    InputSpec::optional("federal_withholding", InputKind::Amount),
    InputSpec::optional("estimated_payments", InputKind::Amount),
];

const LINES: &[LineDef] = &[
    LineDef::new(
        "total_income",
        "wages + taxable_interest + ordinary_dividends + business_income + capital_gains + other_income",
        total_income,
    ),
    LineDef::new(
        "se_net_earnings",
        "business_income × se_net_earnings_factor",
        se_net_earnings,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new(
        "se_tax",
        "min(se_net_earnings, wage base − wages) × SS rate + se_net_earnings × Medicare rate; 0 below se_minimum_earnings",
        se_tax,
    ),
    LineDef::new(
        "se_tax_deduction",
        "se_tax × se_deductible_share",
        se_tax_deduction,
    ),
    LineDef::new(
        "adjustments",
        "se_tax_deduction + ira_deduction + student_loan_interest",
        adjustments,
    ),
    LineDef::new(
        "adjusted_gross_income",
        "total_income − adjustments",
        adjusted_gross_income,
    ),
    LineDef::new(
        "standard_deduction",
        "standard deduction for filing_status",
        standard_deduction,
    ),
    LineDef::new(
        "deduction",
        "max(itemized_deductions, standard_deduction)",
        deduction,
    ),
    LineDef::new(
        "qbi_deduction",
        "qbi_rate × min(business_income, adjusted_gross_income − deduction)",
        qbi_deduction,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new(
        "taxable_income",
        "adjusted_gross_income − deduction − qbi_deduction",
        taxable_income,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new(
        "income_tax",
        "filing-status schedule applied to taxable_income",
        income_tax,
    ),
    LineDef::new(
        "child_tax_credit",
        "max(qualifying_children × credit per child − phase-out reduction on adjusted_gross_income, 0)",
        child_tax_credit,
    ),
    LineDef::new(
        "total_credits",
        "child_tax_credit + other_credits",
        total_credits,
    ),
    LineDef::new(
        "tax_after_credits",
        "income_tax − total_credits",
        tax_after_credits,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new("total_tax", "tax_after_credits + se_tax", total_tax),
    LineDef::new(
        "total_payments",
        "federal_withholding + estimated_payments",
        total_payments,
    ),
    LineDef::new("refund", "max(total_payments − total_tax, 0)", refund),
    LineDef::new(
        "amount_owed",
        "max(total_tax − total_payments, 0)",
        amount_owed,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Form1040;

impl FormCalculator for Form1040 {
    fn form_code(&self) -> &'static str {
        FormCode::Individual.as_str()
    }

    fn description(&self) -> &'static str {
        FormCode::Individual.title()
    }

    fn input_specs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn line_table(&self) -> &'static [LineDef] {
        LINES
    }
}

fn total_income(s: &mut LineScope<'_, '_>) -> LineResult {
    let wages = s.amount("wages")?;
    let other = s.sum_or_zero(&[
        "taxable_interest",
        "ordinary_dividends",
        "business_income",
        "capital_gains",
        "other_income",
    ])?;
    Ok(wages + other)
}

fn se_net_earnings(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.amount_or_zero("business_income")? * s.parameter("se_net_earnings_factor")?)
}

fn se_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    let net = s.line("se_net_earnings")?;
    let minimum = s.parameter("se_minimum_earnings")?;
    let wage_base = s.parameter("social_security_wage_base")?;
    let ss_rate = s.parameter("se_social_security_rate")?;
    let medicare_rate = s.parameter("se_medicare_rate")?;
    let wages = s.amount("wages")?;

    if net < minimum {
        return Ok(Decimal::ZERO);
    }

    // W-2 wages use up the social security base first.
    let ss_base = min(net, non_negative(wage_base - wages));
    Ok(ss_base * ss_rate + net * medicare_rate)
}

fn se_tax_deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("se_tax")? * s.parameter("se_deductible_share")?)
}

fn adjustments(s: &mut LineScope<'_, '_>) -> LineResult {
    let se = s.line("se_tax_deduction")?;
    Ok(se + s.sum_or_zero(&["ira_deduction", "student_loan_interest"])?)
}

fn adjusted_gross_income(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("total_income")? - s.line("adjustments")?)
}

fn standard_deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    let status = s.filing_status()?;
    s.standard_deduction(status)
}

fn deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    let itemized = s.amount_or_zero("itemized_deductions")?;
    Ok(max(itemized, s.line("standard_deduction")?))
}

fn qbi_deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    let business = s.amount_or_zero("business_income")?;
    let rate = s.parameter("qbi_rate")?;
    let before_qbi = s.line("adjusted_gross_income")? - s.line("deduction")?;
    Ok(rate * min(non_negative(business), non_negative(before_qbi)))
}

fn taxable_income(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("adjusted_gross_income")? - s.line("deduction")? - s.line("qbi_deduction")?)
}

fn income_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    let status = s.filing_status()?;
    let taxable = s.line("taxable_income")?;
    s.bracket_tax(status.schedule(), taxable)
}

fn child_tax_credit(s: &mut LineScope<'_, '_>) -> LineResult {
    let children = s.count_or_zero("qualifying_children")?;
    let per_child = s.parameter("child_tax_credit_per_child")?;
    let status: FilingStatusCode = s.filing_status()?;
    let agi = s.line("adjusted_gross_income")?;
    let reduction = s.phase_out_reduction("child_tax_credit", status, agi)?;

    // A fully phased-out credit is zero, not a clamp.
    Ok(non_negative(Decimal::from(children) * per_child - reduction))
}

fn total_credits(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("child_tax_credit")? + s.amount_or_zero("other_credits")?)
}

fn tax_after_credits(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("income_tax")? - s.line("total_credits")?)
}

fn total_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("tax_after_credits")? + s.line("se_tax")?)
}

fn total_payments(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(&["federal_withholding", "estimated_payments"])
}

fn refund(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("total_payments")? - s.line("total_tax")?))
}

fn amount_owed(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("total_tax")? - s.line("total_payments")?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::CalculationError;
    use crate::fixtures;
    use crate::graph::NodeId;
    use crate::models::{CalculationResult, TaxpayerInput, Warning};

    fn calculate(input: &TaxpayerInput) -> CalculationResult {
        Form1040
            .calculate(input, &fixtures::federal_2023(FormCode::Individual))
            .unwrap()
    }

    fn single(wages: Decimal) -> TaxpayerInput {
        TaxpayerInput::new()
            .with_status("filing_status", "S")
            .with_amount("wages", wages)
    }

    // =========================================================================
    // income tax tests
    // =========================================================================

    #[test]
    fn single_wage_earner_reaches_bracket_example() {
        // 63,850 − 13,850 standard deduction = 50,000 taxable
        let result = calculate(&single(dec!(63850)));

        assert_eq!(result.value("adjusted_gross_income"), Some(dec!(63850.00)));
        assert_eq!(result.value("taxable_income"), Some(dec!(50000.00)));
        assert_eq!(result.value("income_tax"), Some(dec!(6307.50)));
        assert_eq!(result.value("total_tax"), Some(dec!(6307.50)));
    }

    #[test]
    fn joint_filers_use_schedule_y1() {
        let input = TaxpayerInput::new()
            .with_status("filing_status", "MFJ")
            .with_amount("wages", dec!(127700));

        let result = calculate(&input);

        // 127,700 − 27,700 = 100,000: 0.10 × 22,000 + 0.12 × 67,450 + 0.22 × 10,550
        assert_eq!(result.value("taxable_income"), Some(dec!(100000.00)));
        assert_eq!(result.value("income_tax"), Some(dec!(12615.00)));
        assert!(
            result
                .get_line("income_tax")
                .unwrap()
                .depends_on
                .contains(&NodeId::rule("schedule.Y-1"))
        );
    }

    #[test]
    fn itemized_deductions_win_when_larger() {
        let input = single(dec!(80000)).with_amount("itemized_deductions", dec!(20000));

        let result = calculate(&input);

        assert_eq!(result.value("deduction"), Some(dec!(20000.00)));
        assert_eq!(result.value("taxable_income"), Some(dec!(60000.00)));
    }

    #[test]
    fn low_income_clamps_taxable_income_with_warning() {
        let result = calculate(&single(dec!(5000)));

        assert_eq!(result.value("taxable_income"), Some(dec!(0)));
        assert_eq!(result.value("income_tax"), Some(dec!(0)));
        assert!(
            result
                .warnings()
                .iter()
                .any(|w| w.code == Warning::CLAMPED && w.line_code.as_deref() == Some("taxable_income"))
        );
    }

    // =========================================================================
    // self-employment tests
    // =========================================================================

    #[test]
    fn self_employment_tax_on_business_income() {
        let input = single(dec!(0)).with_amount("business_income", dec!(50000));

        let result = calculate(&input);

        // 50,000 × 0.9235 = 46,175; × (0.124 + 0.029) = 7,064.775 → 7,064.78
        assert_eq!(result.value("se_net_earnings"), Some(dec!(46175.00)));
        assert_eq!(result.value("se_tax"), Some(dec!(7064.78)));
        assert_eq!(result.value("se_tax_deduction"), Some(dec!(3532.39)));
        assert_eq!(result.value("adjusted_gross_income"), Some(dec!(46467.61)));
    }

    #[test]
    fn wages_use_up_social_security_base() {
        let input = single(dec!(160200)).with_amount("business_income", dec!(10000));

        let result = calculate(&input);

        // only Medicare applies: 9,235 × 0.029 = 267.815 → 267.82
        assert_eq!(result.value("se_tax"), Some(dec!(267.82)));
    }

    #[test]
    fn no_self_employment_tax_below_minimum() {
        let input = single(dec!(30000)).with_amount("business_income", dec!(400));

        let result = calculate(&input);

        // 400 × 0.9235 = 369.40 < 400
        assert_eq!(result.value("se_tax"), Some(dec!(0)));
    }

    #[test]
    fn business_loss_clamps_se_net_earnings() {
        let input = single(dec!(60000)).with_amount("business_income", dec!(-5000));

        let result = calculate(&input);

        assert_eq!(result.value("se_net_earnings"), Some(dec!(0)));
        assert_eq!(result.value("total_income"), Some(dec!(55000.00)));
        assert_eq!(result.value("qbi_deduction"), Some(dec!(0)));
    }

    #[test]
    fn qbi_deduction_limited_by_business_income() {
        let input = single(dec!(100000)).with_amount("business_income", dec!(10000));

        let result = calculate(&input);

        assert_eq!(result.value("qbi_deduction"), Some(dec!(2000.00)));
    }

    // =========================================================================
    // credit and payment tests
    // =========================================================================

    #[test]
    fn child_tax_credit_reduces_tax() {
        let input = single(dec!(63850)).with_count("qualifying_children", 2);

        let result = calculate(&input);

        assert_eq!(result.value("child_tax_credit"), Some(dec!(4000.00)));
        assert_eq!(result.value("tax_after_credits"), Some(dec!(2307.50)));
    }

    #[test]
    fn fully_phased_out_child_tax_credit_is_zero_without_warning() {
        // AGI 300,000 is 100,000 over: 100 × 50 = 5,000 > 2,000
        let input = single(dec!(300000)).with_count("qualifying_children", 1);

        let result = calculate(&input);

        assert_eq!(result.value("child_tax_credit"), Some(dec!(0)));
        assert!(
            !result
                .warnings()
                .iter()
                .any(|w| w.line_code.as_deref() == Some("child_tax_credit"))
        );
    }

    #[test]
    fn child_tax_credit_phases_out_above_threshold() {
        // AGI 210,500 is 10,500 over: ceil(10.5) × 50 = 550
        let input = single(dec!(210500)).with_count("qualifying_children", 1);

        let result = calculate(&input);

        assert_eq!(result.value("child_tax_credit"), Some(dec!(1450.00)));
        assert!(
            result
                .get_line("child_tax_credit")
                .unwrap()
                .depends_on
                .contains(&NodeId::rule("phase_out.child_tax_credit"))
        );
    }

    #[test]
    fn withholding_over_tax_is_refunded() {
        let input = single(dec!(63850)).with_amount("federal_withholding", dec!(7000));

        let result = calculate(&input);

        assert_eq!(result.value("refund"), Some(dec!(692.50)));
        assert_eq!(result.value("amount_owed"), Some(dec!(0)));
    }

    #[test]
    fn underpayment_is_owed() {
        let input = single(dec!(63850)).with_amount("estimated_payments", dec!(6000));

        let result = calculate(&input);

        assert_eq!(result.value("refund"), Some(dec!(0)));
        assert_eq!(result.value("amount_owed"), Some(dec!(307.50)));
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn missing_filing_status_fails_validation() {
        let input = TaxpayerInput::new().with_amount("wages", dec!(50000));

        assert_eq!(
            Form1040.validate(&input),
            Err(CalculationError::missing_input("filing_status"))
        );
    }

    #[test]
    fn unknown_filing_status_fails_calculation() {
        let input = TaxpayerInput::new()
            .with_status("filing_status", "SINGLE")
            .with_amount("wages", dec!(50000));

        let result = Form1040.calculate(&input, &fixtures::federal_2023(FormCode::Individual));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { ref field, .. }) if field == "filing_status"
        ));
    }
}
