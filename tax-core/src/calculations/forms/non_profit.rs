//! Form 990, Return of Organization Exempt From Income Tax.
//!
//! Exempt revenue is reported, not taxed. Unrelated business income above
//! the `ubit_specific_deduction` is taxed at the `CORP` schedule.

use super::FormCalculator;
use crate::calculations::common::non_negative;
use crate::calculations::evaluator::{LineDef, LineResult, LineScope};
use crate::models::{FormCode, InputKind};
use crate::validation::InputSpec;

const INPUTS: &[InputSpec] = &[
    InputSpec::required("contributions", InputKind::Amount),
    InputSpec::optional("program_service_revenue", InputKind::Amount),
    InputSpec::optional("investment_income", InputKind::Amount),
    InputSpec::optional("other_revenue", InputKind::Amount),
    InputSpec::optional("grants_paid", InputKind::Amount),
    InputSpec::optional("benefits_paid", InputKind::Amount),
    InputSpec::optional("salaries_and_compensation", InputKind::Amount),
    InputSpec::optional("professional_fees", InputKind::Amount),
    InputSpec::optional("occupancy", InputKind::Amount),
    InputSpec::optional("other_expenses", InputKind::Amount),
    InputSpec::optional("net_assets_beginning_of_year", InputKind::Amount),
    InputSpec::optional("unrelated_business_gross_income", InputKind::Amount),
    InputSpec::optional("unrelated_business_deductions", InputKind::Amount),
];

const LINES: &[LineDef] = &[
    LineDef::new(
        "total_revenue",
        "contributions + program_service_revenue + investment_income + other_revenue",
        total_revenue,
    ),
    LineDef::new("total_expenses", "sum of expenses", total_expenses),
    LineDef::new(
        "revenue_less_expenses",
        "total_revenue − total_expenses",
        revenue_less_expenses,
    ),
    LineDef::new(
        "net_assets_end_of_year",
        "net_assets_beginning_of_year + revenue_less_expenses",
        net_assets_end_of_year,
    ),
    LineDef::new(
        "unrelated_business_taxable_income",
        "max(unrelated_business_gross_income − unrelated_business_deductions − ubit_specific_deduction, 0)",
        unrelated_business_taxable_income,
    ),
    LineDef::new(
        "unrelated_business_income_tax",
        "CORP schedule applied to unrelated_business_taxable_income",
        unrelated_business_income_tax,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Form990;

impl FormCalculator for Form990 {
    fn form_code(&self) -> &'static str {
        FormCode::NonProfit.as_str()
    }

    fn description(&self) -> &'static str {
        FormCode::NonProfit.title()
    }

    fn input_specs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn line_table(&self) -> &'static [LineDef] {
        LINES
    }
}

fn total_revenue(s: &mut LineScope<'_, '_>) -> LineResult {
    let contributions = s.amount("contributions")?;
    Ok(contributions
        + s.sum_or_zero(&["program_service_revenue", "investment_income", "other_revenue"])?)
}

fn total_expenses(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(&[
        "grants_paid",
        "benefits_paid",
        "salaries_and_compensation",
        "professional_fees",
        "occupancy",
        "other_expenses",
    ])
}

fn revenue_less_expenses(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("total_revenue")? - s.line("total_expenses")?)
}

fn net_assets_end_of_year(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.amount_or_zero("net_assets_beginning_of_year")? + s.line("revenue_less_expenses")?)
}

fn unrelated_business_taxable_income(s: &mut LineScope<'_, '_>) -> LineResult {
    let gross = s.amount_or_zero("unrelated_business_gross_income")?;
    let deductions = s.amount_or_zero("unrelated_business_deductions")?;
    let specific = s.parameter("ubit_specific_deduction")?;
    Ok(non_negative(gross - deductions - specific))
}

fn unrelated_business_income_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    let ubti = s.line("unrelated_business_taxable_income")?;
    s.bracket_tax("CORP", ubti)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::fixtures;
    use crate::models::TaxpayerInput;

    #[test]
    fn deficit_year_reduces_net_assets() {
        let input = TaxpayerInput::new()
            .with_amount("contributions", dec!(400000))
            .with_amount("program_service_revenue", dec!(50000))
            .with_amount("grants_paid", dec!(300000))
            .with_amount("salaries_and_compensation", dec!(200000))
            .with_amount("net_assets_beginning_of_year", dec!(1000000));

        let result = Form990
            .calculate(&input, &fixtures::federal_2023(FormCode::NonProfit))
            .unwrap();

        assert_eq!(result.value("revenue_less_expenses"), Some(dec!(-50000.00)));
        assert_eq!(result.value("net_assets_end_of_year"), Some(dec!(950000.00)));
        assert_eq!(result.value("unrelated_business_income_tax"), Some(dec!(0)));
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn unrelated_business_income_taxed_after_specific_deduction() {
        let input = TaxpayerInput::new()
            .with_amount("contributions", dec!(100000))
            .with_amount("unrelated_business_gross_income", dec!(30000))
            .with_amount("unrelated_business_deductions", dec!(9000));

        let result = Form990
            .calculate(&input, &fixtures::federal_2023(FormCode::NonProfit))
            .unwrap();

        assert_eq!(result.value("unrelated_business_taxable_income"), Some(dec!(20000.00)));
        assert_eq!(result.value("unrelated_business_income_tax"), Some(dec!(4200.00)));
    }

    #[test]
    fn small_unrelated_business_income_is_absorbed_without_warning() {
        let input = TaxpayerInput::new()
            .with_amount("contributions", dec!(100000))
            .with_amount("unrelated_business_gross_income", dec!(600));

        let result = Form990
            .calculate(&input, &fixtures::federal_2023(FormCode::NonProfit))
            .unwrap();

        assert_eq!(result.value("unrelated_business_taxable_income"), Some(dec!(0)));
        assert!(!result.get_line("unrelated_business_taxable_income").unwrap().clamped);
        assert!(result.warnings().is_empty());
    }
}
