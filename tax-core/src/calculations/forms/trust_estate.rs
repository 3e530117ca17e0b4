//! Form 1041, U.S. Income Tax Return for Estates and Trusts.
//!
//! The exemption depends on `entity_type`: `exemption_estate`,
//! `exemption_simple_trust` or `exemption_complex_trust`. Tax uses the
//! compressed `TRUST` schedule.

use super::FormCalculator;
use crate::calculations::common::{min, non_negative};
use crate::calculations::evaluator::{Clamp, LineDef, LineResult, LineScope};
use crate::error::CalculationError;
use crate::models::{FormCode, InputKind};
use crate::validation::InputSpec;

const ENTITY_TYPES: &[&str] = &["ESTATE", "SIMPLE_TRUST", "COMPLEX_TRUST"];

const INPUTS: &[InputSpec] = &[
    InputSpec::required("entity_type", InputKind::Status).one_of(ENTITY_TYPES),
    InputSpec::optional("interest_income", InputKind::Amount),
    InputSpec::optional("ordinary_dividends", InputKind::Amount),
    InputSpec::optional("business_income", InputKind::Amount),
    InputSpec::optional("capital_gains", InputKind::Amount),
    InputSpec::optional("rents_and_royalties", InputKind::Amount),
    InputSpec::optional("farm_income", InputKind::Amount),
    InputSpec::optional("other_income", InputKind::Amount),
    InputSpec::optional("interest_expense", InputKind::Amount),
    InputSpec::optional("taxes", InputKind::Amount),
    InputSpec::optional("fiduciary_fees", InputKind::Amount),
    InputSpec::optional("charitable_deduction", InputKind::Amount),
    InputSpec::optional("professional_fees", InputKind::Amount),
    InputSpec::optional("other_deductions", InputKind::Amount),
    InputSpec::optional("distributions", InputKind::Amount),
    InputSpec::optional("estimated_payments", InputKind::Amount),
    InputSpec::optional("withholding", InputKind::Amount),
];

const LINES: &[LineDef] = &[
    LineDef::new("total_income", "sum of income items", total_income),
    LineDef::new("total_deductions", "sum of deductions", total_deductions),
    LineDef::new(
        "adjusted_total_income",
        "total_income − total_deductions",
        adjusted_total_income,
    ),
    LineDef::new(
        "income_distribution_deduction",
        "min(distributions, adjusted_total_income)",
        income_distribution_deduction,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new("exemption", "exemption for entity_type", exemption),
    LineDef::new(
        "taxable_income",
        "adjusted_total_income − income_distribution_deduction − exemption",
        taxable_income,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new("income_tax", "TRUST schedule applied to taxable_income", income_tax),
    LineDef::new(
        "total_payments",
        "estimated_payments + withholding",
        total_payments,
    ),
    LineDef::new(
        "amount_owed",
        "max(income_tax − total_payments, 0)",
        amount_owed,
    ),
    LineDef::new(
        "overpayment",
        "max(total_payments − income_tax, 0)",
        overpayment,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Form1041;

impl FormCalculator for Form1041 {
    fn form_code(&self) -> &'static str {
        FormCode::TrustEstate.as_str()
    }

    fn description(&self) -> &'static str {
        FormCode::TrustEstate.title()
    }

    fn input_specs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn line_table(&self) -> &'static [LineDef] {
        LINES
    }
}

fn total_income(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(&[
        "interest_income",
        "ordinary_dividends",
        "business_income",
        "capital_gains",
        "rents_and_royalties",
        "farm_income",
        "other_income",
    ])
}

fn total_deductions(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(&[
        "interest_expense",
        "taxes",
        "fiduciary_fees",
        "charitable_deduction",
        "professional_fees",
        "other_deductions",
    ])
}

fn adjusted_total_income(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("total_income")? - s.line("total_deductions")?)
}

fn income_distribution_deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    let distributions = s.amount_or_zero("distributions")?;
    let adjusted = s.line("adjusted_total_income")?;
    Ok(min(distributions, adjusted))
}

fn exemption(s: &mut LineScope<'_, '_>) -> LineResult {
    let entity = s.status("entity_type")?;
    let parameter = match entity.trim() {
        "ESTATE" => "exemption_estate",
        "SIMPLE_TRUST" => "exemption_simple_trust",
        "COMPLEX_TRUST" => "exemption_complex_trust",
        other => {
            return Err(CalculationError::invalid_input(
                "entity_type",
                format!("'{other}' is not one of {}", ENTITY_TYPES.join(", ")),
            ));
        }
    };
    s.parameter(parameter)
}

fn taxable_income(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("adjusted_total_income")?
        - s.line("income_distribution_deduction")?
        - s.line("exemption")?)
}

fn income_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    let taxable = s.line("taxable_income")?;
    s.bracket_tax("TRUST", taxable)
}

fn total_payments(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(&["estimated_payments", "withholding"])
}

fn amount_owed(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("income_tax")? - s.line("total_payments")?))
}

fn overpayment(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("total_payments")? - s.line("income_tax")?))
}
