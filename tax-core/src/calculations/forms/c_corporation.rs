//! Form 1120, U.S. Corporation Income Tax Return.
//!
//! Rule parameters: `charitable_limit_rate` (10% of taxable income before
//! the charitable deduction), `dividends_received_rate` (50% of dividends
//! from less-than-20%-owned domestic corporations) and
//! `nol_limitation_rate` (80% of taxable income). Tax is the flat `CORP`
//! schedule.

use super::FormCalculator;
use crate::calculations::common::{min, non_negative};
use crate::calculations::evaluator::{Clamp, LineDef, LineResult, LineScope};
use crate::models::{FormCode, InputKind};
use crate::validation::InputSpec;

const ORDINARY_DEDUCTIONS: &[&str] = &[
    "compensation_of_officers",
    "salaries_and_wages",
    "repairs_and_maintenance",
    "bad_debts",
    "rents",
    "taxes_and_licenses",
    "interest_expense",
    "depreciation",
    "advertising",
    "other_deductions",
];

const INPUTS: &[InputSpec] = &[
    InputSpec::required("gross_receipts", InputKind::Amount),
    InputSpec::optional("returns_and_allowances", InputKind::Amount),
    InputSpec::optional("cost_of_goods_sold", InputKind::Amount),
    InputSpec::optional("dividends", InputKind::Amount),
    InputSpec::optional("interest_income", InputKind::Amount),
    InputSpec::optional("capital_gains", InputKind::Amount),
    InputSpec::optional("other_income", InputKind::Amount),
    InputSpec::optional("compensation_of_officers", InputKind::Amount),
    InputSpec::optional("salaries_and_wages", InputKind::Amount),
    InputSpec::optional("repairs_and_maintenance", InputKind::Amount),
    InputSpec::optional("bad_debts", InputKind::Amount),
    InputSpec::optional("rents", InputKind::Amount),
    InputSpec::optional("taxes_and_licenses", InputKind::Amount),
    InputSpec::optional("interest_expense", InputKind::Amount),
    InputSpec::optional("depreciation", InputKind::Amount),
    InputSpec::optional("advertising", InputKind::Amount),
    InputSpec::optional("other_deductions", InputKind::Amount),
    InputSpec::optional("charitable_contributions", InputKind::Amount),
    InputSpec::optional("nol_carryover", InputKind::Amount),
    InputSpec::optional("credits", InputKind::Amount),
    InputSpec::optional("estimated_payments", InputKind::Amount),
];

const LINES: &[LineDef] = &[
    LineDef::new(
        "gross_profit",
        "gross_receipts − returns_and_allowances − cost_of_goods_sold",
        gross_profit,
    ),
    LineDef::new(
        "total_income",
        "gross_profit + dividends + interest_income + capital_gains + other_income",
        total_income,
    ),
    LineDef::new(
        "deductions_before_charitable",
        "sum of ordinary deductions",
        deductions_before_charitable,
    ),
    LineDef::new(
        "charitable_contribution_limit",
        "charitable_limit_rate × (total_income − deductions_before_charitable)",
        charitable_contribution_limit,
    ),
    LineDef::new(
        "charitable_deduction",
        "min(charitable_contributions, charitable_contribution_limit)",
        charitable_deduction,
    ),
    LineDef::new(
        "total_deductions",
        "deductions_before_charitable + charitable_deduction",
        total_deductions,
    ),
    LineDef::new(
        "taxable_income_before_nol",
        "total_income − total_deductions",
        taxable_income_before_nol,
    ),
    LineDef::new(
        "dividends_received_deduction",
        "dividends × dividends_received_rate",
        dividends_received_deduction,
    ),
    LineDef::new(
        "nol_deduction",
        "min(nol_carryover, nol_limitation_rate × (taxable_income_before_nol − dividends_received_deduction))",
        nol_deduction,
    ),
    LineDef::new(
        "taxable_income",
        "taxable_income_before_nol − nol_deduction − dividends_received_deduction",
        taxable_income,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new("income_tax", "CORP schedule applied to taxable_income", income_tax),
    LineDef::new(
        "tax_after_credits",
        "income_tax − credits",
        tax_after_credits,
    )
    .with_clamp(Clamp::NON_NEGATIVE),
    LineDef::new("total_payments", "estimated_payments", total_payments),
    LineDef::new(
        "amount_owed",
        "max(tax_after_credits − total_payments, 0)",
        amount_owed,
    ),
    LineDef::new(
        "overpayment",
        "max(total_payments − tax_after_credits, 0)",
        overpayment,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Form1120;

impl FormCalculator for Form1120 {
    fn form_code(&self) -> &'static str {
        FormCode::CCorporation.as_str()
    }

    fn description(&self) -> &'static str {
        FormCode::CCorporation.title()
    }

    fn input_specs(&self) -> &'static [InputSpec] {
        INPUTS
    }

    fn line_table(&self) -> &'static [LineDef] {
        LINES
    }
}

fn gross_profit(s: &mut LineScope<'_, '_>) -> LineResult {
    let receipts = s.amount("gross_receipts")?;
    Ok(receipts - s.sum_or_zero(&["returns_and_allowances", "cost_of_goods_sold"])?)
}

fn total_income(s: &mut LineScope<'_, '_>) -> LineResult {
    let gross = s.line("gross_profit")?;
    Ok(gross + s.sum_or_zero(&["dividends", "interest_income", "capital_gains", "other_income"])?)
}

fn deductions_before_charitable(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(ORDINARY_DEDUCTIONS)
}

fn charitable_contribution_limit(s: &mut LineScope<'_, '_>) -> LineResult {
    let rate = s.parameter("charitable_limit_rate")?;
    let base = s.line("total_income")? - s.line("deductions_before_charitable")?;
    Ok(rate * non_negative(base))
}

fn charitable_deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    let contributions = s.amount_or_zero("charitable_contributions")?;
    Ok(min(contributions, s.line("charitable_contribution_limit")?))
}

fn total_deductions(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("deductions_before_charitable")? + s.line("charitable_deduction")?)
}

fn taxable_income_before_nol(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("total_income")? - s.line("total_deductions")?)
}

fn dividends_received_deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.amount_or_zero("dividends")? * s.parameter("dividends_received_rate")?)
}

fn nol_deduction(s: &mut LineScope<'_, '_>) -> LineResult {
    let carryover = s.amount_or_zero("nol_carryover")?;
    let rate = s.parameter("nol_limitation_rate")?;
    let base = s.line("taxable_income_before_nol")? - s.line("dividends_received_deduction")?;
    Ok(min(non_negative(carryover), rate * non_negative(base)))
}

fn taxable_income(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("taxable_income_before_nol")?
        - s.line("nol_deduction")?
        - s.line("dividends_received_deduction")?)
}

fn income_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    let taxable = s.line("taxable_income")?;
    s.bracket_tax("CORP", taxable)
}

fn tax_after_credits(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("income_tax")? - s.amount_or_zero("credits")?)
}

fn total_payments(s: &mut LineScope<'_, '_>) -> LineResult {
    s.amount_or_zero("estimated_payments")
}

fn amount_owed(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("tax_after_credits")? - s.line("total_payments")?))
}

fn overpayment(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("total_payments")? - s.line("tax_after_credits")?))
}
