//! Form 1120-S, U.S. Income Tax Return for an S Corporation.
//!
//! Ordinary business income passes through to shareholders; the entity
//! itself only pays built-in gains tax at the `CORP` schedule rate.

use rust_decimal::Decimal;

use super::FormCalculator;
use crate::calculations::common::non_negative;
use crate::calculations::evaluator::{LineDef, LineResult, LineScope};
use crate::error::CalculationError;
use crate::models::{FormCode, InputKind};
use crate::validation::InputSpec;

const DEDUCTIONS: &[&str] = &[
    "compensation_of_officers",
    "salaries_and_wages",
    "repairs_and_maintenance",
    "bad_debts",
    "rents",
    "taxes_and_licenses",
    "interest_expense",
    "depreciation",
    "advertising",
    "pension_and_profit_sharing",
    "employee_benefits",
    "other_deductions",
];

const INPUTS: &[InputSpec] = &[
    InputSpec::required("gross_receipts", InputKind::Amount),
    InputSpec::required("shareholder_count", InputKind::Count).at_least(1),
    InputSpec::optional("returns_and_allowances", InputKind::Amount),
    InputSpec::optional("cost_of_goods_sold", InputKind::Amount),
    InputSpec::optional("net_gain_from_asset_sales", InputKind::Amount),
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
    InputSpec::optional("pension_and_profit_sharing", InputKind::Amount),
    InputSpec::optional("employee_benefits", InputKind::Amount),
    InputSpec::optional("other_deductions", InputKind::Amount),
    InputSpec::optional("net_recognized_built_in_gain", InputKind::Amount),
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
        "gross_profit + net_gain_from_asset_sales + other_income",
        total_income,
    ),
    LineDef::new("total_deductions", "sum of deductions", total_deductions),
    LineDef::new(
        "ordinary_business_income",
        "total_income − total_deductions",
        ordinary_business_income,
    ),
    LineDef::new(
        "built_in_gains_tax",
        "CORP schedule applied to net_recognized_built_in_gain",
        built_in_gains_tax,
    ),
    LineDef::new("total_tax", "built_in_gains_tax", total_tax),
    LineDef::new("total_payments", "estimated_payments", total_payments),
    LineDef::new(
        "amount_owed",
        "max(total_tax − total_payments, 0)",
        amount_owed,
    ),
    LineDef::new(
        "overpayment",
        "max(total_payments − total_tax, 0)",
        overpayment,
    ),
    LineDef::new(
        "income_per_shareholder",
        "ordinary_business_income ÷ shareholder_count",
        income_per_shareholder,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Form1120S;

impl FormCalculator for Form1120S {
    fn form_code(&self) -> &'static str {
        FormCode::SCorporation.as_str()
    }

    fn description(&self) -> &'static str {
        FormCode::SCorporation.title()
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
    Ok(gross + s.sum_or_zero(&["net_gain_from_asset_sales", "other_income"])?)
}

fn total_deductions(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(DEDUCTIONS)
}

fn ordinary_business_income(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("total_income")? - s.line("total_deductions")?)
}

fn built_in_gains_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    let gain = s.amount_or_zero("net_recognized_built_in_gain")?;
    s.bracket_tax("CORP", gain)
}

fn total_tax(s: &mut LineScope<'_, '_>) -> LineResult {
    s.line("built_in_gains_tax")
}

fn total_payments(s: &mut LineScope<'_, '_>) -> LineResult {
    s.amount_or_zero("estimated_payments")
}

fn amount_owed(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("total_tax")? - s.line("total_payments")?))
}

fn overpayment(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(non_negative(s.line("total_payments")? - s.line("total_tax")?))
}

fn income_per_shareholder(s: &mut LineScope<'_, '_>) -> LineResult {
    let income = s.line("ordinary_business_income")?;
    let shareholders = s.count("shareholder_count")?;
    if shareholders == 0 {
        return Err(CalculationError::invalid_input(
            "shareholder_count",
            "must be at least 1",
        ));
    }
    Ok(income / Decimal::from(shareholders))
}
