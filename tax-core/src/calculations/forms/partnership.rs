//! Form 1065, U.S. Return of Partnership Income.
//!
//! A partnership pays no income tax. The return computes ordinary business
//! income, the self-employment earnings reported to general partners
//! (ordinary income plus guaranteed payments) and an even per-partner
//! allocation.

use rust_decimal::Decimal;

use super::FormCalculator;
use crate::calculations::evaluator::{LineDef, LineResult, LineScope};
use crate::error::CalculationError;
use crate::models::{FormCode, InputKind};
use crate::validation::InputSpec;

const DEDUCTIONS: &[&str] = &[
    "salaries_and_wages",
    "guaranteed_payments",
    "repairs_and_maintenance",
    "bad_debts",
    "rents",
    "taxes_and_licenses",
    "interest_expense",
    "depreciation",
    "retirement_plans",
    "employee_benefits",
    "other_deductions",
];

const INPUTS: &[InputSpec] = &[
    InputSpec::required("gross_receipts", InputKind::Amount),
    InputSpec::required("partner_count", InputKind::Count).at_least(1),
    InputSpec::optional("returns_and_allowances", InputKind::Amount),
    InputSpec::optional("cost_of_goods_sold", InputKind::Amount),
    InputSpec::optional("income_from_other_partnerships", InputKind::Amount),
    InputSpec::optional("net_farm_profit", InputKind::Amount),
    InputSpec::optional("net_gain_from_asset_sales", InputKind::Amount),
    InputSpec::optional("other_income", InputKind::Amount),
    InputSpec::optional("salaries_and_wages", InputKind::Amount),
    InputSpec::optional("guaranteed_payments", InputKind::Amount),
    InputSpec::optional("repairs_and_maintenance", InputKind::Amount),
    InputSpec::optional("bad_debts", InputKind::Amount),
    InputSpec::optional("rents", InputKind::Amount),
    InputSpec::optional("taxes_and_licenses", InputKind::Amount),
    InputSpec::optional("interest_expense", InputKind::Amount),
    InputSpec::optional("depreciation", InputKind::Amount),
    InputSpec::optional("retirement_plans", InputKind::Amount),
    InputSpec::optional("employee_benefits", InputKind::Amount),
    InputSpec::optional("other_deductions", InputKind::Amount),
];

const LINES: &[LineDef] = &[
    LineDef::new(
        "gross_profit",
        "gross_receipts − returns_and_allowances − cost_of_goods_sold",
        gross_profit,
    ),
    LineDef::new(
        "total_income",
        "gross_profit + income_from_other_partnerships + net_farm_profit + net_gain_from_asset_sales + other_income",
        total_income,
    ),
    LineDef::new(
        "total_deductions",
        "sum of deductions, including guaranteed_payments",
        total_deductions,
    ),
    LineDef::new(
        "ordinary_business_income",
        "total_income − total_deductions",
        ordinary_business_income,
    ),
    LineDef::new(
        "net_earnings_self_employment",
        "ordinary_business_income + guaranteed_payments",
        net_earnings_self_employment,
    ),
    LineDef::new(
        "income_per_partner",
        "ordinary_business_income ÷ partner_count",
        income_per_partner,
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct Form1065;

impl FormCalculator for Form1065 {
    fn form_code(&self) -> &'static str {
        FormCode::Partnership.as_str()
    }

    fn description(&self) -> &'static str {
        FormCode::Partnership.title()
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
    Ok(gross
        + s.sum_or_zero(&[
            "income_from_other_partnerships",
            "net_farm_profit",
            "net_gain_from_asset_sales",
            "other_income",
        ])?)
}

fn total_deductions(s: &mut LineScope<'_, '_>) -> LineResult {
    s.sum_or_zero(DEDUCTIONS)
}

fn ordinary_business_income(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("total_income")? - s.line("total_deductions")?)
}

fn net_earnings_self_employment(s: &mut LineScope<'_, '_>) -> LineResult {
    Ok(s.line("ordinary_business_income")? + s.amount_or_zero("guaranteed_payments")?)
}

fn income_per_partner(s: &mut LineScope<'_, '_>) -> LineResult {
    let income = s.line("ordinary_business_income")?;
    let partners = s.count("partner_count")?;
    if partners == 0 {
        return Err(CalculationError::invalid_input("partner_count", "must be at least 1"));
    }
    Ok(income / Decimal::from(partners))
}
