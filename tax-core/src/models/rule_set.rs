//! Versioned, immutable tax parameters for one (year, jurisdiction, form).
//!
//! A [`TaxYearRuleSet`] is assembled once through [`RuleSetBuilder`], checked
//! for integrity, and then only ever read. Superseding a rule set means
//! publishing a new one under the same key; nothing mutates a published set.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{FilingStatusCode, PhaseOut, TaxBracket, normalize_form_code};
use crate::calculations::brackets::validate_brackets;
use crate::calculations::common::round_to;
use crate::error::CalculationError;

/// Upper bound on declared precision; rust_decimal keeps 28 fractional digits
/// but no tax form goes past cents.
const MAX_PRECISION: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleSetKey {
    pub tax_year: i32,
    pub jurisdiction: String,
    pub form_code: String,
}

impl RuleSetKey {
    /// Builds a key with the jurisdiction lower-cased and the form code
    /// upper-cased so lookups do not depend on caller spelling.
    pub fn new(
        tax_year: i32,
        jurisdiction: impl AsRef<str>,
        form_code: impl AsRef<str>,
    ) -> Self {
        Self {
            tax_year,
            jurisdiction: jurisdiction.as_ref().trim().to_ascii_lowercase(),
            form_code: normalize_form_code(form_code.as_ref()),
        }
    }
}

impl fmt::Display for RuleSetKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tax_year, self.jurisdiction, self.form_code)
    }
}

/// How a line value is brought to the rule set's precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Midpoint away from zero, the convention on paper forms.
    #[default]
    HalfUp,
    /// Banker's rounding.
    HalfEven,
    /// Truncate toward zero.
    Down,
}

impl RoundingMode {
    pub fn strategy(&self) -> RoundingStrategy {
        match self {
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
            Self::Down => RoundingStrategy::ToZero,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearRuleSet {
    key: RuleSetKey,
    version: String,
    precision: u32,
    rounding: RoundingMode,
    schedules: BTreeMap<String, Vec<TaxBracket>>,
    standard_deductions: BTreeMap<FilingStatusCode, Decimal>,
    phase_outs: BTreeMap<String, PhaseOut>,
    parameters: BTreeMap<String, Decimal>,
}

impl TaxYearRuleSet {
    pub fn builder(
        key: RuleSetKey,
        version: impl Into<String>,
    ) -> RuleSetBuilder {
        RuleSetBuilder {
            rule_set: TaxYearRuleSet {
                key,
                version: version.into(),
                precision: 2,
                rounding: RoundingMode::HalfUp,
                schedules: BTreeMap::new(),
                standard_deductions: BTreeMap::new(),
                phase_outs: BTreeMap::new(),
                parameters: BTreeMap::new(),
            },
        }
    }

    pub fn key(&self) -> &RuleSetKey {
        &self.key
    }

    pub fn tax_year(&self) -> i32 {
        self.key.tax_year
    }

    pub fn jurisdiction(&self) -> &str {
        &self.key.jurisdiction
    }

    pub fn form_code(&self) -> &str {
        &self.key.form_code
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    pub fn schedule(
        &self,
        name: &str,
    ) -> Option<&[TaxBracket]> {
        self.schedules.get(name).map(Vec::as_slice)
    }

    pub fn schedule_names(&self) -> impl Iterator<Item = &str> {
        self.schedules.keys().map(String::as_str)
    }

    pub fn standard_deduction(
        &self,
        status: FilingStatusCode,
    ) -> Option<Decimal> {
        self.standard_deductions.get(&status).copied()
    }

    pub fn phase_out(
        &self,
        name: &str,
    ) -> Option<&PhaseOut> {
        self.phase_outs.get(name)
    }

    pub fn parameter(
        &self,
        name: &str,
    ) -> Option<Decimal> {
        self.parameters.get(name).copied()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    /// Rounds `value` to this rule set's precision using its rounding mode.
    pub fn round(
        &self,
        value: Decimal,
    ) -> Decimal {
        round_to(value, self.precision, self.rounding)
    }

    /// Checks the integrity rules every published rule set must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidRuleSet`] if the precision is out
    /// of range, a bracket schedule is malformed, a phase-out has a
    /// non-positive step, or a standard deduction is negative.
    pub fn validate(&self) -> Result<(), CalculationError> {
        if self.precision > MAX_PRECISION {
            return Err(self.invalid(format!(
                "precision {} exceeds the maximum of {MAX_PRECISION}",
                self.precision
            )));
        }
        for (name, brackets) in &self.schedules {
            validate_brackets(brackets)
                .map_err(|e| self.invalid(format!("schedule '{name}': {e}")))?;
        }
        for (name, phase_out) in &self.phase_outs {
            if phase_out.step <= Decimal::ZERO {
                return Err(self.invalid(format!(
                    "phase-out '{name}' has non-positive step {}",
                    phase_out.step
                )));
            }
        }
        for (status, amount) in &self.standard_deductions {
            if *amount < Decimal::ZERO {
                return Err(self.invalid(format!(
                    "standard deduction for {status} is negative: {amount}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn invalid(
        &self,
        reason: impl Into<String>,
    ) -> CalculationError {
        CalculationError::InvalidRuleSet {
            key: self.key.to_string(),
            reason: reason.into(),
            line_code: None,
        }
    }
}

/// Accumulates rule data and produces a validated [`TaxYearRuleSet`].
#[derive(Debug, Clone)]
pub struct RuleSetBuilder {
    rule_set: TaxYearRuleSet,
}

impl RuleSetBuilder {
    pub fn precision(
        mut self,
        precision: u32,
    ) -> Self {
        self.rule_set.precision = precision;
        self
    }

    pub fn rounding(
        mut self,
        rounding: RoundingMode,
    ) -> Self {
        self.rule_set.rounding = rounding;
        self
    }

    pub fn schedule(
        mut self,
        name: impl Into<String>,
        brackets: Vec<TaxBracket>,
    ) -> Self {
        self.rule_set.schedules.insert(name.into(), brackets);
        self
    }

    pub fn standard_deduction(
        mut self,
        status: FilingStatusCode,
        amount: Decimal,
    ) -> Self {
        self.rule_set.standard_deductions.insert(status, amount);
        self
    }

    pub fn phase_out(
        mut self,
        name: impl Into<String>,
        phase_out: PhaseOut,
    ) -> Self {
        self.rule_set.phase_outs.insert(name.into(), phase_out);
        self
    }

    pub fn parameter(
        mut self,
        name: impl Into<String>,
        value: Decimal,
    ) -> Self {
        self.rule_set.parameters.insert(name.into(), value);
        self
    }

    /// Validates and freezes the rule set.
    ///
    /// # Errors
    ///
    /// See [`TaxYearRuleSet::validate`].
    pub fn build(self) -> Result<TaxYearRuleSet, CalculationError> {
        self.rule_set.validate()?;
        Ok(self.rule_set)
    }
}
