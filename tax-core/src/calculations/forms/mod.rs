//! Form calculators, one per supported return type.
//!
//! Forms share no formulas: each module owns its input declarations and its
//! line table, and everything else comes from the [`FormCalculator`]
//! defaults.

mod c_corporation;
mod individual;
mod non_profit;
mod partnership;
mod s_corporation;
mod trust_estate;

use chrono::{DateTime, Utc};

pub use c_corporation::Form1120;
pub use individual::Form1040;
pub use non_profit::Form990;
pub use partnership::Form1065;
pub use s_corporation::Form1120S;
pub use trust_estate::Form1041;

use super::evaluator::{LineDef, evaluate_form};
use crate::error::CalculationError;
use crate::models::{CalculationResult, TaxYearRuleSet, TaxpayerInput};
use crate::validation::{InputSpec, ValidationIssue, validate_input};

/// The capability set every form type provides.
pub trait FormCalculator: Send + Sync {
    /// Canonical form code, e.g. `"1120-S"`.
    fn form_code(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Every input code the form reads.
    fn input_specs(&self) -> &'static [InputSpec];

    fn line_table(&self) -> &'static [LineDef];

    /// Checks `input` without computing anything.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::Completeness`] or
    /// [`CalculationError::InvalidInput`] when a line could not be computed.
    fn validate(
        &self,
        input: &TaxpayerInput,
    ) -> Result<Vec<ValidationIssue>, CalculationError> {
        validate_input(self.input_specs(), input)
    }

    /// Computes every line of the form, stamped with the current time.
    ///
    /// # Errors
    ///
    /// See [`FormCalculator::calculate_at`].
    fn calculate(
        &self,
        input: &TaxpayerInput,
        rules: &TaxYearRuleSet,
    ) -> Result<CalculationResult, CalculationError> {
        self.calculate_at(input, rules, Utc::now())
    }

    /// Computes every line of the form.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; there is never a partial result.
    fn calculate_at(
        &self,
        input: &TaxpayerInput,
        rules: &TaxYearRuleSet,
        computed_at: DateTime<Utc>,
    ) -> Result<CalculationResult, CalculationError> {
        evaluate_form(self.form_code(), self.line_table(), input, rules, computed_at)
    }
}

/// Calculators for all built-in forms.
pub fn builtin_calculators() -> Vec<Box<dyn FormCalculator>> {
    vec![
        Box::new(Form1040),
        Box::new(Form1120),
        Box::new(Form1120S),
        Box::new(Form1065),
        Box::new(Form1041),
        Box::new(Form990),
    ]
}
