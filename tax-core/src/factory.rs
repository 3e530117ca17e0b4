use std::collections::HashMap;

use crate::calculations::forms::{FormCalculator, builtin_calculators};
use crate::error::CalculationError;
use crate::models::normalize_form_code;

/// Registry of [`FormCalculator`] implementations, keyed by form code.
///
/// Typical lifetime:
/// 1. Create with `CalculatorRegistry::with_builtin_forms()` (or `new()` for
///    an empty table).
/// 2. Call `register` for any additional form type.
/// 3. Call `get_calculator` for every calculation request.
///
/// Form codes are matched after trimming and upper-casing, so `"1120-s"`
/// and `"1120-S"` select the same calculator.
pub struct CalculatorRegistry {
    calculators: HashMap<String, Box<dyn FormCalculator>>,
}

impl CalculatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            calculators: HashMap::new(),
        }
    }

    /// A registry holding every built-in form.
    pub fn with_builtin_forms() -> Self {
        let mut registry = Self::new();
        for calculator in builtin_calculators() {
            registry.register(calculator);
        }
        registry
    }

    /// Register a form calculator.
    ///
    /// If a calculator with the same [`FormCalculator::form_code`] is
    /// already present it is replaced.
    pub fn register(
        &mut self,
        calculator: Box<dyn FormCalculator>,
    ) {
        let code = normalize_form_code(calculator.form_code());
        self.calculators.insert(code, calculator);
    }

    /// Form codes of every registered calculator, sorted.
    pub fn available_forms(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.calculators.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    /// The calculator registered for `form_code`.
    ///
    /// # Errors
    /// * [`CalculationError::UnsupportedForm`] if nothing is registered under
    ///   that code.
    pub fn get_calculator(
        &self,
        form_code: &str,
    ) -> Result<&dyn FormCalculator, CalculationError> {
        self.calculators
            .get(&normalize_form_code(form_code))
            .map(|calculator| &**calculator)
            .ok_or_else(|| CalculationError::UnsupportedForm(form_code.trim().to_string()))
    }
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::with_builtin_forms()
    }
}
