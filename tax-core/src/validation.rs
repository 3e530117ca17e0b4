//! Input checks run before any line is computed.
//!
//! Each form declares the inputs it reads as a table of [`InputSpec`]s.
//! [`validate_input`] fails fast on anything that would make a reachable
//! line uncomputable (a missing required input, a value of the wrong type,
//! a status outside the allowed set, an amount too large to compute with)
//! and reports softer findings as
//! [`ValidationIssue`]s that end up as warnings on the result.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CalculationError;
use crate::models::{InputKind, InputValue, TaxpayerInput, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    /// Read as zero (or false) when absent.
    Optional,
}

/// Declaration of one input a form reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub code: &'static str,
    pub kind: InputKind,
    pub requirement: Requirement,
    /// Accepted values for a status input; empty means any.
    pub allowed: &'static [&'static str],
    /// Smallest accepted value for a count input.
    pub min_count: u32,
}

impl InputSpec {
    pub const fn required(
        code: &'static str,
        kind: InputKind,
    ) -> Self {
        Self {
            code,
            kind,
            requirement: Requirement::Required,
            allowed: &[],
            min_count: 0,
        }
    }

    pub const fn optional(
        code: &'static str,
        kind: InputKind,
    ) -> Self {
        Self {
            code,
            kind,
            requirement: Requirement::Optional,
            allowed: &[],
            min_count: 0,
        }
    }

    pub const fn one_of(
        self,
        allowed: &'static [&'static str],
    ) -> Self {
        Self { allowed, ..self }
    }

    pub const fn at_least(
        self,
        min_count: u32,
    ) -> Self {
        Self { min_count, ..self }
    }

    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingOptional,
    UnknownInput,
}

impl IssueKind {
    fn warning_code(&self) -> &'static str {
        match self {
            Self::MissingOptional => Warning::MISSING_OPTIONAL_INPUT,
            Self::UnknownInput => Warning::UNKNOWN_INPUT,
        }
    }
}

/// A non-fatal finding about the input. Fatal findings are returned as
/// [`CalculationError`]s instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl From<ValidationIssue> for Warning {
    fn from(issue: ValidationIssue) -> Self {
        Warning {
            code: issue.kind.warning_code().to_string(),
            message: issue.message,
            line_code: None,
        }
    }
}

/// Checks `input` against `specs`.
///
/// Returns the warnings for absent optional inputs, in declaration order,
/// followed by one for each input code the form does not declare, sorted.
///
/// # Errors
///
/// - [`CalculationError::Completeness`] for the first missing required input.
/// - [`CalculationError::InvalidInput`] for a value of the wrong kind, a
///   status outside the allowed set, a count below its minimum, or an amount
///   whose magnitude exceeds [`InputValue::MAX_AMOUNT`].
pub fn validate_input(
    specs: &[InputSpec],
    input: &TaxpayerInput,
) -> Result<Vec<ValidationIssue>, CalculationError> {
    let mut issues = Vec::new();

    for spec in specs {
        let Some(value) = input.get(spec.code) else {
            if spec.is_required() {
                return Err(CalculationError::missing_input(spec.code));
            }
            issues.push(ValidationIssue {
                field: spec.code.to_string(),
                kind: IssueKind::MissingOptional,
                message: format!("{} not supplied, treated as zero", spec.code),
            });
            continue;
        };

        check_value(spec, value)?;
    }

    for code in input.codes() {
        if !specs.iter().any(|spec| spec.code == code) {
            warn!(field = code, "input code is not read by this form");
            issues.push(ValidationIssue {
                field: code.to_string(),
                kind: IssueKind::UnknownInput,
                message: format!("{code} is not used by this form and was ignored"),
            });
        }
    }

    Ok(issues)
}

fn check_value(
    spec: &InputSpec,
    value: &InputValue,
) -> Result<(), CalculationError> {
    if value.kind() != spec.kind {
        return Err(CalculationError::invalid_input(
            spec.code,
            format!("expected {}, got {}", spec.kind, value.kind()),
        ));
    }

    match value {
        InputValue::Amount(amount) => check_amount(spec.code, *amount)?,
        InputValue::Status(status) if !spec.allowed.is_empty() => {
            if !spec.allowed.iter().any(|allowed| *allowed == status.trim()) {
                return Err(CalculationError::invalid_input(
                    spec.code,
                    format!(
                        "'{status}' is not one of {}",
                        spec.allowed.join(", ")
                    ),
                ));
            }
        }
        InputValue::Count(count) if *count < spec.min_count => {
            return Err(CalculationError::invalid_input(
                spec.code,
                format!("must be at least {}, got {count}", spec.min_count),
            ));
        }
        _ => {}
    }
    Ok(())
}

/// Rejects an amount outside `±InputValue::MAX_AMOUNT`.
pub(crate) fn check_amount(
    code: &str,
    amount: Decimal,
) -> Result<(), CalculationError> {
    if amount.abs() > InputValue::MAX_AMOUNT {
        return Err(CalculationError::invalid_input(
            code,
            format!("{amount} is outside ±{}", InputValue::MAX_AMOUNT),
        ));
    }
    Ok(())
}
