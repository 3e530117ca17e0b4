//! Errors raised by a calculation run.
//!
//! Every failure is fatal to the run that raised it and never touches other
//! runs or the rule registry. Non-fatal conditions (clamps, missing optional
//! inputs) are reported as [`Warning`](crate::models::Warning)s instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RuleSetKey;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    /// A required input is missing.
    #[error("required input '{field}' is missing: {message}")]
    Completeness { field: String, message: String },

    /// An input is present but has the wrong type or an unrecognised value.
    #[error("input '{field}' is invalid: {message}")]
    InvalidInput { field: String, message: String },

    /// No rule set is published for the requested key, or fetching it
    /// failed or timed out.
    #[error("no rule set published for {key}: {reason}")]
    RuleNotFound { key: RuleSetKey, reason: String },

    /// The form code has no registered calculator.
    #[error("unsupported form code '{0}'")]
    UnsupportedForm(String),

    /// Recording a dependency would close a cycle in the formula graph.
    #[error("circular dependency while computing '{line_code}': {}", path.join(" -> "))]
    CircularDependency { line_code: String, path: Vec<String> },

    /// Rule data is malformed or lacks a value a formula needs.
    #[error("invalid rule set {key}: {reason}")]
    InvalidRuleSet {
        key: String,
        reason: String,
        line_code: Option<String>,
    },

    /// A formula referenced a line its form does not define.
    #[error("line '{line_code}' referenced by '{referenced_by}' is not defined")]
    UndefinedLine {
        line_code: String,
        referenced_by: String,
    },
}

/// Stable, serializable classification of a [`CalculationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    CompletenessError,
    InvalidInputError,
    RuleNotFoundError,
    UnsupportedFormError,
    CircularDependencyError,
    InvalidRuleSetError,
    UndefinedLineError,
}

/// Wire shape of an error: `{ kind, message, field?, line_code? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_code: Option<String>,
}

impl CalculationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Completeness { .. } => ErrorKind::CompletenessError,
            Self::InvalidInput { .. } => ErrorKind::InvalidInputError,
            Self::RuleNotFound { .. } => ErrorKind::RuleNotFoundError,
            Self::UnsupportedForm(_) => ErrorKind::UnsupportedFormError,
            Self::CircularDependency { .. } => ErrorKind::CircularDependencyError,
            Self::InvalidRuleSet { .. } => ErrorKind::InvalidRuleSetError,
            Self::UndefinedLine { .. } => ErrorKind::UndefinedLineError,
        }
    }

    /// True for defects in rule data or formula tables rather than in what
    /// the caller supplied.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::CircularDependency { .. } | Self::InvalidRuleSet { .. } | Self::UndefinedLine { .. }
        )
    }

    pub fn to_error_object(&self) -> ErrorObject {
        let (field, line_code) = match self {
            Self::Completeness { field, .. } | Self::InvalidInput { field, .. } => {
                (Some(field.clone()), None)
            }
            Self::CircularDependency { line_code, .. } | Self::UndefinedLine { line_code, .. } => {
                (None, Some(line_code.clone()))
            }
            Self::InvalidRuleSet { line_code, .. } => (None, line_code.clone()),
            Self::RuleNotFound { .. } | Self::UnsupportedForm(_) => (None, None),
        };

        ErrorObject {
            kind: self.kind(),
            message: self.to_string(),
            field,
            line_code,
        }
    }

    pub(crate) fn missing_input(field: &str) -> Self {
        Self::Completeness {
            field: field.to_string(),
            message: "a value is required for this form".to_string(),
        }
    }

    pub(crate) fn invalid_input(
        field: &str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn completeness_error_object_names_field() {
        let err = CalculationError::missing_input("filing_status");

        let object = err.to_error_object();

        assert_eq!(object.kind, ErrorKind::CompletenessError);
        assert_eq!(object.field.as_deref(), Some("filing_status"));
        assert_eq!(object.line_code, None);
    }

    #[test]
    fn circular_dependency_message_shows_path() {
        let err = CalculationError::CircularDependency {
            line_code: "a".to_string(),
            path: vec!["line:a".to_string(), "line:b".to_string(), "line:a".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "circular dependency while computing 'a': line:a -> line:b -> line:a"
        );
        assert!(err.is_internal());
        assert_eq!(err.to_error_object().line_code.as_deref(), Some("a"));
    }

    #[test]
    fn unsupported_form_is_not_internal() {
        assert!(!CalculationError::UnsupportedForm("941".to_string()).is_internal());
    }

    #[test]
    fn error_object_omits_absent_fields() {
        let object = CalculationError::UnsupportedForm("941".to_string()).to_error_object();

        let json = serde_json::to_string(&object).unwrap();

        assert_eq!(
            json,
            r#"{"kind":"UnsupportedFormError","message":"unsupported form code '941'"}"#
        );
    }
}
