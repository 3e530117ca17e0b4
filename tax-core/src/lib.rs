//! Rule-driven tax computation for federal returns.
//!
//! A [`TaxEngine`] selects a [`FormCalculator`] for the requested form,
//! validates the [`TaxpayerInput`], fetches the [`TaxYearRuleSet`] for the
//! tax year and jurisdiction, and evaluates the form's line table into a
//! [`CalculationResult`] whose every line can be traced back to inputs and
//! rule parameters.

pub mod calculations;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod graph;
pub mod models;
pub mod rules;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use calculations::forms::FormCalculator;
pub use config::EngineConfig;
pub use engine::{CalculationRequest, CalculationRun, RunState, TaxEngine};
pub use error::{CalculationError, ErrorKind, ErrorObject};
pub use factory::CalculatorRegistry;
pub use graph::{DependencyGraph, NodeId};
pub use models::*;
pub use rules::{LoadingRuleProvider, RuleProvider, RuleRegistry, RuleSource, RuleSourceError};
pub use validation::{InputSpec, IssueKind, ValidationIssue};
