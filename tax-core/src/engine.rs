//! Drives one calculation request from form selection to a finished result.
//!
//! A run moves through
//! `PENDING_VALIDATION → VALIDATED → COMPUTING → COMPLETE`, or to
//! `FAILED` from any non-terminal state on the first fatal error. A failed
//! run is never retried; the caller submits a new one.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::calculations::forms::FormCalculator;
use crate::config::EngineConfig;
use crate::error::{CalculationError, ErrorKind};
use crate::factory::CalculatorRegistry;
use crate::models::{CalculationResult, RuleSetKey, TaxYearRuleSet, TaxpayerInput, Warning};
use crate::rules::RuleProvider;
use crate::validation::{IssueKind, ValidationIssue};

/// `{ form_code, tax_year, jurisdiction, input }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub form_code: String,
    pub tax_year: i32,
    /// Empty means the configured default jurisdiction.
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub input: TaxpayerInput,
}

impl CalculationRequest {
    pub fn new(
        form_code: impl Into<String>,
        tax_year: i32,
        input: TaxpayerInput,
    ) -> Self {
        Self {
            form_code: form_code.into(),
            tax_year,
            jurisdiction: String::new(),
            input,
        }
    }

    pub fn with_jurisdiction(
        mut self,
        jurisdiction: impl Into<String>,
    ) -> Self {
        self.jurisdiction = jurisdiction.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    PendingValidation,
    Validated,
    Computing,
    Complete,
    Failed { kind: ErrorKind, message: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed { .. })
    }

    /// Whether a run may move from `self` to `next`.
    pub fn can_transition_to(
        &self,
        next: &RunState,
    ) -> bool {
        match (self, next) {
            (Self::PendingValidation, Self::Validated)
            | (Self::Validated, Self::Computing)
            | (Self::Computing, Self::Complete) => true,
            (from, Self::Failed { .. }) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::PendingValidation => f.write_str("PENDING_VALIDATION"),
            Self::Validated => f.write_str("VALIDATED"),
            Self::Computing => f.write_str("COMPUTING"),
            Self::Complete => f.write_str("COMPLETE"),
            Self::Failed { kind, .. } => write!(f, "FAILED({kind:?})"),
        }
    }
}

/// One calculation request and the state it has reached.
#[derive(Debug, Clone)]
pub struct CalculationRun {
    request: CalculationRequest,
    state: RunState,
}

impl CalculationRun {
    pub fn new(request: CalculationRequest) -> Self {
        Self {
            request,
            state: RunState::PendingValidation,
        }
    }

    pub fn request(&self) -> &CalculationRequest {
        &self.request
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Validates, fetches rules and computes the form.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of the run, after which the run is
    /// `FAILED`. A run that has already been executed is rejected with
    /// [`CalculationError::InvalidInput`] on the `run_state` field.
    pub async fn execute(
        &mut self,
        engine: &TaxEngine,
    ) -> Result<CalculationResult, CalculationError> {
        if self.state != RunState::PendingValidation {
            return Err(CalculationError::invalid_input(
                "run_state",
                format!("run is already {}; submit a new run", self.state),
            ));
        }

        let span = info_span!(
            "calculation",
            form = %self.request.form_code,
            tax_year = self.request.tax_year,
        );
        let outcome = self.drive(engine).instrument(span).await;

        match &outcome {
            Ok(result) => {
                self.advance(RunState::Complete);
                info!(
                    form = result.form_code(),
                    tax_year = result.tax_year(),
                    rule_version = result.rule_version(),
                    lines = result.lines().len(),
                    warnings = result.warnings().len(),
                    "calculation complete"
                );
            }
            Err(error) => {
                if error.is_internal() {
                    warn!(error = %error, kind = ?error.kind(), "calculation failed on a rule or formula defect");
                } else {
                    info!(error = %error, kind = ?error.kind(), "calculation rejected");
                }
                self.advance(RunState::Failed {
                    kind: error.kind(),
                    message: error.to_string(),
                });
            }
        }
        outcome
    }

    async fn drive(
        &mut self,
        engine: &TaxEngine,
    ) -> Result<CalculationResult, CalculationError> {
        let calculator = engine.calculators.get_calculator(&self.request.form_code)?;
        let issues = engine.check_input(calculator, &self.request.input)?;
        self.advance(RunState::Validated);

        let key = engine.key_for(&self.request);
        let rules = engine.fetch_rules(&key).await?;
        self.advance(RunState::Computing);

        let mut result = calculator.calculate(&self.request.input, &rules)?;
        result.prepend_warnings(issues.into_iter().map(Warning::from));
        Ok(result)
    }

    fn advance(
        &mut self,
        next: RunState,
    ) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal run transition {} -> {next}",
            self.state
        );
        debug!(from = %self.state, to = %next, "run state");
        self.state = next;
    }
}

/// Form calculators, a rule provider and configuration, shared by every run.
///
/// Runs hold no shared mutable state, so one engine serves any number of
/// concurrent calculations.
pub struct TaxEngine {
    calculators: CalculatorRegistry,
    rules: Arc<dyn RuleProvider>,
    config: EngineConfig,
}

impl TaxEngine {
    pub fn new(
        calculators: CalculatorRegistry,
        rules: Arc<dyn RuleProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            calculators,
            rules,
            config,
        }
    }

    /// An engine with every built-in form registered.
    pub fn with_builtin_forms(
        rules: Arc<dyn RuleProvider>,
        config: EngineConfig,
    ) -> Self {
        Self::new(CalculatorRegistry::with_builtin_forms(), rules, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calculators(&self) -> &CalculatorRegistry {
        &self.calculators
    }

    /// Runs `request` to completion.
    ///
    /// # Errors
    ///
    /// See [`CalculationRun::execute`].
    pub async fn calculate(
        &self,
        request: CalculationRequest,
    ) -> Result<CalculationResult, CalculationError> {
        CalculationRun::new(request).execute(self).await
    }

    /// Validates the request's input without fetching rules.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::UnsupportedForm`],
    /// [`CalculationError::Completeness`] or [`CalculationError::InvalidInput`].
    pub fn validate(
        &self,
        request: &CalculationRequest,
    ) -> Result<Vec<ValidationIssue>, CalculationError> {
        let calculator = self.calculators.get_calculator(&request.form_code)?;
        self.check_input(calculator, &request.input)
    }

    /// The rule-set key a request resolves to.
    pub fn key_for(
        &self,
        request: &CalculationRequest,
    ) -> RuleSetKey {
        RuleSetKey::new(
            request.tax_year,
            self.config.resolve_jurisdiction(&request.jurisdiction),
            &request.form_code,
        )
    }

    /// Fetches the rule set for `key`, waiting at most the configured
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::RuleNotFound`] when the provider has no
    /// rule set or the wait expires.
    pub async fn fetch_rules(
        &self,
        key: &RuleSetKey,
    ) -> Result<Arc<TaxYearRuleSet>, CalculationError> {
        let timeout = self.config.rule_fetch_timeout();
        match tokio::time::timeout(timeout, self.rules.get_rules(key)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(key = %key, timeout_ms = self.config.rule_fetch_timeout_ms, "rule fetch timed out");
                Err(CalculationError::RuleNotFound {
                    key: key.clone(),
                    reason: format!(
                        "rule fetch timed out after {} ms",
                        self.config.rule_fetch_timeout_ms
                    ),
                })
            }
        }
    }

    fn check_input(
        &self,
        calculator: &dyn FormCalculator,
        input: &TaxpayerInput,
    ) -> Result<Vec<ValidationIssue>, CalculationError> {
        let issues = calculator.validate(input)?;

        if self.config.reject_unknown_inputs {
            if let Some(unknown) = issues.iter().find(|i| i.kind == IssueKind::UnknownInput) {
                return Err(CalculationError::invalid_input(
                    &unknown.field,
                    unknown.message.clone(),
                ));
            }
        }

        for issue in issues.iter().filter(|i| i.kind == IssueKind::MissingOptional) {
            debug!(field = %issue.field, "optional input not supplied, treated as zero");
        }
        Ok(issues)
    }
}
