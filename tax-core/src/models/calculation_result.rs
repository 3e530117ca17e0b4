//! The packaged outcome of one completed calculation run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{InputValue, LineItem, PhaseOut, TaxBracket, TaxYearRuleSet};
use crate::error::CalculationError;
use crate::graph::{DependencyGraph, NodeId};

/// A non-fatal condition attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_code: Option<String>,
}

impl Warning {
    pub const CLAMPED: &'static str = "CLAMPED";
    pub const MISSING_OPTIONAL_INPUT: &'static str = "MISSING_OPTIONAL_INPUT";
    pub const UNKNOWN_INPUT: &'static str = "UNKNOWN_INPUT";

    pub fn clamped(
        line_code: &str,
        computed: Decimal,
        clamped: Decimal,
    ) -> Self {
        Self {
            code: Self::CLAMPED.to_string(),
            message: format!("{line_code} computed as {computed}, limited to {clamped}"),
            line_code: Some(line_code.to_string()),
        }
    }
}

/// Value of a leaf of the dependency graph: a raw input or rule parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceValue {
    Input { value: InputValue },
    /// Optional input the taxpayer did not supply; read as zero.
    AbsentInput,
    Parameter { value: Decimal },
    Schedule { brackets: Vec<TaxBracket> },
    PhaseOut { phase_out: PhaseOut },
}

impl SourceValue {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Input { value } => value.numeric(),
            Self::AbsentInput => Some(Decimal::ZERO),
            Self::Parameter { value } => Some(*value),
            Self::Schedule { .. } | Self::PhaseOut { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Input { value } => format!("taxpayer input ({}): {value}", value.kind()),
            Self::AbsentInput => "not supplied, read as 0".to_string(),
            Self::Parameter { value } => format!("rule parameter: {value}"),
            Self::Schedule { brackets } => {
                let top = brackets.last().map_or(Decimal::ZERO, |b| b.rate);
                format!("rate schedule: {} brackets, top rate {top}", brackets.len())
            }
            Self::PhaseOut { phase_out } => format!(
                "phase-out: {} per {} over threshold",
                phase_out.reduction_per_step, phase_out.step
            ),
        }
    }
}

/// One entry of an [`explain`](CalculationResult::explain) trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainStep {
    pub node: NodeId,
    pub value: Option<Decimal>,
    pub detail: String,
    pub depends_on: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    form_code: String,
    tax_year: i32,
    jurisdiction: String,
    rule_version: String,
    computed_at: DateTime<Utc>,
    lines: Vec<LineItem>,
    graph: DependencyGraph,
    sources: BTreeMap<NodeId, SourceValue>,
    warnings: Vec<Warning>,
}

/// Wire shape handed to rendering and e-file consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub form_code: String,
    pub tax_year: i32,
    pub jurisdiction: String,
    pub rule_version: String,
    pub computed_at: DateTime<Utc>,
    pub lines: Vec<LineItem>,
    pub warnings: Vec<Warning>,
}

impl CalculationResult {
    /// Packages computed lines with their provenance.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::CircularDependency`] if `graph` is cyclic
    /// or its calculation order disagrees with its edges, and
    /// [`CalculationError::UndefinedLine`] if a line depends on a line that
    /// is not part of the result.
    pub fn assemble(
        rules: &TaxYearRuleSet,
        lines: Vec<LineItem>,
        graph: DependencyGraph,
        sources: BTreeMap<NodeId, SourceValue>,
        warnings: Vec<Warning>,
        computed_at: DateTime<Utc>,
    ) -> Result<Self, CalculationError> {
        graph.topological_order()?;
        if !graph.order_respects_dependencies() {
            return Err(CalculationError::CircularDependency {
                line_code: rules.form_code().to_string(),
                path: graph.calculation_order().iter().map(ToString::to_string).collect(),
            });
        }

        for line in &lines {
            if let Some(missing) = line.depends_on.iter().find(|dep| match dep {
                NodeId::Line(code) => !lines.iter().any(|l| &l.code == code),
                _ => !sources.contains_key(dep),
            }) {
                return Err(CalculationError::UndefinedLine {
                    line_code: missing.to_string(),
                    referenced_by: line.code.clone(),
                });
            }
        }

        Ok(Self {
            form_code: rules.form_code().to_string(),
            tax_year: rules.tax_year(),
            jurisdiction: rules.jurisdiction().to_string(),
            rule_version: rules.version().to_string(),
            computed_at,
            lines,
            graph,
            sources,
            warnings,
        })
    }

    pub fn form_code(&self) -> &str {
        &self.form_code
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    pub fn rule_version(&self) -> &str {
        &self.rule_version
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// Lines in calculation order.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn sources(&self) -> &BTreeMap<NodeId, SourceValue> {
        &self.sources
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn get_line(
        &self,
        code: &str,
    ) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.code == code)
    }

    pub fn value(
        &self,
        code: &str,
    ) -> Option<Decimal> {
        self.get_line(code).map(|line| line.value)
    }

    /// Line values keyed by code; handy for comparing runs.
    pub fn values(&self) -> BTreeMap<&str, Decimal> {
        self.lines
            .iter()
            .map(|line| (line.code.as_str(), line.value))
            .collect()
    }

    /// Prepends warnings raised before calculation (e.g. by validation).
    pub fn prepend_warnings(
        &mut self,
        warnings: impl IntoIterator<Item = Warning>,
    ) {
        let mut merged: Vec<Warning> = warnings.into_iter().collect();
        merged.append(&mut self.warnings);
        self.warnings = merged;
    }

    /// Full provenance of `code`: every line, input and rule parameter that
    /// contributed to it, dependencies first, ending with the line itself.
    ///
    /// Returns `None` when the result has no such line.
    pub fn explain(
        &self,
        code: &str,
    ) -> Option<Vec<ExplainStep>> {
        self.get_line(code)?;
        let steps = self
            .graph
            .closure(&NodeId::line(code))
            .into_iter()
            .map(|node| self.describe(node))
            .collect();
        Some(steps)
    }

    fn describe(
        &self,
        node: NodeId,
    ) -> ExplainStep {
        let depends_on = self.graph.dependencies(&node).cloned().collect();
        let (value, detail) = match &node {
            NodeId::Line(code) => match self.get_line(code) {
                Some(line) => (Some(line.value), line.formula.clone()),
                None => (None, "line not computed".to_string()),
            },
            _ => match self.sources.get(&node) {
                Some(source) => (source.amount(), source.describe()),
                None => (None, "source not recorded".to_string()),
            },
        };

        ExplainStep {
            node,
            value,
            detail,
            depends_on,
        }
    }

    pub fn to_response(&self) -> CalculationResponse {
        CalculationResponse {
            form_code: self.form_code.clone(),
            tax_year: self.tax_year,
            jurisdiction: self.jurisdiction.clone(),
            rule_version: self.rule_version.clone(),
            computed_at: self.computed_at,
            lines: self.lines.clone(),
            warnings: self.warnings.clone(),
        }
    }
}
