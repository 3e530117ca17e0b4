//! Line-by-line evaluation of a form's formula table.
//!
//! A form is a static table of [`LineDef`]s. The [`Evaluator`] walks the
//! table in order; each line's compute function reads inputs, rule
//! parameters and other lines through a [`LineScope`], which records a
//! dependency edge for every read before the value is returned. A line read
//! before it has been computed is evaluated on demand, so the table only has
//! to be complete, not topologically sorted. Re-entering a line that is
//! still being computed, or adding an edge that closes a loop, is a
//! [`CalculationError::CircularDependency`].
//!
//! Values are rounded to the rule set's precision when each line is
//! finalized, then clamped if the line declares bounds. Later lines always
//! see the rounded, clamped value, the way a paper form is filled in.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::brackets::compute_bracket_tax;
use crate::error::CalculationError;
use crate::graph::{DependencyGraph, NodeId};
use crate::models::{
    CalculationResult, FilingStatusCode, InputValue, LineItem, Rounding, SourceValue,
    TaxYearRuleSet, TaxpayerInput, Warning, normalize_form_code,
};
use crate::validation::check_amount;

pub type LineResult = Result<Decimal, CalculationError>;

/// Compute function of one line.
pub type LineFn = fn(&mut LineScope<'_, '_>) -> LineResult;

/// Bounds a line's value must respect, e.g. "not less than zero".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clamp {
    pub floor: Option<Decimal>,
    pub ceiling: Option<Decimal>,
}

impl Clamp {
    pub const NON_NEGATIVE: Self = Self {
        floor: Some(Decimal::ZERO),
        ceiling: None,
    };

    pub const fn between(
        floor: Decimal,
        ceiling: Decimal,
    ) -> Self {
        Self {
            floor: Some(floor),
            ceiling: Some(ceiling),
        }
    }

    pub fn apply(
        &self,
        value: Decimal,
    ) -> Decimal {
        let value = self.floor.map_or(value, |floor| value.max(floor));
        self.ceiling.map_or(value, |ceiling| value.min(ceiling))
    }
}

/// Definition of one form line.
#[derive(Debug, Clone, Copy)]
pub struct LineDef {
    pub code: &'static str,
    /// Human-readable formula, reported with the computed line.
    pub formula: &'static str,
    pub clamp: Option<Clamp>,
    pub compute: LineFn,
}

impl LineDef {
    pub const fn new(
        code: &'static str,
        formula: &'static str,
        compute: LineFn,
    ) -> Self {
        Self {
            code,
            formula,
            clamp: None,
            compute,
        }
    }

    pub const fn with_clamp(
        self,
        clamp: Clamp,
    ) -> Self {
        Self {
            clamp: Some(clamp),
            ..self
        }
    }
}

/// Everything a finished evaluation produced.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub lines: Vec<LineItem>,
    pub graph: DependencyGraph,
    pub sources: BTreeMap<NodeId, SourceValue>,
    pub warnings: Vec<Warning>,
}

pub struct Evaluator<'a> {
    table: &'a [LineDef],
    input: &'a TaxpayerInput,
    rules: &'a TaxYearRuleSet,
    graph: DependencyGraph,
    values: HashMap<&'static str, Decimal>,
    in_progress: Vec<&'static str>,
    lines: Vec<LineItem>,
    sources: BTreeMap<NodeId, SourceValue>,
    warnings: Vec<Warning>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        table: &'a [LineDef],
        input: &'a TaxpayerInput,
        rules: &'a TaxYearRuleSet,
    ) -> Self {
        Self {
            table,
            input,
            rules,
            graph: DependencyGraph::new(),
            values: HashMap::with_capacity(table.len()),
            in_progress: Vec::new(),
            lines: Vec::with_capacity(table.len()),
            sources: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Computes every line of the table.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a formula, by dependency recording,
    /// or by a missing line definition. Nothing is returned on failure.
    pub fn run(mut self) -> Result<Evaluation, CalculationError> {
        for def in self.table {
            self.evaluate(def.code, None)?;
        }

        Ok(Evaluation {
            lines: self.lines,
            graph: self.graph,
            sources: self.sources,
            warnings: self.warnings,
        })
    }

    fn evaluate(
        &mut self,
        code: &str,
        referenced_by: Option<&str>,
    ) -> LineResult {
        if let Some(value) = self.values.get(code) {
            return Ok(*value);
        }

        let def = self
            .table
            .iter()
            .find(|def| def.code == code)
            .copied()
            .ok_or_else(|| CalculationError::UndefinedLine {
                line_code: code.to_string(),
                referenced_by: referenced_by.unwrap_or("form").to_string(),
            })?;

        if let Some(start) = self.in_progress.iter().position(|c| *c == def.code) {
            let mut path: Vec<String> = self.in_progress[start..]
                .iter()
                .map(|c| NodeId::line(*c).to_string())
                .collect();
            path.push(NodeId::line(def.code).to_string());
            return Err(CalculationError::CircularDependency {
                line_code: def.code.to_string(),
                path,
            });
        }

        self.in_progress.push(def.code);
        self.graph.add_node(NodeId::line(def.code));

        let mut scope = LineScope {
            evaluator: &mut *self,
            line: def.code,
            reads: Vec::new(),
        };
        let raw = (def.compute)(&mut scope);
        let reads = scope.reads;

        self.in_progress.pop();
        self.finalize(def, raw?, reads)
    }

    fn finalize(
        &mut self,
        def: LineDef,
        raw: Decimal,
        reads: Vec<NodeId>,
    ) -> LineResult {
        let rounded = self.rules.round(raw);
        let value = def
            .clamp
            .map_or(rounded, |clamp| self.rules.round(clamp.apply(rounded)));
        let clamped = value != rounded;

        if clamped {
            warn!(
                line = def.code,
                computed = %rounded,
                clamped = %value,
                "line value clamped"
            );
            self.warnings.push(Warning::clamped(def.code, rounded, value));
        }

        let mut depends_on: Vec<NodeId> = Vec::with_capacity(reads.len());
        for node in reads {
            if !depends_on.contains(&node) {
                depends_on.push(node);
            }
        }

        debug!(line = def.code, value = %value, "line finalized");

        self.values.insert(def.code, value);
        self.graph.mark_finalized(NodeId::line(def.code));
        self.lines.push(LineItem {
            code: def.code.to_string(),
            value,
            formula: def.formula.to_string(),
            depends_on,
            rounding: Rounding {
                precision: self.rules.precision(),
                mode: self.rules.rounding(),
                adjustment: rounded - raw,
            },
            clamped,
        });

        Ok(value)
    }
}

/// Read access for one line's compute function.
///
/// Every accessor records the value it returns as a dependency of the line
/// being computed.
pub struct LineScope<'e, 'a> {
    evaluator: &'e mut Evaluator<'a>,
    line: &'static str,
    reads: Vec<NodeId>,
}

impl LineScope<'_, '_> {
    /// Code of the line being computed.
    pub fn code(&self) -> &'static str {
        self.line
    }

    /// Value of another line, computing it first if necessary.
    pub fn line(
        &mut self,
        code: &str,
    ) -> LineResult {
        self.record(NodeId::line(code), None)?;
        self.evaluator.evaluate(code, Some(self.line))
    }

    /// A required amount input, at most [`InputValue::MAX_AMOUNT`] in
    /// magnitude.
    pub fn amount(
        &mut self,
        code: &str,
    ) -> LineResult {
        match self.evaluator.input.get(code) {
            Some(InputValue::Amount(amount)) => {
                let amount = *amount;
                check_amount(code, amount)?;
                self.record_input(code)?;
                Ok(amount)
            }
            Some(other) => Err(wrong_kind(code, "an amount", other)),
            None => Err(CalculationError::missing_input(code)),
        }
    }

    /// An optional amount input, zero when absent.
    pub fn amount_or_zero(
        &mut self,
        code: &str,
    ) -> LineResult {
        match self.evaluator.input.get(code) {
            None => {
                self.record_input(code)?;
                Ok(Decimal::ZERO)
            }
            Some(_) => self.amount(code),
        }
    }

    /// Sum of several optional amount inputs.
    pub fn sum_or_zero(
        &mut self,
        codes: &[&str],
    ) -> LineResult {
        let mut total = Decimal::ZERO;
        for code in codes {
            total += self.amount_or_zero(code)?;
        }
        Ok(total)
    }

    /// A required count input.
    pub fn count(
        &mut self,
        code: &str,
    ) -> Result<u32, CalculationError> {
        match self.evaluator.input.get(code) {
            Some(InputValue::Count(count)) => {
                let count = *count;
                self.record_input(code)?;
                Ok(count)
            }
            Some(other) => Err(wrong_kind(code, "a count", other)),
            None => Err(CalculationError::missing_input(code)),
        }
    }

    /// An optional count input, zero when absent.
    pub fn count_or_zero(
        &mut self,
        code: &str,
    ) -> Result<u32, CalculationError> {
        match self.evaluator.input.get(code) {
            None => {
                self.record_input(code)?;
                Ok(0)
            }
            Some(_) => self.count(code),
        }
    }

    /// A required enumerated status input.
    pub fn status(
        &mut self,
        code: &str,
    ) -> Result<String, CalculationError> {
        match self.evaluator.input.get(code) {
            Some(InputValue::Status(status)) => {
                let status = status.clone();
                self.record_input(code)?;
                Ok(status)
            }
            Some(other) => Err(wrong_kind(code, "a status", other)),
            None => Err(CalculationError::missing_input(code)),
        }
    }

    /// The `filing_status` input parsed as a [`FilingStatusCode`].
    pub fn filing_status(&mut self) -> Result<FilingStatusCode, CalculationError> {
        let status = self.status("filing_status")?;
        FilingStatusCode::parse(&status).ok_or_else(|| {
            CalculationError::invalid_input(
                "filing_status",
                format!("'{status}' is not a filing status (S, MFJ, MFS, HOH, QSS)"),
            )
        })
    }

    /// A named scalar rule parameter.
    pub fn parameter(
        &mut self,
        name: &str,
    ) -> LineResult {
        let value = self
            .evaluator
            .rules
            .parameter(name)
            .ok_or_else(|| self.missing_rule(format!("parameter '{name}' is not defined")))?;
        self.record(NodeId::rule(name), Some(SourceValue::Parameter { value }))?;
        Ok(value)
    }

    pub fn standard_deduction(
        &mut self,
        status: FilingStatusCode,
    ) -> LineResult {
        let value = self
            .evaluator
            .rules
            .standard_deduction(status)
            .ok_or_else(|| self.missing_rule(format!("no standard deduction for {status}")))?;
        self.record(
            NodeId::rule(format!("standard_deduction.{status}")),
            Some(SourceValue::Parameter { value }),
        )?;
        Ok(value)
    }

    /// Progressive tax on `amount` using the named bracket schedule.
    pub fn bracket_tax(
        &mut self,
        schedule: &str,
        amount: Decimal,
    ) -> LineResult {
        let rules = self.evaluator.rules;
        let brackets = rules
            .schedule(schedule)
            .ok_or_else(|| self.missing_rule(format!("rate schedule '{schedule}' is not defined")))?;
        self.record(
            NodeId::rule(format!("schedule.{schedule}")),
            Some(SourceValue::Schedule {
                brackets: brackets.to_vec(),
            }),
        )?;
        Ok(compute_bracket_tax(amount, brackets))
    }

    /// Reduction from the named phase-out for `status` at `income`.
    pub fn phase_out_reduction(
        &mut self,
        name: &str,
        status: FilingStatusCode,
        income: Decimal,
    ) -> LineResult {
        let rules = self.evaluator.rules;
        let phase_out = rules
            .phase_out(name)
            .ok_or_else(|| self.missing_rule(format!("phase-out '{name}' is not defined")))?;
        let reduction = phase_out.reduction(status, income).ok_or_else(|| {
            self.missing_rule(format!("phase-out '{name}' has no threshold for {status}"))
        })?;
        self.record(
            NodeId::rule(format!("phase_out.{name}")),
            Some(SourceValue::PhaseOut {
                phase_out: phase_out.clone(),
            }),
        )?;
        Ok(reduction)
    }

    fn record_input(
        &mut self,
        code: &str,
    ) -> Result<(), CalculationError> {
        let source = match self.evaluator.input.get(code) {
            Some(value) => SourceValue::Input {
                value: value.clone(),
            },
            None => SourceValue::AbsentInput,
        };
        self.record(NodeId::input(code), Some(source))
    }

    fn record(
        &mut self,
        node: NodeId,
        source: Option<SourceValue>,
    ) -> Result<(), CalculationError> {
        self.evaluator
            .graph
            .add_edge(&NodeId::line(self.line), &node)?;
        if let Some(source) = source {
            self.evaluator.sources.entry(node.clone()).or_insert(source);
        }
        self.reads.push(node);
        Ok(())
    }

    fn missing_rule(
        &self,
        reason: String,
    ) -> CalculationError {
        CalculationError::InvalidRuleSet {
            key: self.evaluator.rules.key().to_string(),
            reason,
            line_code: Some(self.line.to_string()),
        }
    }
}

fn wrong_kind(
    code: &str,
    expected: &str,
    actual: &InputValue,
) -> CalculationError {
    CalculationError::invalid_input(code, format!("expected {expected}, got {}", actual.kind()))
}

/// Evaluates `table` for `form_code` and assembles the result.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidRuleSet`] if `rules` was published for
/// a different form, and otherwise any error raised while evaluating.
pub fn evaluate_form(
    form_code: &str,
    table: &[LineDef],
    input: &TaxpayerInput,
    rules: &TaxYearRuleSet,
    computed_at: DateTime<Utc>,
) -> Result<CalculationResult, CalculationError> {
    if rules.form_code() != normalize_form_code(form_code) {
        return Err(rules.invalid(format!(
            "rule set for form {} cannot be used with form {form_code}",
            rules.form_code()
        )));
    }

    let evaluation = Evaluator::new(table, input, rules).run()?;
    debug!(
        form = form_code,
        lines = evaluation.lines.len(),
        edges = evaluation.graph.edge_count(),
        "form evaluated"
    );

    CalculationResult::assemble(
        rules,
        evaluation.lines,
        evaluation.graph,
        evaluation.sources,
        evaluation.warnings,
        computed_at,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{RoundingMode, RuleSetKey, TaxBracket};

    fn rules(precision: u32) -> TaxYearRuleSet {
        TaxYearRuleSet::builder(RuleSetKey::new(2023, "federal", "TEST"), "test.1")
            .precision(precision)
            .rounding(RoundingMode::HalfUp)
            .parameter("rate", dec!(0.333))
            .schedule(
                "X",
                vec![
                    TaxBracket::new(dec!(0), dec!(0.10)),
                    TaxBracket::new(dec!(1000), dec!(0.20)),
                ],
            )
            .build()
            .unwrap()
    }

    fn wages(s: &mut LineScope<'_, '_>) -> LineResult {
        s.amount("wages")
    }

    fn share(s: &mut LineScope<'_, '_>) -> LineResult {
        Ok(s.line("wages_line")? * s.parameter("rate")?)
    }

    fn doubled_share(s: &mut LineScope<'_, '_>) -> LineResult {
        Ok(s.line("share")? * dec!(2))
    }

    fn net(s: &mut LineScope<'_, '_>) -> LineResult {
        Ok(s.line("wages_line")? - s.amount_or_zero("losses")?)
    }

    fn tax(s: &mut LineScope<'_, '_>) -> LineResult {
        let base = s.line("net")?;
        s.bracket_tax("X", base)
    }

    fn loop_a(s: &mut LineScope<'_, '_>) -> LineResult {
        s.line("loop_b")
    }

    fn loop_b(s: &mut LineScope<'_, '_>) -> LineResult {
        s.line("loop_a")
    }

    fn itself(s: &mut LineScope<'_, '_>) -> LineResult {
        Ok(s.line("itself")? + dec!(1))
    }

    fn dangling(s: &mut LineScope<'_, '_>) -> LineResult {
        s.line("nowhere")
    }

    fn unknown_parameter(s: &mut LineScope<'_, '_>) -> LineResult {
        s.parameter("not_a_parameter")
    }

    const TABLE: &[LineDef] = &[
        LineDef::new("wages_line", "wages", wages),
        LineDef::new("share", "wages_line × rate", share),
        LineDef::new("doubled_share", "share × 2", doubled_share),
        LineDef::new("net", "wages_line − losses", net).with_clamp(Clamp::NON_NEGATIVE),
        LineDef::new("tax", "schedule X on net", tax),
    ];

    fn input(wages: Decimal) -> TaxpayerInput {
        TaxpayerInput::new().with_amount("wages", wages)
    }

    fn run(
        table: &[LineDef],
        input: &TaxpayerInput,
        precision: u32,
    ) -> Result<Evaluation, CalculationError> {
        let rules = rules(precision);
        Evaluator::new(table, input, &rules).run()
    }

    // =========================================================================
    // Clamp tests
    // =========================================================================

    #[test]
    fn clamp_non_negative_floors_at_zero() {
        assert_eq!(Clamp::NON_NEGATIVE.apply(dec!(-5)), dec!(0));
        assert_eq!(Clamp::NON_NEGATIVE.apply(dec!(5)), dec!(5));
    }

    #[test]
    fn clamp_between_limits_both_sides() {
        let clamp = Clamp::between(dec!(0), dec!(10));

        assert_eq!(clamp.apply(dec!(11)), dec!(10));
        assert_eq!(clamp.apply(dec!(-1)), dec!(0));
    }

    // =========================================================================
    // evaluation tests
    // =========================================================================

    #[test]
    fn computes_every_line_in_table_order() {
        let evaluation = run(TABLE, &input(dec!(1500)), 2).unwrap();

        let codes: Vec<&str> = evaluation.lines.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["wages_line", "share", "doubled_share", "net", "tax"]);
    }

    #[test]
    fn later_lines_see_rounded_values() {
        // wages round to 1002; share = 1002 × 0.333 = 333.666 → 334, so
        // doubled_share doubles 334 rather than 333.666
        let evaluation = run(TABLE, &input(dec!(1001.50)), 0).unwrap();
        let value = |code: &str| {
            evaluation
                .lines
                .iter()
                .find(|l| l.code == code)
                .map(|l| l.value)
                .unwrap()
        };

        assert_eq!(value("wages_line"), dec!(1002));
        assert_eq!(value("share"), dec!(334));
        assert_eq!(value("doubled_share"), dec!(668));
    }

    #[test]
    fn rounding_adjustment_is_recorded() {
        let evaluation = run(TABLE, &input(dec!(100)), 2).unwrap();
        let share = &evaluation.lines[1];

        // 100 × 0.333 = 33.300 → 33.30, no adjustment
        assert_eq!(share.value, dec!(33.30));
        assert_eq!(share.rounding.adjustment, dec!(0));
        assert_eq!(share.rounding.precision, 2);
    }

    #[test]
    fn clamp_emits_warning() {
        let input = input(dec!(100)).with_amount("losses", dec!(250));

        let evaluation = run(TABLE, &input, 2).unwrap();
        let net = evaluation.lines.iter().find(|l| l.code == "net").unwrap();

        assert_eq!(net.value, dec!(0));
        assert!(net.clamped);
        assert_eq!(evaluation.warnings.len(), 1);
        assert_eq!(evaluation.warnings[0].code, Warning::CLAMPED);
        assert_eq!(evaluation.warnings[0].line_code.as_deref(), Some("net"));
    }

    #[test]
    fn clamp_that_changes_nothing_is_silent() {
        let evaluation = run(TABLE, &input(dec!(100)), 2).unwrap();

        assert!(evaluation.warnings.is_empty());
        assert!(evaluation.lines.iter().all(|l| !l.clamped));
    }

    #[test]
    fn records_dependencies_in_read_order() {
        let evaluation = run(TABLE, &input(dec!(100)), 2).unwrap();
        let share = &evaluation.lines[1];

        assert_eq!(
            share.depends_on,
            vec![NodeId::line("wages_line"), NodeId::rule("rate")]
        );
    }

    #[test]
    fn absent_optional_input_is_recorded_as_source() {
        let evaluation = run(TABLE, &input(dec!(100)), 2).unwrap();

        assert_eq!(
            evaluation.sources.get(&NodeId::input("losses")),
            Some(&SourceValue::AbsentInput)
        );
    }

    #[test]
    fn bracket_tax_uses_schedule() {
        let evaluation = run(TABLE, &input(dec!(1500)), 2).unwrap();
        let tax = evaluation.lines.last().unwrap();

        // 0.10 × 1000 + 0.20 × 500
        assert_eq!(tax.value, dec!(200.00));
        assert!(tax.depends_on.contains(&NodeId::rule("schedule.X")));
    }

    #[test]
    fn evaluates_forward_references_on_demand() {
        const REORDERED: &[LineDef] = &[
            LineDef::new("doubled_share", "share × 2", doubled_share),
            LineDef::new("share", "wages_line × rate", share),
            LineDef::new("wages_line", "wages", wages),
        ];

        let evaluation = run(REORDERED, &input(dec!(100)), 2).unwrap();

        let codes: Vec<&str> = evaluation.lines.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["wages_line", "share", "doubled_share"]);
        assert!(evaluation.graph.order_respects_dependencies());
    }

    #[test]
    fn graph_order_matches_line_order() {
        let evaluation = run(TABLE, &input(dec!(100)), 2).unwrap();

        let order: Vec<&str> = evaluation
            .graph
            .calculation_order()
            .iter()
            .map(NodeId::code)
            .collect();
        let lines: Vec<&str> = evaluation.lines.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(order, lines);
    }

    // =========================================================================
    // failure tests
    // =========================================================================

    #[test]
    fn mutual_reference_is_circular() {
        const CYCLE: &[LineDef] = &[
            LineDef::new("loop_a", "loop_b", loop_a),
            LineDef::new("loop_b", "loop_a", loop_b),
        ];

        let result = run(CYCLE, &TaxpayerInput::new(), 2);

        assert!(matches!(
            result,
            Err(CalculationError::CircularDependency { ref line_code, .. }) if line_code == "loop_b"
        ));
    }

    #[test]
    fn self_reference_is_circular() {
        const SELF: &[LineDef] = &[LineDef::new("itself", "itself + 1", itself)];

        let result = run(SELF, &TaxpayerInput::new(), 2);

        assert!(matches!(
            result,
            Err(CalculationError::CircularDependency { .. })
        ));
    }

    #[test]
    fn reference_to_undefined_line_fails() {
        const DANGLING: &[LineDef] = &[LineDef::new("dangling", "nowhere", dangling)];

        let result = run(DANGLING, &TaxpayerInput::new(), 2);

        assert_eq!(
            result.map(|e| e.lines.len()),
            Err(CalculationError::UndefinedLine {
                line_code: "nowhere".to_string(),
                referenced_by: "dangling".to_string(),
            })
        );
    }

    #[test]
    fn missing_parameter_is_rule_set_defect() {
        const UNKNOWN: &[LineDef] =
            &[LineDef::new("unknown", "not_a_parameter", unknown_parameter)];

        let result = run(UNKNOWN, &TaxpayerInput::new(), 2);

        assert!(matches!(
            result,
            Err(CalculationError::InvalidRuleSet { line_code: Some(ref line), .. }) if line == "unknown"
        ));
    }

    #[test]
    fn missing_required_input_is_completeness_error() {
        let result = run(TABLE, &TaxpayerInput::new(), 2);

        assert_eq!(
            result.map(|e| e.lines.len()),
            Err(CalculationError::missing_input("wages"))
        );
    }

    #[test]
    fn wrong_input_type_is_invalid_input() {
        let input = TaxpayerInput::new().with_status("wages", "lots");

        let result = run(TABLE, &input, 2);

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { ref field, .. }) if field == "wages"
        ));
    }

    #[test]
    fn oversized_amount_is_invalid_input() {
        let result = run(TABLE, &input(Decimal::MAX), 2);

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { ref field, .. }) if field == "wages"
        ));
    }

    #[test]
    fn evaluate_form_rejects_rule_set_for_other_form() {
        let rules = rules(2);

        let result = evaluate_form("1040", TABLE, &input(dec!(1)), &rules, Utc::now());

        assert!(matches!(result, Err(CalculationError::InvalidRuleSet { .. })));
    }

    #[test]
    fn evaluate_form_assembles_result() {
        let rules = rules(2);

        let result = evaluate_form("test", TABLE, &input(dec!(1500)), &rules, Utc::now()).unwrap();

        assert_eq!(result.form_code(), "TEST");
        assert_eq!(result.value("tax"), Some(dec!(200.00)));
    }
}
