//! Subcommand handlers. Each returns the JSON document to print and whether
//! the command succeeded; calculation failures are reported as structured
//! error objects rather than process errors.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use tax_core::{
    CalculationError, CalculationRequest, CalculatorRegistry, EngineConfig, ExplainStep,
    FormCalculator, InputKind, LoadingRuleProvider, RuleRegistry, TaxEngine,
};
use tax_data::DirectoryRuleSource;
use tracing::debug;

/// What a command prints, and whether it counts as success.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub body: Value,
    pub success: bool,
}

impl CommandOutput {
    fn ok(body: Value) -> Self {
        Self {
            body,
            success: true,
        }
    }

    fn failed(error: &CalculationError) -> Self {
        Self {
            body: json!({ "error": error.to_error_object() }),
            success: false,
        }
    }
}

/// An engine that loads rule sets from `rules_dir` on first use.
pub fn build_engine(
    config: EngineConfig,
    rules_dir: &Path,
) -> TaxEngine {
    debug!(rules_dir = %rules_dir.display(), "building engine");
    let provider = LoadingRuleProvider::new(
        Arc::new(RuleRegistry::new()),
        DirectoryRuleSource::new(rules_dir),
    );
    TaxEngine::with_builtin_forms(Arc::new(provider), config)
}

/// Reads a request document from `path`, or stdin when `path` is `None` or
/// `-`.
pub fn read_request(path: Option<&Path>) -> Result<CalculationRequest> {
    let text = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request: {}", path.display()))?,
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read request from stdin")?;
            text
        }
    };
    parse_request(&text)
}

pub fn parse_request(text: &str) -> Result<CalculationRequest> {
    serde_json::from_str(text).context("Request is not a valid calculation request")
}

/// Overrides applied on top of a request document.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub form_code: Option<String>,
    pub tax_year: Option<i32>,
    pub jurisdiction: Option<String>,
}

impl RequestOverrides {
    pub fn apply(
        self,
        mut request: CalculationRequest,
    ) -> CalculationRequest {
        if let Some(form_code) = self.form_code {
            request.form_code = form_code;
        }
        if let Some(tax_year) = self.tax_year {
            request.tax_year = tax_year;
        }
        if let Some(jurisdiction) = self.jurisdiction {
            request.jurisdiction = jurisdiction;
        }
        request
    }
}

pub async fn calculate(
    engine: &TaxEngine,
    request: CalculationRequest,
) -> Result<CommandOutput> {
    Ok(match engine.calculate(request).await {
        Ok(result) => CommandOutput::ok(serde_json::to_value(result.to_response())?),
        Err(error) => CommandOutput::failed(&error),
    })
}

#[derive(Debug, Serialize)]
struct Explanation<'a> {
    line: &'a str,
    value: Decimal,
    steps: Vec<ExplainStep>,
}

/// Calculates `request` and traces `line` back to its inputs and rules.
pub async fn explain(
    engine: &TaxEngine,
    request: CalculationRequest,
    line: &str,
) -> Result<CommandOutput> {
    let result = match engine.calculate(request).await {
        Ok(result) => result,
        Err(error) => return Ok(CommandOutput::failed(&error)),
    };

    let (Some(item), Some(steps)) = (result.get_line(line), result.explain(line)) else {
        let error = CalculationError::UndefinedLine {
            line_code: line.to_string(),
            referenced_by: "explain".to_string(),
        };
        return Ok(CommandOutput::failed(&error));
    };

    let explanation = Explanation {
        line,
        value: item.value,
        steps,
    };
    Ok(CommandOutput::ok(serde_json::to_value(explanation)?))
}

#[derive(Debug, Serialize)]
struct InputDescription {
    code: &'static str,
    kind: InputKind,
    required: bool,
    #[serde(skip_serializing_if = "no_restriction")]
    allowed: &'static [&'static str],
}

fn no_restriction(allowed: &&[&str]) -> bool {
    allowed.is_empty()
}

#[derive(Debug, Serialize)]
struct LineDescription {
    code: &'static str,
    formula: &'static str,
}

#[derive(Debug, Serialize)]
struct FormDescription {
    form_code: &'static str,
    description: &'static str,
    inputs: Vec<InputDescription>,
    lines: Vec<LineDescription>,
}

fn describe(calculator: &dyn FormCalculator) -> FormDescription {
    FormDescription {
        form_code: calculator.form_code(),
        description: calculator.description(),
        inputs: calculator
            .input_specs()
            .iter()
            .map(|spec| InputDescription {
                code: spec.code,
                kind: spec.kind,
                required: spec.is_required(),
                allowed: spec.allowed,
            })
            .collect(),
        lines: calculator
            .line_table()
            .iter()
            .map(|def| LineDescription {
                code: def.code,
                formula: def.formula,
            })
            .collect(),
    }
}

/// Lists registered forms, or describes one in full.
pub fn forms(
    calculators: &CalculatorRegistry,
    form_code: Option<&str>,
) -> Result<CommandOutput> {
    let Some(form_code) = form_code else {
        let listed: Vec<Value> = calculators
            .available_forms()
            .into_iter()
            .filter_map(|code| calculators.get_calculator(code).ok())
            .map(|calculator| {
                json!({
                    "form_code": calculator.form_code(),
                    "description": calculator.description(),
                })
            })
            .collect();
        return Ok(CommandOutput::ok(Value::Array(listed)));
    };

    Ok(match calculators.get_calculator(form_code) {
        Ok(calculator) => CommandOutput::ok(serde_json::to_value(describe(calculator))?),
        Err(error) => CommandOutput::failed(&error),
    })
}

#[derive(Debug, Serialize)]
struct RuleSetSummary {
    tax_year: i32,
    jurisdiction: String,
    form_code: String,
    version: String,
    schedules: Vec<String>,
    parameters: Vec<String>,
}

/// Loads every rule set under `source`, optionally for one tax year, and
/// summarizes it. Any malformed rule data fails the command.
pub async fn rules(
    source: &DirectoryRuleSource,
    tax_year: Option<i32>,
) -> Result<CommandOutput> {
    let mut summaries = Vec::new();
    for (year, jurisdiction) in source.available().await? {
        if tax_year.is_some_and(|wanted| wanted != year) {
            continue;
        }
        let rule_sets = source
            .load_year(year, &jurisdiction)
            .await
            .with_context(|| format!("Invalid rule data for {year}/{jurisdiction}"))?
            .unwrap_or_default();

        summaries.extend(rule_sets.iter().map(|rules| RuleSetSummary {
            tax_year: rules.tax_year(),
            jurisdiction: rules.jurisdiction().to_string(),
            form_code: rules.form_code().to_string(),
            version: rules.version().to_string(),
            schedules: rules.schedule_names().map(str::to_string).collect(),
            parameters: rules.parameter_names().map(str::to_string).collect(),
        }));
    }
    Ok(CommandOutput::ok(serde_json::to_value(summaries)?))
}
