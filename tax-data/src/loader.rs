use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::calculations::{compute_bracket_tax, validate_brackets};
use tax_core::{
    CalculationError, FilingStatusCode, FormCode, PhaseOut, RoundingMode, RuleSetKey, TaxBracket,
    TaxYearRuleSet,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading rule data.
#[derive(Debug, Error)]
pub enum RuleLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bracket row for tax year {found} in the {expected} rule data")]
    YearMismatch { expected: i32, found: i32 },

    #[error("schedule {schedule}: {reason}")]
    InvalidSchedule { schedule: String, reason: String },

    #[error("jurisdiction '{0}' is not a single directory name")]
    InvalidJurisdiction(String),

    #[error("unknown filing status '{0}'")]
    UnknownFilingStatus(String),

    #[error("manifest lists unsupported form '{0}'")]
    UnknownForm(String),

    #[error("form {form} references undefined {what} '{name}'")]
    UndefinedReference {
        form: String,
        what: &'static str,
        name: String,
    },

    #[error(transparent)]
    InvalidRuleSet(#[from] CalculationError),
}

impl From<csv::Error> for RuleLoaderError {
    fn from(err: csv::Error) -> Self {
        RuleLoaderError::CsvParse(err.to_string())
    }
}

impl From<toml::de::Error> for RuleLoaderError {
    fn from(err: toml::de::Error) -> Self {
        RuleLoaderError::ManifestParse(err.to_string())
    }
}

/// A single record from a brackets CSV file.
///
/// - `tax_year`: The tax year (e.g., 2024)
/// - `schedule`: The schedule name (X, Y-1, Y-2, Z, CORP, TRUST)
/// - `min_income`: The minimum income for this bracket
/// - `max_income`: The maximum income for this bracket (empty for unlimited)
/// - `base_tax`: Tax owed on income up to `min_income` (empty to skip the
///   cross-check)
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub base_tax: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Everything in `rules.toml` except the bracket tables.
///
/// Amounts are written as strings so no value passes through a float.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleManifest {
    pub version: String,
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default)]
    pub rounding: RoundingMode,
    #[serde(default)]
    pub standard_deductions: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub phase_outs: BTreeMap<String, PhaseOutRecord>,
    #[serde(default)]
    pub forms: BTreeMap<String, FormRules>,
}

fn default_precision() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PhaseOutRecord {
    pub step: Decimal,
    pub reduction_per_step: Decimal,
    pub thresholds: BTreeMap<String, Decimal>,
}

/// Which shared rule data one form's rule set carries.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FormRules {
    #[serde(default)]
    pub schedules: Vec<String>,
    #[serde(default)]
    pub standard_deductions: bool,
    #[serde(default)]
    pub phase_outs: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    pub precision: Option<u32>,
    pub rounding: Option<RoundingMode>,
}

/// Builds [`TaxYearRuleSet`]s from a bracket CSV and a rule manifest.
///
/// One manifest describes a tax year and jurisdiction; each entry under
/// `[forms]` becomes its own rule set keyed by that form.
pub struct RuleSetLoader;

impl RuleSetLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse_brackets<R: Read>(reader: R) -> Result<Vec<BracketRecord>, RuleLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    pub fn parse_manifest(text: &str) -> Result<RuleManifest, RuleLoaderError> {
        Ok(toml::from_str(text)?)
    }

    /// Groups records into schedules and checks each one.
    ///
    /// Within a schedule every bracket must end where the next begins, only
    /// the last may be open-ended, and a stated `base_tax` must equal the tax
    /// the lower brackets accrue.
    pub fn schedules(
        tax_year: i32,
        records: &[BracketRecord],
    ) -> Result<BTreeMap<String, Vec<TaxBracket>>, RuleLoaderError> {
        let mut groups: BTreeMap<&str, Vec<&BracketRecord>> = BTreeMap::new();
        for record in records {
            if record.tax_year != tax_year {
                return Err(RuleLoaderError::YearMismatch {
                    expected: tax_year,
                    found: record.tax_year,
                });
            }
            groups.entry(record.schedule.trim()).or_default().push(record);
        }

        let mut schedules = BTreeMap::new();
        for (name, mut rows) in groups {
            rows.sort_by(|a, b| a.min_income.cmp(&b.min_income));
            let invalid = |reason: String| RuleLoaderError::InvalidSchedule {
                schedule: name.to_string(),
                reason,
            };

            for pair in rows.windows(2) {
                if pair[0].max_income != Some(pair[1].min_income) {
                    return Err(invalid(format!(
                        "bracket starting at {} ends at {:?}, next starts at {}",
                        pair[0].min_income, pair[0].max_income, pair[1].min_income
                    )));
                }
            }
            if let Some(last) = rows.last().and_then(|row| row.max_income) {
                return Err(invalid(format!("last bracket must be open-ended, ends at {last}")));
            }

            let brackets: Vec<TaxBracket> = rows
                .iter()
                .map(|row| TaxBracket::new(row.min_income, row.rate))
                .collect();
            validate_brackets(&brackets).map_err(|e| invalid(e.to_string()))?;

            for row in &rows {
                let Some(stated) = row.base_tax else {
                    continue;
                };
                let accrued = compute_bracket_tax(row.min_income, &brackets);
                if stated != accrued {
                    return Err(invalid(format!(
                        "base tax {stated} at {} does not match {accrued} accrued below it",
                        row.min_income
                    )));
                }
            }

            debug!(schedule = name, brackets = brackets.len(), "schedule loaded");
            schedules.insert(name.to_string(), brackets);
        }

        Ok(schedules)
    }

    /// Builds one validated rule set per form listed in `manifest`.
    pub fn build(
        tax_year: i32,
        jurisdiction: &str,
        manifest: &RuleManifest,
        records: &[BracketRecord],
    ) -> Result<Vec<TaxYearRuleSet>, RuleLoaderError> {
        let schedules = Self::schedules(tax_year, records)?;
        let standard_deductions = manifest
            .standard_deductions
            .iter()
            .map(|(status, amount)| Ok((parse_status(status)?, *amount)))
            .collect::<Result<Vec<_>, RuleLoaderError>>()?;

        let mut rule_sets = Vec::with_capacity(manifest.forms.len());
        for (form, rules) in &manifest.forms {
            let form_code =
                FormCode::parse(form).ok_or_else(|| RuleLoaderError::UnknownForm(form.clone()))?;
            let undefined = |what: &'static str, name: &str| RuleLoaderError::UndefinedReference {
                form: form_code.to_string(),
                what,
                name: name.to_string(),
            };

            let key = RuleSetKey::new(tax_year, jurisdiction, form_code.as_str());
            let mut builder = TaxYearRuleSet::builder(key, &manifest.version)
                .precision(rules.precision.unwrap_or(manifest.precision))
                .rounding(rules.rounding.unwrap_or(manifest.rounding));

            for name in &rules.schedules {
                let brackets = schedules.get(name).ok_or_else(|| undefined("schedule", name))?;
                builder = builder.schedule(name, brackets.clone());
            }
            if rules.standard_deductions {
                for (status, amount) in &standard_deductions {
                    builder = builder.standard_deduction(*status, *amount);
                }
            }
            for name in &rules.phase_outs {
                let record = manifest
                    .phase_outs
                    .get(name)
                    .ok_or_else(|| undefined("phase-out", name))?;
                builder = builder.phase_out(name, phase_out(record)?);
            }
            for name in &rules.parameters {
                let value = manifest
                    .parameters
                    .get(name)
                    .ok_or_else(|| undefined("parameter", name))?;
                builder = builder.parameter(name, *value);
            }

            rule_sets.push(builder.build()?);
        }

        info!(
            tax_year,
            jurisdiction,
            version = %manifest.version,
            forms = rule_sets.len(),
            "rule data loaded"
        );
        Ok(rule_sets)
    }
}

fn parse_status(code: &str) -> Result<FilingStatusCode, RuleLoaderError> {
    FilingStatusCode::parse(code).ok_or_else(|| RuleLoaderError::UnknownFilingStatus(code.to_string()))
}

fn phase_out(record: &PhaseOutRecord) -> Result<PhaseOut, RuleLoaderError> {
    let thresholds = record
        .thresholds
        .iter()
        .map(|(status, amount)| Ok((parse_status(status)?, *amount)))
        .collect::<Result<BTreeMap<_, _>, RuleLoaderError>>()?;

    Ok(PhaseOut {
        thresholds,
        step: record.step,
        reduction_per_step: record.reduction_per_step,
    })
}
