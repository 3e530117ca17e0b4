//! Integration tests for rule loading against the shipped rule directory.

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_core::{
    CalculationError, CalculationRequest, EngineConfig, FilingStatusCode, FormCode,
    LoadingRuleProvider, RuleRegistry, RuleSetKey, RuleSource, RuleSourceError, TaxEngine,
    TaxpayerInput,
};
use tax_data::{DirectoryRuleSource, RuleLoaderError};

fn shipped_rules() -> DirectoryRuleSource {
    DirectoryRuleSource::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("rules"))
}

fn engine() -> TaxEngine {
    let provider = LoadingRuleProvider::new(Arc::new(RuleRegistry::new()), shipped_rules());
    TaxEngine::with_builtin_forms(Arc::new(provider), EngineConfig::default())
}

/// A scratch rule directory unique to this process and test.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tax-data-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("2024").join("federal")).expect("Failed to create scratch dir");
    dir
}

// =============================================================================
// directory tests
// =============================================================================

#[tokio::test]
async fn test_available_years() {
    let available = shipped_rules().available().await.expect("Failed to list rules");

    assert_eq!(
        available,
        vec![(2023, "federal".to_string()), (2024, "federal".to_string())]
    );
}

#[tokio::test]
async fn test_load_all_publishes_every_form_for_every_year() {
    let registry = RuleRegistry::new();

    let published = shipped_rules()
        .load_all(&registry)
        .await
        .expect("Failed to load rules");

    assert_eq!(published, 12);
    for year in [2023, 2024] {
        for form in FormCode::ALL {
            let key = RuleSetKey::new(year, "federal", form.as_str());
            assert!(registry.get(&key).is_some(), "missing {key}");
        }
    }
}

#[tokio::test]
async fn test_2024_individual_rule_values() {
    let key = RuleSetKey::new(2024, "federal", "1040");

    let rules = shipped_rules()
        .load(&key)
        .await
        .expect("Failed to load")
        .expect("2024 individual rules should exist");

    assert_eq!(rules.version(), "2024.1");
    assert_eq!(rules.standard_deduction(FilingStatusCode::Single), Some(dec!(14600)));
    assert_eq!(
        rules.standard_deduction(FilingStatusCode::HeadOfHousehold),
        Some(dec!(21900))
    );
    assert_eq!(rules.parameter("social_security_wage_base"), Some(dec!(168600)));
    assert_eq!(rules.schedule("X").map(<[_]>::len), Some(7));
    assert!(rules.schedule("TRUST").is_none());
}

#[tokio::test]
async fn test_missing_year_is_none() {
    let key = RuleSetKey::new(2099, "federal", "1040");

    let loaded = shipped_rules().load(&key).await.expect("Failed to load");

    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_malformed_manifest_is_reported_as_malformed() {
    let dir = scratch_dir("malformed");
    std::fs::write(dir.join("2024/federal/rules.toml"), "version = 7\n").unwrap();
    let source = DirectoryRuleSource::new(&dir);

    let result = source.load(&RuleSetKey::new(2024, "federal", "1065")).await;

    assert!(matches!(result, Err(RuleSourceError::Malformed { .. })));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_manifest_without_brackets_file() {
    let dir = scratch_dir("no-brackets");
    std::fs::write(
        dir.join("2024/federal/rules.toml"),
        "version = \"2024.test\"\n\n[forms.\"1065\"]\n",
    )
    .unwrap();
    let source = DirectoryRuleSource::new(&dir);

    let rules = source
        .load(&RuleSetKey::new(2024, "federal", "1065"))
        .await
        .expect("Failed to load")
        .expect("partnership rules should exist");

    assert_eq!(rules.version(), "2024.test");
    assert_eq!(rules.schedule_names().count(), 0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_jurisdiction_cannot_leave_year_directory() {
    let source = shipped_rules();

    let result = source.load_year(2023, "../2024/federal").await;

    assert!(matches!(result, Err(RuleLoaderError::InvalidJurisdiction(_))));
}

#[tokio::test]
async fn test_absolute_jurisdiction_cannot_replace_root() {
    let dir = scratch_dir("absolute");
    std::fs::write(
        dir.join("2024/federal/rules.toml"),
        "version = \"2024.elsewhere\"\n\n[forms.\"1065\"]\n",
    )
    .unwrap();
    let elsewhere = dir.join("2024").join("federal");

    let result = shipped_rules()
        .load_year(2024, elsewhere.to_str().expect("temp dir should be UTF-8"))
        .await;

    assert!(matches!(result, Err(RuleLoaderError::InvalidJurisdiction(_))));
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_path_like_jurisdiction_is_not_found() {
    let source = shipped_rules();

    for jurisdiction in ["../2024/federal", "federal/..", ".", "..\\2024"] {
        let key = RuleSetKey::new(2023, jurisdiction, "1040");
        let loaded = source.load(&key).await;
        assert!(matches!(loaded, Ok(None)), "{jurisdiction}: {loaded:?}");
    }
}

// =============================================================================
// engine tests
// =============================================================================

#[tokio::test]
async fn test_2023_single_filer_matches_worked_example() {
    let request = CalculationRequest::new(
        "1040",
        2023,
        TaxpayerInput::new()
            .with_status("filing_status", "S")
            .with_amount("wages", dec!(63850)),
    );

    let result = engine().calculate(request).await.expect("Failed to calculate");

    assert_eq!(result.value("taxable_income"), Some(dec!(50000)));
    assert_eq!(result.value("income_tax"), Some(dec!(6307.50)));
    assert_eq!(result.rule_version(), "2023.1");
}

#[tokio::test]
async fn test_2024_single_filer_uses_2024_brackets() {
    let request = CalculationRequest::new(
        "1040",
        2024,
        TaxpayerInput::new()
            .with_status("filing_status", "S")
            .with_amount("wages", dec!(75000)),
    );

    let result = engine().calculate(request).await.expect("Failed to calculate");

    // 75,000 − 14,600 = 60,400; 5,426 + 0.22 × 13,250
    assert_eq!(result.value("taxable_income"), Some(dec!(60400)));
    assert_eq!(result.value("income_tax"), Some(dec!(8341.00)));
}

#[tokio::test]
async fn test_2024_corporation_flat_rate() {
    let request = CalculationRequest::new(
        "1120",
        2024,
        TaxpayerInput::new().with_amount("gross_receipts", dec!(1000000)),
    );

    let result = engine().calculate(request).await.expect("Failed to calculate");

    assert_eq!(result.value("income_tax"), Some(dec!(210000.00)));
}

#[tokio::test]
async fn test_2024_complex_trust_compressed_brackets() {
    let request = CalculationRequest::new(
        "1041",
        2024,
        TaxpayerInput::new()
            .with_status("entity_type", "COMPLEX_TRUST")
            .with_amount("interest_income", dec!(20000)),
    );

    let result = engine().calculate(request).await.expect("Failed to calculate");

    // 20,000 − 100 exemption; 3,659.50 + 0.37 × 4,700
    assert_eq!(result.value("taxable_income"), Some(dec!(19900)));
    assert_eq!(result.value("income_tax"), Some(dec!(5398.50)));
}

#[tokio::test]
async fn test_request_jurisdiction_outside_rules_dir_is_rule_not_found() {
    let request = CalculationRequest::new(
        "1040",
        2023,
        TaxpayerInput::new()
            .with_status("filing_status", "S")
            .with_amount("wages", dec!(63850)),
    )
    .with_jurisdiction("../2024/federal");

    let result = engine().calculate(request).await;

    match result {
        Err(CalculationError::RuleNotFound { key, reason }) => {
            assert_eq!(key.jurisdiction, "../2024/federal");
            assert!(!reason.contains("malformed"), "{reason}");
        }
        other => panic!("expected RuleNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unshipped_year_is_rule_not_found() {
    let request = CalculationRequest::new(
        "1040",
        2031,
        TaxpayerInput::new()
            .with_status("filing_status", "S")
            .with_amount("wages", dec!(75000)),
    );

    let result = engine().calculate(request).await;

    assert!(matches!(
        result,
        Err(CalculationError::RuleNotFound { ref key, .. }) if key.tax_year == 2031
    ));
}
