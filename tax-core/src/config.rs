use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine settings, built once at startup and handed to [`TaxEngine`].
///
/// Every field has a default, so a partial TOML or JSON document is enough.
///
/// [`TaxEngine`]: crate::engine::TaxEngine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on waiting for a rule set, in milliseconds.
    pub rule_fetch_timeout_ms: u64,
    /// Jurisdiction used when a request leaves it empty.
    pub default_jurisdiction: String,
    /// Fail on input codes the form does not read instead of warning.
    pub reject_unknown_inputs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rule_fetch_timeout_ms: 5_000,
            default_jurisdiction: "federal".to_string(),
            reject_unknown_inputs: false,
        }
    }
}

impl EngineConfig {
    pub fn rule_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_fetch_timeout_ms)
    }

    /// `requested`, or the default jurisdiction when it is blank.
    pub fn resolve_jurisdiction<'a>(
        &'a self,
        requested: &'a str,
    ) -> &'a str {
        let requested = requested.trim();
        if requested.is_empty() {
            &self.default_jurisdiction
        } else {
            requested
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.rule_fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.default_jurisdiction, "federal");
        assert!(!config.reject_unknown_inputs);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "reject_unknown_inputs": true }"#).unwrap();

        assert!(config.reject_unknown_inputs);
        assert_eq!(config.rule_fetch_timeout_ms, 5_000);
    }

    #[test]
    fn blank_jurisdiction_falls_back_to_default() {
        let config = EngineConfig::default();

        assert_eq!(config.resolve_jurisdiction("  "), "federal");
        assert_eq!(config.resolve_jurisdiction("CA"), "CA");
    }
}
