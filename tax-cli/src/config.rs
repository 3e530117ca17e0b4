use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tax_core::EngineConfig;

/// Contents of the `--config` file.
///
/// ```toml
/// rules_dir = "/srv/tax/rules"
///
/// [engine]
/// rule_fetch_timeout_ms = 2000
/// reject_unknown_inputs = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub engine: EngineConfig,
    pub rules_dir: Option<PathBuf>,
}

impl CliConfig {
    pub const DEFAULT_RULES_DIR: &'static str = "rules";

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// `override_dir` when given, else the configured directory, else
    /// `./rules`.
    pub fn rules_dir(
        &self,
        override_dir: Option<&Path>,
    ) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.rules_dir.clone())
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_RULES_DIR))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config: CliConfig = toml::from_str("").unwrap();

        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_partial_engine_table() {
        let config: CliConfig = toml::from_str(
            r#"
rules_dir = "/srv/rules"

[engine]
reject_unknown_inputs = true
"#,
        )
        .unwrap();

        assert!(config.engine.reject_unknown_inputs);
        assert_eq!(config.engine.rule_fetch_timeout_ms, 5_000);
        assert_eq!(config.rules_dir(None), PathBuf::from("/srv/rules"));
    }

    #[test]
    fn test_flag_overrides_configured_rules_dir() {
        let config = CliConfig {
            rules_dir: Some(PathBuf::from("/srv/rules")),
            ..CliConfig::default()
        };

        assert_eq!(config.rules_dir(Some(Path::new("local"))), PathBuf::from("local"));
        assert_eq!(CliConfig::default().rules_dir(None), PathBuf::from("rules"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<CliConfig, _> = toml::from_str("rule_dir = \"x\"");

        assert!(result.is_err());
    }
}
