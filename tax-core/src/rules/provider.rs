use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::RuleRegistry;
use crate::error::CalculationError;
use crate::models::{RuleSetKey, TaxYearRuleSet};

/// What the engine fetches rule sets from.
///
/// Fetching is the only suspension point of a calculation run; the engine
/// bounds it with the configured timeout.
#[async_trait]
pub trait RuleProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CalculationError::RuleNotFound`] when no rule set exists for
    /// `key`.
    async fn get_rules(
        &self,
        key: &RuleSetKey,
    ) -> Result<Arc<TaxYearRuleSet>, CalculationError>;
}

#[async_trait]
impl RuleProvider for RuleRegistry {
    async fn get_rules(
        &self,
        key: &RuleSetKey,
    ) -> Result<Arc<TaxYearRuleSet>, CalculationError> {
        RuleRegistry::get_rules(self, key)
    }
}

#[derive(Debug, Error)]
pub enum RuleSourceError {
    #[error("rule source unavailable: {0}")]
    Unavailable(String),

    #[error("rule data for {key} is malformed: {reason}")]
    Malformed { key: RuleSetKey, reason: String },
}

/// A backing store rule sets can be loaded from on demand.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Loads the rule set for `key`; `Ok(None)` when the store has none.
    async fn load(
        &self,
        key: &RuleSetKey,
    ) -> Result<Option<TaxYearRuleSet>, RuleSourceError>;
}

/// Serves published rule sets and loads misses from a [`RuleSource`],
/// publishing what it loads.
pub struct LoadingRuleProvider<S> {
    registry: Arc<RuleRegistry>,
    source: S,
}

impl<S: RuleSource> LoadingRuleProvider<S> {
    pub fn new(
        registry: Arc<RuleRegistry>,
        source: S,
    ) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }
}

#[async_trait]
impl<S: RuleSource> RuleProvider for LoadingRuleProvider<S> {
    async fn get_rules(
        &self,
        key: &RuleSetKey,
    ) -> Result<Arc<TaxYearRuleSet>, CalculationError> {
        if let Some(rules) = self.registry.get(key) {
            return Ok(rules);
        }

        debug!(key = %key, "rule set not published, loading from source");
        let loaded = match self.source.load(key).await {
            Ok(Some(rule_set)) => rule_set,
            Ok(None) => {
                return Err(CalculationError::RuleNotFound {
                    key: key.clone(),
                    reason: "not published and not available from the rule source".to_string(),
                });
            }
            Err(error) => {
                warn!(key = %key, error = %error, "rule source failed");
                return Err(CalculationError::RuleNotFound {
                    key: key.clone(),
                    reason: error.to_string(),
                });
            }
        };

        if loaded.key() != key {
            return Err(loaded.invalid(format!("rule source returned it for {key}")));
        }

        // Another run may have loaded the same key meanwhile.
        if let Some(rules) = self.registry.get(key) {
            return Ok(rules);
        }
        let shared = Arc::new(loaded);
        self.registry.publish_shared(Arc::clone(&shared))?;
        Ok(shared)
    }
}
