use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use crate::error::CalculationError;
use crate::models::{RuleSetKey, TaxYearRuleSet};

/// Published rule sets keyed by (tax year, jurisdiction, form).
#[derive(Debug, Default)]
pub struct RuleRegistry {
    published: RwLock<HashMap<RuleSetKey, Arc<TaxYearRuleSet>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and publishes `rule_set`, returning the one it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidRuleSet`] if the rule set fails its
    /// integrity check; nothing is published in that case.
    pub fn publish(
        &self,
        rule_set: TaxYearRuleSet,
    ) -> Result<Option<Arc<TaxYearRuleSet>>, CalculationError> {
        self.publish_shared(Arc::new(rule_set))
    }

    /// Like [`publish`](Self::publish) for a rule set that is already shared.
    ///
    /// # Errors
    ///
    /// See [`publish`](Self::publish).
    pub fn publish_shared(
        &self,
        rule_set: Arc<TaxYearRuleSet>,
    ) -> Result<Option<Arc<TaxYearRuleSet>>, CalculationError> {
        rule_set.validate()?;

        let key = rule_set.key().clone();
        let version = rule_set.version().to_string();
        let previous = self.write().insert(key.clone(), rule_set);

        match &previous {
            Some(old) => warn!(
                key = %key,
                previous_version = old.version(),
                version = %version,
                "rule set replaced"
            ),
            None => info!(key = %key, version = %version, "rule set published"),
        }
        Ok(previous)
    }

    /// The published rule set for `key`, if any.
    pub fn get(
        &self,
        key: &RuleSetKey,
    ) -> Option<Arc<TaxYearRuleSet>> {
        self.read().get(key).cloned()
    }

    /// The published rule set for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::RuleNotFound`] when nothing is published
    /// under `key`. Other years are never substituted.
    pub fn get_rules(
        &self,
        key: &RuleSetKey,
    ) -> Result<Arc<TaxYearRuleSet>, CalculationError> {
        self.get(key).ok_or_else(|| CalculationError::RuleNotFound {
            key: key.clone(),
            reason: "no rule set has been published for this key".to_string(),
        })
    }

    /// Removes the rule set for `key`. Runs already holding it keep their
    /// copy.
    pub fn withdraw(
        &self,
        key: &RuleSetKey,
    ) -> Option<Arc<TaxYearRuleSet>> {
        let removed = self.write().remove(key);
        if removed.is_some() {
            info!(key = %key, "rule set withdrawn");
        }
        removed
    }

    /// Every published key, sorted.
    pub fn published_keys(&self) -> Vec<RuleSetKey> {
        let mut keys: Vec<RuleSetKey> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A writer that panicked mid-insert cannot leave a partial entry: the map
    // only ever holds complete `Arc`s, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<RuleSetKey, Arc<TaxYearRuleSet>>> {
        self.published.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RuleSetKey, Arc<TaxYearRuleSet>>> {
        self.published.write().unwrap_or_else(PoisonError::into_inner)
    }
}
