//! Publication and lookup of rule sets.
//!
//! [`RuleRegistry`] is the only shared mutable state in the engine. Readers
//! clone an `Arc` under a short read lock; publishing swaps the `Arc` for a
//! fully built replacement, so no reader ever sees a half-updated rule set.

mod provider;
mod registry;

pub use provider::{LoadingRuleProvider, RuleProvider, RuleSource, RuleSourceError};
pub use registry::RuleRegistry;
