//! Rule data on disk: bracket tables in CSV, everything else in a TOML
//! manifest, one directory per tax year and jurisdiction.
//!
//! ```text
//! rules/
//!   2023/
//!     federal/
//!       rules.toml
//!       brackets.csv
//! ```

mod loader;
mod source;

pub use loader::{BracketRecord, FormRules, PhaseOutRecord, RuleLoaderError, RuleManifest, RuleSetLoader};
pub use source::DirectoryRuleSource;
