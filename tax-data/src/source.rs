use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tax_core::{RuleRegistry, RuleSetKey, RuleSource, RuleSourceError, TaxYearRuleSet};
use tracing::{debug, info, warn};

use crate::loader::{RuleLoaderError, RuleSetLoader};

const MANIFEST_FILE: &str = "rules.toml";
const BRACKETS_FILE: &str = "brackets.csv";

/// Reads rule data from `<root>/<tax_year>/<jurisdiction>/`.
///
/// Each directory holds a `rules.toml` manifest and, when any form uses a
/// rate schedule, a `brackets.csv`.
#[derive(Debug, Clone)]
pub struct DirectoryRuleSource {
    root: PathBuf,
}

impl DirectoryRuleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every rule set for one tax year and jurisdiction, or `None` when the
    /// directory has no manifest.
    ///
    /// # Errors
    ///
    /// [`RuleLoaderError::InvalidJurisdiction`] unless `jurisdiction` is one
    /// plain path component, so a lookup never leaves `<root>/<tax_year>/`.
    pub async fn load_year(
        &self,
        tax_year: i32,
        jurisdiction: &str,
    ) -> Result<Option<Vec<TaxYearRuleSet>>, RuleLoaderError> {
        if !is_plain_component(jurisdiction) {
            return Err(RuleLoaderError::InvalidJurisdiction(jurisdiction.to_string()));
        }
        let dir = self.root.join(tax_year.to_string()).join(jurisdiction);

        let Some(manifest) = read_optional(&dir.join(MANIFEST_FILE)).await? else {
            debug!(dir = %dir.display(), "no rule manifest");
            return Ok(None);
        };
        let manifest = RuleSetLoader::parse_manifest(&String::from_utf8_lossy(&manifest))?;

        let records = match read_optional(&dir.join(BRACKETS_FILE)).await? {
            Some(csv) => RuleSetLoader::parse_brackets(csv.as_slice())?,
            None => Vec::new(),
        };

        RuleSetLoader::build(tax_year, jurisdiction, &manifest, &records).map(Some)
    }

    /// `(tax_year, jurisdiction)` pairs with a directory under the root,
    /// sorted.
    pub async fn available(&self) -> Result<Vec<(i32, String)>, RuleLoaderError> {
        let mut found = Vec::new();
        for (year_name, year_dir) in list_dirs(&self.root).await? {
            let Ok(tax_year) = year_name.parse::<i32>() else {
                debug!(dir = %year_dir.display(), "skipping non-year directory");
                continue;
            };
            for (jurisdiction, _) in list_dirs(&year_dir).await? {
                found.push((tax_year, jurisdiction));
            }
        }
        found.sort();
        Ok(found)
    }

    /// Loads and publishes every rule set under the root. Returns how many
    /// were published.
    pub async fn load_all(
        &self,
        registry: &RuleRegistry,
    ) -> Result<usize, RuleLoaderError> {
        let mut published = 0;
        for (tax_year, jurisdiction) in self.available().await? {
            let Some(rule_sets) = self.load_year(tax_year, &jurisdiction).await? else {
                continue;
            };
            for rule_set in rule_sets {
                registry.publish(rule_set)?;
                published += 1;
            }
        }
        info!(root = %self.root.display(), published, "rule directory loaded");
        Ok(published)
    }
}

#[async_trait]
impl RuleSource for DirectoryRuleSource {
    async fn load(
        &self,
        key: &RuleSetKey,
    ) -> Result<Option<TaxYearRuleSet>, RuleSourceError> {
        let rule_sets = match self.load_year(key.tax_year, &key.jurisdiction).await {
            Ok(Some(rule_sets)) => rule_sets,
            Ok(None) => return Ok(None),
            Err(RuleLoaderError::InvalidJurisdiction(jurisdiction)) => {
                warn!(key = %key, jurisdiction = %jurisdiction, "jurisdiction is not a directory name");
                return Ok(None);
            }
            Err(error @ RuleLoaderError::Io { .. }) => {
                return Err(RuleSourceError::Unavailable(error.to_string()));
            }
            Err(error) => {
                return Err(RuleSourceError::Malformed {
                    key: key.clone(),
                    reason: error.to_string(),
                });
            }
        };

        Ok(rule_sets.into_iter().find(|rule_set| rule_set.key() == key))
    }
}

/// True when `name` is exactly one ordinary path component: no separators,
/// no `.` or `..`, not absolute.
fn is_plain_component(name: &str) -> bool {
    !name.contains(['/', '\\'])
        && matches!(
            Path::new(name).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        )
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, RuleLoaderError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RuleLoaderError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn list_dirs(path: &Path) -> Result<Vec<(String, PathBuf)>, RuleLoaderError> {
    let io_error = |source| RuleLoaderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(e)),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        if entry.file_type().await.map_err(io_error)?.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_directory_names_accepted() {
        for name in ["federal", "ca", "new-york", "puerto_rico"] {
            assert!(is_plain_component(name), "{name}");
        }
    }

    #[test]
    fn test_path_like_names_rejected() {
        for name in ["", ".", "..", "../2024", "2024/federal", "/etc", "federal/", "..\\2024", "a\\b"] {
            assert!(!is_plain_component(name), "{name:?}");
        }
    }
}
