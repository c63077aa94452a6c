//! Curated rule table keyed by normalized category.
//!
//! Lookup is exact on the normalized key; there is no fuzzy matching.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use levy_core::errors::StoreError;
use levy_core::models::normalize_category;
use levy_core::traits::IRuleStore;
use levy_core::{LevyResult, StructuredRule};
use serde::Deserialize;
use tracing::info;

use crate::load_failed;

/// TOML layout: a top-level `[[rules]]` array.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<StructuredRule>,
}

#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: HashMap<String, StructuredRule>,
}

impl InMemoryRuleStore {
    /// Validate every rule and index it. Two rules that normalize to the
    /// same category are rejected.
    pub fn from_rules(rules: Vec<StructuredRule>) -> LevyResult<Self> {
        let mut indexed = HashMap::with_capacity(rules.len());
        for rule in rules {
            rule.validate()?;
            let key = normalize_category(&rule.category_key);
            if indexed.contains_key(&key) {
                return Err(StoreError::InvalidRecord {
                    reason: format!("duplicate rule for category {key}"),
                }
                .into());
            }
            indexed.insert(key, rule);
        }
        Ok(Self { rules: indexed })
    }

    pub fn from_json(json: &str) -> LevyResult<Self> {
        let rules: Vec<StructuredRule> =
            serde_json::from_str(json).map_err(|e| load_failed("rules json", e))?;
        Self::from_rules(rules)
    }

    pub fn from_toml(s: &str) -> LevyResult<Self> {
        let file: RuleFile = toml::from_str(s).map_err(|e| load_failed("rules toml", e))?;
        Self::from_rules(file.rules)
    }

    /// Load from a `.json` or `.toml` file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> LevyResult<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(name.clone(), e))?;
        let store = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            Some("json") => Self::from_json(&content)?,
            other => {
                return Err(load_failed(
                    name,
                    format!("unsupported rule file extension {other:?}"),
                ))
            }
        };
        info!(path = %name, rules = store.len(), "loaded rule table");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, category_key: &str) -> Option<&StructuredRule> {
        self.rules.get(&normalize_category(category_key))
    }
}

impl IRuleStore for InMemoryRuleStore {
    fn lookup(
        &self,
        category_key: &str,
    ) -> impl Future<Output = LevyResult<Option<StructuredRule>>> + Send {
        std::future::ready(Ok(self.get(category_key).cloned()))
    }
}
