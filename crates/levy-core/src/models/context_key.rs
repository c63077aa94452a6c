use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{CONTEXT_KEY_SEPARATOR, EMPTY_KEY_PART};
use crate::errors::{LevyError, LevyResult};

use super::QueryContext;

/// Normalized `category::entity` key for Outcome Cache records.
///
/// Built only through [`ContextKey::normalize`] or [`ContextKey::parse`], so two
/// spellings of the same vendor/category pair always map to the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContextKey(String);

impl ContextKey {
    /// `normalize(category, vendor_or_entity_identifier)`.
    pub fn normalize(category: Option<&str>, entity: Option<&str>) -> Self {
        let category = category.map(normalize_part).filter(|p| !p.is_empty());
        let entity = entity.map(normalize_part).filter(|p| !p.is_empty());
        Self(format!(
            "{}{}{}",
            category.as_deref().unwrap_or(EMPTY_KEY_PART),
            CONTEXT_KEY_SEPARATOR,
            entity.as_deref().unwrap_or(EMPTY_KEY_PART),
        ))
    }

    /// Key for a query context, or `None` when the context names neither a
    /// category nor an entity.
    pub fn from_context(context: &QueryContext) -> Option<Self> {
        let key = Self::normalize(context.category.as_deref(), context.vendor.as_deref());
        if key.is_empty_key() {
            None
        } else {
            Some(key)
        }
    }

    /// Parse a key previously produced by [`ContextKey::as_str`].
    pub fn parse(raw: &str) -> LevyResult<Self> {
        let (category, entity) = raw.split_once(CONTEXT_KEY_SEPARATOR).ok_or_else(|| {
            LevyError::invalid_input(format!("context key {raw:?} has no separator"))
        })?;
        let key = Self::normalize(Some(category), Some(entity));
        if key.is_empty_key() {
            return Err(LevyError::invalid_input("context key is empty"));
        }
        Ok(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_empty_key(&self) -> bool {
        self.0 == format!("{EMPTY_KEY_PART}{CONTEXT_KEY_SEPARATOR}{EMPTY_KEY_PART}")
    }
}

/// Lowercase, trim, and fold every run of non-alphanumeric characters to `_`.
pub fn normalize_part(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContextKey {
    type Error = LevyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContextKey> for String {
    fn from(key: ContextKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_punctuation() {
        let a = ContextKey::normalize(Some("SaaS Subscription"), Some("Acme, Inc."));
        let b = ContextKey::normalize(Some("saas_subscription"), Some("acme inc"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "saas_subscription::acme_inc");
    }

    #[test]
    fn missing_parts_use_placeholder() {
        let key = ContextKey::normalize(Some("iaas_paas"), None);
        assert_eq!(key.as_str(), "iaas_paas::_");
    }

    #[test]
    fn parse_round_trips() {
        let key = ContextKey::normalize(Some("iaas_paas"), Some("Globex"));
        assert_eq!(ContextKey::parse(key.as_str()).unwrap(), key);
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert!(ContextKey::parse("no-separator").is_err());
    }

    #[test]
    fn empty_context_has_no_key() {
        assert!(ContextKey::from_context(&QueryContext::default()).is_none());
    }
}
