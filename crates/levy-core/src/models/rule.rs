use serde::{Deserialize, Serialize};

use crate::errors::{LevyResult, StoreError};

use super::context_key::normalize_part;

/// A named exemption attached to a structured rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemption {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub citation: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// A curated, category-keyed determination with citations baked in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRule {
    pub category_key: String,
    pub taxable: bool,
    pub citations: Vec<String>,
    #[serde(default)]
    pub exemptions: Vec<Exemption>,
    pub confidence_weight: f64,
}

impl StructuredRule {
    /// Validate at the store boundary.
    pub fn validate(&self) -> LevyResult<()> {
        if normalize_category(&self.category_key).is_empty() {
            return Err(invalid("rule category_key is empty"));
        }
        if self.citations.is_empty() || self.citations.iter().any(|c| c.trim().is_empty()) {
            return Err(invalid(format!(
                "rule {} must carry non-empty citations",
                self.category_key
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_weight) {
            return Err(invalid(format!(
                "rule {} confidence_weight {} outside [0, 1]",
                self.category_key, self.confidence_weight
            )));
        }
        Ok(())
    }

    /// One-line determination used as synthesized evidence text.
    pub fn summary(&self) -> String {
        let verdict = if self.taxable { "taxable" } else { "not taxable" };
        if self.exemptions.is_empty() {
            format!("{}: {verdict}", self.category_key)
        } else {
            let names: Vec<&str> = self.exemptions.iter().map(|e| e.name.as_str()).collect();
            format!(
                "{}: {verdict}; exemptions: {}",
                self.category_key,
                names.join(", ")
            )
        }
    }
}

/// Normalized form of a category string used for exact rule lookup.
pub fn normalize_category(raw: &str) -> String {
    normalize_part(raw)
}

fn invalid(reason: impl Into<String>) -> crate::errors::LevyError {
    StoreError::InvalidRecord {
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> StructuredRule {
        StructuredRule {
            category_key: "iaas_paas".into(),
            taxable: true,
            citations: vec!["RCW 82.04.050(6)".into()],
            exemptions: vec![],
            confidence_weight: 0.9,
        }
    }

    #[test]
    fn valid_rule_passes() {
        assert!(rule().validate().is_ok());
    }

    #[test]
    fn rule_without_citations_fails() {
        let mut r = rule();
        r.citations.clear();
        assert!(r.validate().is_err());
    }

    #[test]
    fn rule_weight_out_of_range_fails() {
        let mut r = rule();
        r.confidence_weight = 1.2;
        assert!(r.validate().is_err());
    }

    #[test]
    fn normalize_category_folds_separators() {
        assert_eq!(normalize_category("IaaS / PaaS"), "iaas_paas");
    }
}
