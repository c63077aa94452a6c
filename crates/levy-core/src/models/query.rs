use serde::{Deserialize, Serialize};

use crate::constants::MAX_QUERY_CHARS;
use crate::errors::{LevyError, LevyResult};

/// Structured context accompanying a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    /// Category or product type, e.g. `saas_subscription`.
    pub category: Option<String>,
    /// Vendor or other entity identifier.
    pub vendor: Option<String>,
    /// Transaction amount, when known.
    pub amount: Option<f64>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Check the context for malformed fields.
    pub fn validate(&self) -> LevyResult<()> {
        if let Some(category) = &self.category {
            if category.trim().is_empty() {
                return Err(LevyError::invalid_input("context category is blank"));
            }
        }
        if let Some(vendor) = &self.vendor {
            if vendor.trim().is_empty() {
                return Err(LevyError::invalid_input("context vendor is blank"));
            }
        }
        if let Some(amount) = self.amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(LevyError::invalid_input(format!(
                    "context amount {amount} must be a finite, non-negative number"
                )));
            }
        }
        Ok(())
    }
}

/// A validated query. Immutable for the duration of one decision call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    text: String,
    context: QueryContext,
}

impl Query {
    /// Validate and build a query. Empty text or a malformed context is an
    /// `InvalidInput` error.
    pub fn new(text: &str, context: &QueryContext) -> LevyResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(LevyError::invalid_input("query text is empty"));
        }
        let chars = trimmed.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(LevyError::invalid_input(format!(
                "query text has {chars} characters, limit is {MAX_QUERY_CHARS}"
            )));
        }
        context.validate()?;
        Ok(Self {
            text: trimmed.to_string(),
            context: context.clone(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Category filter for knowledge-store searches.
    pub fn category(&self) -> Option<&str> {
        self.context.category.as_deref()
    }
}
