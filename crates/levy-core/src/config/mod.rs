//! Configuration. Every magic threshold lives here with a named default.

mod cache_config;
mod cost_config;
mod decision_config;
pub mod defaults;
mod feedback_config;
mod observability_config;
mod resilience_config;
mod retrieval_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cache_config::EmbeddingCacheConfig;
pub use cost_config::CostConfig;
pub use decision_config::DecisionConfig;
pub use feedback_config::FeedbackConfig;
pub use observability_config::ObservabilityConfig;
pub use resilience_config::ResilienceConfig;
pub use retrieval_config::{ExpansionConfig, RerankConfig, RetrievalConfig, ValidationConfig};

use crate::errors::{ConfigError, LevyResult};

/// Top-level configuration injected into the engine at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LevyConfig {
    pub decision: DecisionConfig,
    pub retrieval: RetrievalConfig,
    pub validation: ValidationConfig,
    pub expansion: ExpansionConfig,
    pub rerank: RerankConfig,
    pub resilience: ResilienceConfig,
    pub feedback: FeedbackConfig,
    pub cost: CostConfig,
    pub embedding_cache: EmbeddingCacheConfig,
    pub observability: ObservabilityConfig,
}

impl LevyConfig {
    /// Parse from a TOML string. Missing sections and fields take defaults.
    pub fn from_toml(s: &str) -> LevyResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    pub fn load(path: impl AsRef<Path>) -> LevyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> LevyResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::Parse {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Reject inconsistent thresholds.
    pub fn validate(&self) -> LevyResult<()> {
        let unit_fields = [
            ("decision.high_threshold", self.decision.high_threshold),
            ("decision.medium_threshold", self.decision.medium_threshold),
            ("retrieval.similarity_floor", self.retrieval.similarity_floor),
            ("validation.accept_above", self.validation.accept_above),
            ("validation.reject_below", self.validation.reject_below),
            (
                "validation.degraded_confidence_factor",
                self.validation.degraded_confidence_factor,
            ),
            ("rerank.service_blend", self.rerank.service_blend),
            ("feedback.ratio_weight", self.feedback.ratio_weight),
            ("feedback.recency_weight", self.feedback.recency_weight),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("{value} is outside [0, 1]")));
            }
        }

        if self.decision.medium_threshold > self.decision.high_threshold {
            return Err(invalid(
                "decision.medium_threshold",
                "must not exceed decision.high_threshold",
            ));
        }
        if self.validation.reject_below > self.validation.accept_above {
            return Err(invalid(
                "validation.reject_below",
                "must not exceed validation.accept_above",
            ));
        }
        if self.expansion.min_variants > self.expansion.max_variants {
            return Err(invalid(
                "expansion.min_variants",
                "must not exceed expansion.max_variants",
            ));
        }
        if self.retrieval.simple_top_k == 0
            || self.retrieval.enhanced_top_k == 0
            || self.retrieval.final_k == 0
        {
            return Err(invalid("retrieval", "top_k values must be positive"));
        }
        if self.feedback.ratio_weight + self.feedback.recency_weight > 1.0 + f64::EPSILON {
            return Err(invalid(
                "feedback",
                "ratio_weight + recency_weight must not exceed 1",
            ));
        }
        if self.feedback.ratio_weight <= 0.0 || self.feedback.recency_weight <= 0.0 {
            return Err(invalid("feedback", "weights must be positive"));
        }
        if !(self.feedback.recency_decay > 0.0 && self.feedback.recency_decay <= 1.0) {
            return Err(invalid("feedback.recency_decay", "must be in (0, 1]"));
        }
        if self.feedback.stale_half_life_days < 0.0 {
            return Err(invalid("feedback.stale_half_life_days", "must be >= 0"));
        }
        let rerank_sum = self.rerank.similarity_weight
            + self.rerank.validation_weight
            + self.rerank.citation_weight;
        if self.rerank.similarity_weight < 0.0
            || self.rerank.validation_weight < 0.0
            || self.rerank.citation_weight < 0.0
            || rerank_sum <= 0.0
        {
            return Err(invalid("rerank", "weights must be non-negative with a positive sum"));
        }
        if self.resilience.backoff_multiplier < 1.0 {
            return Err(invalid("resilience.backoff_multiplier", "must be >= 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> crate::errors::LevyError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
    .into()
}
