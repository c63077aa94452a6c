use serde::{Deserialize, Serialize};

use super::defaults;

/// Vector/keyword retrieval sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub simple_top_k: usize,
    pub enhanced_top_k: usize,
    /// Vector hits below this similarity are discarded.
    pub similarity_floor: f64,
    /// Size of the evidence set returned to callers.
    pub final_k: usize,
    /// Maximum number of terms sent to keyword search.
    pub keyword_max_terms: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            simple_top_k: defaults::DEFAULT_SIMPLE_TOP_K,
            enhanced_top_k: defaults::DEFAULT_ENHANCED_TOP_K,
            similarity_floor: defaults::DEFAULT_SIMILARITY_FLOOR,
            final_k: defaults::DEFAULT_FINAL_K,
            keyword_max_terms: defaults::DEFAULT_KEYWORD_MAX_TERMS,
        }
    }
}

/// Relevance validation bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Scores strictly above this are accepted as-is.
    pub accept_above: f64,
    /// Scores strictly below this are rejected permanently.
    pub reject_below: f64,
    /// Fewer accepted candidates than this triggers query expansion.
    pub min_accepted: usize,
    /// Multiplier applied to confidence when an enhancement stage was skipped.
    pub degraded_confidence_factor: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            accept_above: defaults::DEFAULT_ACCEPT_ABOVE,
            reject_below: defaults::DEFAULT_REJECT_BELOW,
            min_accepted: defaults::DEFAULT_MIN_ACCEPTED,
            degraded_confidence_factor: defaults::DEFAULT_DEGRADED_CONFIDENCE_FACTOR,
        }
    }
}

/// Query expansion bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub min_variants: usize,
    pub max_variants: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            min_variants: defaults::DEFAULT_MIN_VARIANTS,
            max_variants: defaults::DEFAULT_MAX_VARIANTS,
        }
    }
}

/// Reranker composite weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub similarity_weight: f64,
    pub validation_weight: f64,
    pub citation_weight: f64,
    /// Share of the final score taken from the assessment service's ordering.
    pub service_blend: f64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            similarity_weight: defaults::DEFAULT_RERANK_SIMILARITY_WEIGHT,
            validation_weight: defaults::DEFAULT_RERANK_VALIDATION_WEIGHT,
            citation_weight: defaults::DEFAULT_RERANK_CITATION_WEIGHT,
            service_blend: defaults::DEFAULT_RERANK_SERVICE_BLEND,
        }
    }
}
