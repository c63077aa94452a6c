use serde::{Deserialize, Serialize};

use super::defaults;

/// Unit cost of each kind of external call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub embed: f64,
    pub vector_search: f64,
    pub keyword_search: f64,
    /// Per assessed candidate.
    pub assess: f64,
    pub rerank: f64,
    pub expand: f64,
}

impl CostConfig {
    /// Average cost of one enhanced retrieval: embed, both searches, one
    /// assessment per retrieved candidate, and a rerank.
    pub fn enhanced_baseline(&self, enhanced_top_k: usize) -> f64 {
        self.embed
            + self.vector_search
            + self.keyword_search
            + self.assess * enhanced_top_k as f64
            + self.rerank
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            embed: defaults::DEFAULT_EMBED_COST,
            vector_search: defaults::DEFAULT_VECTOR_SEARCH_COST,
            keyword_search: defaults::DEFAULT_KEYWORD_SEARCH_COST,
            assess: defaults::DEFAULT_ASSESS_COST,
            rerank: defaults::DEFAULT_RERANK_COST,
            expand: defaults::DEFAULT_EXPAND_COST,
        }
    }
}
