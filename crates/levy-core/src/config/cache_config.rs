use serde::{Deserialize, Serialize};

use super::defaults;

/// Query-embedding cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingCacheConfig {
    pub enabled: bool,
    pub capacity: u64,
    pub ttl_secs: u64,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: defaults::DEFAULT_EMBEDDING_CACHE_CAPACITY,
            ttl_secs: defaults::DEFAULT_EMBEDDING_CACHE_TTL_SECS,
        }
    }
}
