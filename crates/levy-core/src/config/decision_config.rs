use serde::{Deserialize, Serialize};

use super::defaults;

/// Decision Engine thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Cached confidence at or above this short-circuits to `USE_CACHED`.
    pub high_threshold: f64,
    /// Cached confidence below this pushes complexity assessment toward the
    /// enhanced pipeline.
    pub medium_threshold: f64,
    /// Queries longer than this many words are never classified simple.
    pub simple_max_words: usize,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            high_threshold: defaults::DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
            medium_threshold: defaults::DEFAULT_MEDIUM_CONFIDENCE_THRESHOLD,
            simple_max_words: defaults::DEFAULT_SIMPLE_MAX_WORDS,
        }
    }
}
