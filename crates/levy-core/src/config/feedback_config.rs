use serde::{Deserialize, Serialize};

use super::defaults;

/// Outcome feedback weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Weight of the validated/applied ratio.
    pub ratio_weight: f64,
    /// Weight of the recency-weighted outcome signal.
    pub recency_weight: f64,
    /// Smoothing factor for the recency signal. Higher favours the newest outcome.
    pub recency_decay: f64,
    /// Half-life (days) for staleness demotion at read time. 0, the default,
    /// compares the stored confidence as-is.
    pub stale_half_life_days: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            ratio_weight: defaults::DEFAULT_RATIO_WEIGHT,
            recency_weight: defaults::DEFAULT_RECENCY_WEIGHT,
            recency_decay: defaults::DEFAULT_RECENCY_DECAY,
            stale_half_life_days: defaults::DEFAULT_STALE_HALF_LIFE_DAYS,
        }
    }
}
