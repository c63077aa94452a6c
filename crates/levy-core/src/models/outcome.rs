use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::FeedbackConfig;
use crate::errors::{LevyResult, StoreError};

use super::{Confidence, ContextKey};

/// A prior determination for one context key.
///
/// `confidence` is never assigned by callers: it is derived from the
/// validated/applied ratio and a recency-weighted outcome signal every time
/// an outcome is applied. Stores rebuild records through
/// [`OutcomeRecord::from_parts`], which enforces the counter invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OutcomeRecordParts", into = "OutcomeRecordParts")]
pub struct OutcomeRecord {
    context_key: ContextKey,
    confidence: Confidence,
    outcome_summary: String,
    times_applied: u64,
    times_validated: u64,
    recency_signal: f64,
    last_updated: DateTime<Utc>,
}

/// Single observed outcome fed back by a caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub was_validated: bool,
    pub observed_confidence: f64,
}

impl OutcomeRecord {
    /// Create the record for the first analysis of a context.
    pub fn first(
        context_key: ContextKey,
        outcome: Outcome,
        summary: impl Into<String>,
        config: &FeedbackConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let empty = Self {
            context_key,
            confidence: Confidence::ZERO,
            outcome_summary: summary.into(),
            times_applied: 0,
            times_validated: 0,
            recency_signal: 0.0,
            last_updated: now,
        };
        empty.applied(outcome, None, config, now)
    }

    /// Rebuild a record from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        context_key: ContextKey,
        confidence: f64,
        outcome_summary: String,
        times_applied: u64,
        times_validated: u64,
        recency_signal: f64,
        last_updated: DateTime<Utc>,
    ) -> LevyResult<Self> {
        if times_validated > times_applied {
            return Err(StoreError::InvalidRecord {
                reason: format!(
                    "{context_key}: times_validated {times_validated} exceeds times_applied {times_applied}"
                ),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&confidence) || !(0.0..=1.0).contains(&recency_signal) {
            return Err(StoreError::InvalidRecord {
                reason: format!("{context_key}: confidence or recency signal outside [0, 1]"),
            }
            .into());
        }
        Ok(Self {
            context_key,
            confidence: Confidence::new(confidence),
            outcome_summary,
            times_applied,
            times_validated,
            recency_signal,
            last_updated,
        })
    }

    /// Fold one more outcome into the record, returning the updated copy.
    ///
    /// A negative outcome never raises confidence, and strictly lowers it
    /// whenever it is above zero.
    pub fn applied(
        &self,
        outcome: Outcome,
        summary: Option<&str>,
        config: &FeedbackConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let times_applied = self.times_applied + 1;
        let times_validated = self.times_validated + u64::from(outcome.was_validated);

        let signal = if outcome.was_validated {
            outcome.observed_confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let recency_signal = if self.times_applied == 0 {
            signal
        } else {
            config.recency_decay * signal + (1.0 - config.recency_decay) * self.recency_signal
        };

        let ratio = times_validated as f64 / times_applied as f64;
        let confidence =
            Confidence::new(config.ratio_weight * ratio + config.recency_weight * recency_signal);

        Self {
            context_key: self.context_key.clone(),
            confidence,
            outcome_summary: summary
                .map(str::to_string)
                .unwrap_or_else(|| self.outcome_summary.clone()),
            times_applied,
            times_validated,
            recency_signal: recency_signal.clamp(0.0, 1.0),
            last_updated: now.max(self.last_updated),
        }
    }

    /// Confidence demoted by age since the last update.
    ///
    /// Halves every `half_life_days`; a half-life of 0 disables demotion.
    pub fn effective_confidence(&self, now: DateTime<Utc>, half_life_days: f64) -> Confidence {
        if half_life_days <= 0.0 {
            return self.confidence;
        }
        let age_days = (now - self.last_updated).num_seconds().max(0) as f64 / 86_400.0;
        self.confidence * 0.5f64.powf(age_days / half_life_days)
    }

    pub fn context_key(&self) -> &ContextKey {
        &self.context_key
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn outcome_summary(&self) -> &str {
        &self.outcome_summary
    }

    pub fn times_applied(&self) -> u64 {
        self.times_applied
    }

    pub fn times_validated(&self) -> u64 {
        self.times_validated
    }

    pub fn recency_signal(&self) -> f64 {
        self.recency_signal
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Serialized shape of [`OutcomeRecord`]; validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutcomeRecordParts {
    context_key: ContextKey,
    confidence: f64,
    outcome_summary: String,
    times_applied: u64,
    times_validated: u64,
    #[serde(default)]
    recency_signal: f64,
    last_updated: DateTime<Utc>,
}

impl TryFrom<OutcomeRecordParts> for OutcomeRecord {
    type Error = crate::errors::LevyError;

    fn try_from(p: OutcomeRecordParts) -> Result<Self, Self::Error> {
        Self::from_parts(
            p.context_key,
            p.confidence,
            p.outcome_summary,
            p.times_applied,
            p.times_validated,
            p.recency_signal,
            p.last_updated,
        )
    }
}

impl From<OutcomeRecord> for OutcomeRecordParts {
    fn from(r: OutcomeRecord) -> Self {
        Self {
            context_key: r.context_key,
            confidence: r.confidence.value(),
            outcome_summary: r.outcome_summary,
            times_applied: r.times_applied,
            times_validated: r.times_validated,
            recency_signal: r.recency_signal,
            last_updated: r.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key() -> ContextKey {
        ContextKey::normalize(Some("saas_subscription"), Some("Acme"))
    }

    fn validated(c: f64) -> Outcome {
        Outcome {
            was_validated: true,
            observed_confidence: c,
        }
    }

    const REJECTED: Outcome = Outcome {
        was_validated: false,
        observed_confidence: 0.9,
    };

    #[test]
    fn first_validated_outcome_sets_full_ratio() {
        let cfg = FeedbackConfig::default();
        let r = OutcomeRecord::first(key(), validated(1.0), "taxable", &cfg, Utc::now());
        assert_eq!(r.times_applied(), 1);
        assert_eq!(r.times_validated(), 1);
        assert!((r.confidence().value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn negative_outcome_strictly_lowers_confidence() {
        let cfg = FeedbackConfig::default();
        let now = Utc::now();
        let mut r = OutcomeRecord::first(key(), validated(0.9), "taxable", &cfg, now);
        for _ in 0..5 {
            let next = r.applied(REJECTED, None, &cfg, now);
            assert!(next.confidence() < r.confidence());
            r = next;
        }
        assert_eq!(r.times_validated(), 1);
        assert_eq!(r.times_applied(), 6);
    }

    #[test]
    fn negative_outcome_at_zero_stays_zero() {
        let cfg = FeedbackConfig::default();
        let r = OutcomeRecord::first(key(), REJECTED, "", &cfg, Utc::now());
        assert!(r.confidence().is_zero());
        let next = r.applied(REJECTED, None, &cfg, Utc::now());
        assert!(next.confidence().is_zero());
    }

    #[test]
    fn summary_is_replaced_only_when_given() {
        let cfg = FeedbackConfig::default();
        let r = OutcomeRecord::first(key(), validated(0.8), "old", &cfg, Utc::now());
        assert_eq!(r.applied(REJECTED, None, &cfg, Utc::now()).outcome_summary(), "old");
        assert_eq!(
            r.applied(REJECTED, Some("new"), &cfg, Utc::now()).outcome_summary(),
            "new"
        );
    }

    #[test]
    fn from_parts_rejects_inverted_counters() {
        let err = OutcomeRecord::from_parts(key(), 0.5, String::new(), 1, 2, 0.0, Utc::now());
        assert!(err.is_err());
    }

    #[test]
    fn effective_confidence_halves_per_half_life() {
        let now = Utc::now();
        let r = OutcomeRecord::from_parts(
            key(),
            0.8,
            String::new(),
            4,
            4,
            0.8,
            now - Duration::days(180),
        )
        .unwrap();
        let eff = r.effective_confidence(now, 180.0).value();
        assert!((eff - 0.4).abs() < 1e-3);
        assert_eq!(r.effective_confidence(now, 0.0).value(), 0.8);
    }

    #[test]
    fn serde_round_trip_validates() {
        let cfg = FeedbackConfig::default();
        let r = OutcomeRecord::first(key(), validated(0.7), "ok", &cfg, Utc::now());
        let json = serde_json::to_string(&r).unwrap();
        let back: OutcomeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);

        let bad = json.replace("\"times_validated\":1", "\"times_validated\":9");
        assert!(serde_json::from_str::<OutcomeRecord>(&bad).is_err());
    }
}
