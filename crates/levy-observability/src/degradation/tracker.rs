//! Aggregates degradation events across decision calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use levy_core::models::{DecisionRecord, DegradationEvent};
use serde::{Deserialize, Serialize};

use crate::tracing_setup::events;

/// Per-component rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSummary {
    pub component: String,
    pub total: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_failure: String,
    pub last_fallback: String,
}

/// Caller-owned log of degradation events.
///
/// Records are fed in after each decision; a component counts as degraded
/// until [`DegradationTracker::mark_recovered`] is called for it.
#[derive(Debug, Clone, Default)]
pub struct DegradationTracker {
    events: Vec<DegradationEvent>,
    recovered_at: BTreeMap<String, DateTime<Utc>>,
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: DegradationEvent) {
        events::degradation_triggered(&event);
        self.events.push(event);
    }

    /// Record every degradation attached to a decision. Returns how many.
    pub fn observe(&mut self, record: &DecisionRecord) -> usize {
        for event in &record.degradations {
            self.record(event.clone());
        }
        record.degradations.len()
    }

    pub fn mark_recovered(&mut self, component: &str) {
        self.recovered_at.insert(component.to_string(), Utc::now());
    }

    pub fn events(&self) -> &[DegradationEvent] {
        &self.events
    }

    /// Whether `component` has a degradation newer than its last recovery.
    pub fn is_degraded(&self, component: &str) -> bool {
        self.degraded_since(component).is_some()
    }

    /// Earliest degradation of `component` after its last recovery.
    pub fn degraded_since(&self, component: &str) -> Option<DateTime<Utc>> {
        let recovered = self.recovered_at.get(component).copied();
        self.events
            .iter()
            .filter(|e| e.component == component)
            .filter(|e| recovered.map_or(true, |r| e.timestamp > r))
            .map(|e| e.timestamp)
            .min()
    }

    /// Events for `component` newer than `window`.
    pub fn count_recent(&self, component: &str, window: Duration) -> usize {
        let cutoff = Utc::now() - window;
        self.events
            .iter()
            .filter(|e| e.component == component && e.timestamp > cutoff)
            .count()
    }

    /// One summary per component, ordered by name.
    pub fn summary(&self) -> Vec<ComponentSummary> {
        let mut by_component: BTreeMap<&str, ComponentSummary> = BTreeMap::new();
        for e in &self.events {
            by_component
                .entry(e.component.as_str())
                .and_modify(|s| {
                    s.total += 1;
                    s.first_seen = s.first_seen.min(e.timestamp);
                    if e.timestamp >= s.last_seen {
                        s.last_seen = e.timestamp;
                        s.last_failure = e.failure.clone();
                        s.last_fallback = e.fallback_used.clone();
                    }
                })
                .or_insert_with(|| ComponentSummary {
                    component: e.component.clone(),
                    total: 1,
                    first_seen: e.timestamp,
                    last_seen: e.timestamp,
                    last_failure: e.failure.clone(),
                    last_fallback: e.fallback_used.clone(),
                });
        }
        by_component.into_values().collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "total_events": self.events.len(),
            "components": self.summary(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(component: &str, failure: &str) -> DegradationEvent {
        DegradationEvent::now(component, failure, "skipped")
    }

    #[test]
    fn summary_groups_by_component() {
        let mut t = DegradationTracker::new();
        t.record(event("reranker", "timeout"));
        t.record(event("reranker", "unavailable"));
        t.record(event("query_expander", "timeout"));

        let s = t.summary();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].component, "query_expander");
        assert_eq!(s[1].total, 2);
        assert_eq!(s[1].last_failure, "unavailable");
    }

    #[test]
    fn recovery_clears_degraded_state() {
        let mut t = DegradationTracker::new();
        t.record(event("reranker", "timeout"));
        assert!(t.is_degraded("reranker"));
        t.mark_recovered("reranker");
        assert!(!t.is_degraded("reranker"));
        assert_eq!(t.count_recent("reranker", Duration::hours(1)), 1);
    }

    #[test]
    fn old_events_fall_outside_window() {
        let mut t = DegradationTracker::new();
        let mut old = event("vector_retriever", "embedding unavailable");
        old.timestamp = Utc::now() - Duration::hours(3);
        t.record(old);
        assert_eq!(t.count_recent("vector_retriever", Duration::hours(1)), 0);
        assert!(t.is_degraded("vector_retriever"));
    }
}
