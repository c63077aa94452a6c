//! Structured log events for the decision lifecycle.

use levy_core::models::{DecisionAction, DecisionState, DegradationEvent};

pub fn state_transition(from: DecisionState, to: DecisionState) {
    tracing::debug!(event = "state_transition", from = ?from, to = ?to, "state transition");
}

pub fn decision_made(action: DecisionAction, confidence: f64, evidence: usize, degraded: bool) {
    tracing::info!(
        event = "decision_made",
        action = ?action,
        confidence,
        candidates = evidence,
        degraded,
        "decision made"
    );
}

pub fn degradation_triggered(event: &DegradationEvent) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %event.component,
        failure = %event.failure,
        fallback = %event.fallback_used,
        "degradation triggered"
    );
}

pub fn outcome_recorded(context_key: &str, times_applied: u64, confidence: f64) {
    tracing::info!(
        event = "outcome_recorded",
        context_key,
        times_applied,
        confidence,
        "outcome recorded"
    );
}

/// A cache or rule lookup failed and was treated as a miss.
pub fn lookup_failed(store: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(
        event = "lookup_failed",
        store,
        error = %error,
        "lookup failed, treating as miss"
    );
}
