//! Degradation aggregation and alert thresholds.

pub mod alerting;
pub mod tracker;

pub use alerting::{evaluate_alerts, AlertLevel, DegradationAlert};
pub use tracker::{ComponentSummary, DegradationTracker};
