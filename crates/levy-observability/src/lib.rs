//! # levy-observability
//!
//! Subscriber setup, span macros for each decision stage, structured log
//! events, and a tracker that aggregates the degradation events attached to
//! decision records.

pub mod degradation;
pub mod tracing_setup;

pub use degradation::{evaluate_alerts, AlertLevel, DegradationAlert, DegradationTracker};
pub use tracing_setup::init_tracing;
