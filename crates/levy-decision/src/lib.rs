//! # levy-decision
//!
//! The Decision Engine: per call it checks the outcome cache, then the rule
//! store, then classifies query complexity and runs the simple or enhanced
//! retrieval path. Callers report outcomes back through
//! [`DecisionEngine::record_outcome`].

pub mod complexity;
pub mod engine;
pub mod evidence;
mod feedback;

pub use complexity::{ComplexityAssessment, ComplexitySignal};
pub use engine::{CacheCheck, DecisionEngine};
