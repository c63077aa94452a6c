//! # levy-core
//!
//! Foundation crate for the levy decision engine.
//! Defines the data model, collaborator traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod cancellation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use cancellation::CancellationToken;
pub use config::LevyConfig;
pub use errors::{LevyError, LevyResult};
pub use models::{
    CandidateSource, Confidence, ContextKey, DecisionAction, DecisionRecord, DecisionState,
    KnowledgeChunk, OutcomeRecord, Query, QueryContext, RetrievalCandidate, RetrievalMode,
    StructuredRule,
};
