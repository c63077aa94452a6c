//! # levy-retrieval
//!
//! Every retrieval stage the Decision Engine can sequence: vector and keyword
//! search, hybrid merge, corrective relevance validation, query expansion,
//! and reranking. [`pipeline::RetrievalPipeline`] wires them into the simple
//! and enhanced paths.

pub mod embedding_cache;
pub mod expansion;
pub mod ledger;
pub mod pipeline;
pub mod ranking;
pub mod resilience;
pub mod search;
pub mod validation;

pub use embedding_cache::CachedEmbedder;
pub use ledger::{CallKind, CallLedger};
pub use pipeline::{PipelineOutput, RetrievalPipeline};
pub use resilience::ResilientCaller;
