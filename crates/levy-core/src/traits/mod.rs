//! Narrow interfaces to the externally owned collaborators.
//!
//! Every method returns a `Send` future so implementations can be driven
//! from any tokio worker. The engine receives implementations by injection;
//! there are no global clients.

mod assessment;
mod embedding;
mod knowledge_store;
mod outcome_cache;
mod rule_store;

pub use assessment::IAssessmentService;
pub use embedding::IEmbeddingService;
pub use knowledge_store::IKnowledgeStore;
pub use outcome_cache::IOutcomeCache;
pub use rule_store::IRuleStore;
