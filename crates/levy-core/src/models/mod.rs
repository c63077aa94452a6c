mod candidate;
mod chunk;
mod confidence;
mod context_key;
mod decision;
mod degradation_event;
mod outcome;
mod query;
mod rule;

pub use candidate::{sort_candidates_by, CandidateSource, RetrievalCandidate};
pub use chunk::{ChunkMatch, KnowledgeChunk};
pub use confidence::Confidence;
pub use context_key::{normalize_part, ContextKey};
pub use decision::{DecisionAction, DecisionRecord, DecisionState, RetrievalMode};
pub use degradation_event::DegradationEvent;
pub use outcome::{Outcome, OutcomeRecord};
pub use query::{Query, QueryContext};
pub use rule::{normalize_category, Exemption, StructuredRule};
