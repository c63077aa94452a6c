use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Confidence, ContextKey, DegradationEvent, OutcomeRecord, RetrievalCandidate, StructuredRule,
};

/// The action the Decision Engine took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionAction {
    UseCached,
    UseRules,
    RetrieveSimple,
    RetrieveEnhanced,
}

/// States of the per-call decision sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionState {
    Init,
    CheckCache,
    CheckRules,
    AssessComplexity,
    RetrieveSimple,
    RetrieveEnhanced,
    Done,
}

/// Retrieval depth, for `force_retrieve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalMode {
    Simple,
    Enhanced,
}

impl RetrievalMode {
    pub fn action(self) -> DecisionAction {
        match self {
            Self::Simple => DecisionAction::RetrieveSimple,
            Self::Enhanced => DecisionAction::RetrieveEnhanced,
        }
    }

    pub fn state(self) -> DecisionState {
        match self {
            Self::Simple => DecisionState::RetrieveSimple,
            Self::Enhanced => DecisionState::RetrieveEnhanced,
        }
    }
}

/// Result of one decision call. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Unique per call; correlates log lines with the caller's records.
    pub decision_id: Uuid,
    pub action: DecisionAction,
    pub confidence: Confidence,
    pub evidence: Vec<RetrievalCandidate>,
    /// One or more enhancement stages failed and were skipped.
    pub degraded: bool,
    pub cost_saved_estimate: f64,
    pub context_key: Option<ContextKey>,
    /// Prior determination that short-circuited the call.
    pub cached: Option<OutcomeRecord>,
    /// Rule that short-circuited the call.
    pub rule: Option<StructuredRule>,
    pub degradations: Vec<DegradationEvent>,
    /// States visited, in order.
    pub trace: Vec<DecisionState>,
}

impl DecisionRecord {
    /// Degraded or zero-confidence results go to a human.
    pub fn needs_review(&self) -> bool {
        self.degraded || self.confidence.is_zero()
    }

    pub fn evidence_ids(&self) -> Vec<&str> {
        self.evidence.iter().map(|c| c.chunk_id.as_str()).collect()
    }

    pub fn citations(&self) -> Vec<&str> {
        self.evidence.iter().map(|c| c.citation.as_str()).collect()
    }
}
