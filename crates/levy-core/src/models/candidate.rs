use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ChunkMatch;

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Vector,
    Keyword,
    Expanded,
    /// Synthesized from a structured rule, not retrieved.
    Rule,
}

/// A knowledge chunk reference moving through one decision call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    pub chunk_id: String,
    pub citation: String,
    pub section_id: String,
    pub text: String,
    /// Best retrieval score seen for this chunk (similarity or keyword match).
    pub similarity_score: f64,
    pub validation_score: Option<f64>,
    pub rerank_score: Option<f64>,
    /// Source that produced `similarity_score`.
    pub source: CandidateSource,
    /// Every source that returned this chunk. Diagnostic only.
    pub contributing_sources: BTreeSet<CandidateSource>,
}

impl RetrievalCandidate {
    pub fn from_match(m: &ChunkMatch, source: CandidateSource) -> Self {
        Self {
            chunk_id: m.chunk.id.clone(),
            citation: m.chunk.citation.clone(),
            section_id: m.chunk.section_id.clone(),
            text: m.chunk.text.clone(),
            similarity_score: m.score.clamp(0.0, 1.0),
            validation_score: None,
            rerank_score: None,
            source,
            contributing_sources: BTreeSet::from([source]),
        }
    }

    pub fn was_found_by(&self, source: CandidateSource) -> bool {
        self.contributing_sources.contains(&source)
    }

    /// Score used for ordering once every stage has run: rerank, then
    /// validation, then raw retrieval score.
    pub fn best_score(&self) -> f64 {
        self.rerank_score
            .or(self.validation_score)
            .unwrap_or(self.similarity_score)
    }
}

/// Sort by `key` descending, ties broken by `chunk_id` so results are
/// deterministic across identical calls.
pub fn sort_candidates_by(
    candidates: &mut [RetrievalCandidate],
    key: impl Fn(&RetrievalCandidate) -> f64,
) {
    candidates.sort_by(|a, b| {
        key(b)
            .partial_cmp(&key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
}
