use serde::{Deserialize, Serialize};

/// An immutable span of knowledge-base text carrying a citation.
///
/// Owned by the external ingestion pipeline; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    pub text: String,
    pub citation: String,
    pub section_id: String,
    #[serde(default)]
    pub category_tags: Vec<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl KnowledgeChunk {
    /// Chunks without a citation must never reach a caller.
    pub fn has_citation(&self) -> bool {
        !self.citation.trim().is_empty()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.category_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A chunk returned by a knowledge-store search, with the store's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMatch {
    pub chunk: KnowledgeChunk,
    /// Similarity (vector search) or match score (keyword search) in [0, 1].
    pub score: f64,
}
