use std::future::Future;
use std::sync::Arc;

use crate::errors::LevyResult;
use crate::models::ChunkMatch;

/// Read-only knowledge store holding pre-ingested, citation-bearing chunks.
pub trait IKnowledgeStore: Send + Sync {
    /// Similarity-ranked chunks for an embedding, optionally restricted to a
    /// category tag.
    fn vector_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        category: Option<&str>,
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send;

    /// Exact/substring matches for literal terms, with an independent match score.
    fn keyword_search(
        &self,
        terms: &[String],
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send;
}

impl<T: IKnowledgeStore> IKnowledgeStore for Arc<T> {
    fn vector_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        category: Option<&str>,
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send {
        (**self).vector_search(embedding, top_k, category)
    }

    fn keyword_search(
        &self,
        terms: &[String],
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send {
        (**self).keyword_search(terms)
    }
}
