use std::future::Future;
use std::sync::Arc;

use crate::errors::LevyResult;
use crate::models::RetrievalCandidate;

/// Relevance assessment, reranking, and query expansion service.
pub trait IAssessmentService: Send + Sync {
    /// Relevance of `chunk_text` to `query` in [0, 1].
    fn assess(
        &self,
        query: &str,
        chunk_text: &str,
    ) -> impl Future<Output = LevyResult<f64>> + Send;

    /// Candidate chunk ids, most relevant first.
    fn rerank(
        &self,
        query: &str,
        candidates: &[RetrievalCandidate],
    ) -> impl Future<Output = LevyResult<Vec<String>>> + Send;

    /// Alternate phrasings of `query`.
    fn expand(&self, query: &str) -> impl Future<Output = LevyResult<Vec<String>>> + Send;
}

impl<T: IAssessmentService> IAssessmentService for Arc<T> {
    fn assess(
        &self,
        query: &str,
        chunk_text: &str,
    ) -> impl Future<Output = LevyResult<f64>> + Send {
        (**self).assess(query, chunk_text)
    }

    fn rerank(
        &self,
        query: &str,
        candidates: &[RetrievalCandidate],
    ) -> impl Future<Output = LevyResult<Vec<String>>> + Send {
        (**self).rerank(query, candidates)
    }

    fn expand(&self, query: &str) -> impl Future<Output = LevyResult<Vec<String>>> + Send {
        (**self).expand(query)
    }
}
