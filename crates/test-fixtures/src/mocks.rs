//! Call-counting mock collaborators with scripted failures.
//!
//! Every mock counts each invocation (retries included) so tests can assert
//! exactly which external calls a decision made.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use levy_core::errors::{AssessmentError, EmbeddingError, StoreError};
use levy_core::models::ChunkMatch;
use levy_core::traits::{IAssessmentService, IEmbeddingService, IKnowledgeStore};
use levy_core::{LevyError, LevyResult, RetrievalCandidate};

/// Scripted failure sequence for one operation.
#[derive(Debug, Default)]
pub struct FailurePlan {
    remaining: AtomicUsize,
    always: AtomicBool,
}

impl FailurePlan {
    /// Fail the next `n` calls, then succeed.
    pub fn fail_next(&self, n: usize) {
        self.remaining.store(n, Ordering::SeqCst);
    }

    pub fn fail_always(&self) {
        self.always.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.always.store(false, Ordering::SeqCst);
        self.remaining.store(0, Ordering::SeqCst);
    }

    fn should_fail(&self) -> bool {
        if self.always.load(Ordering::SeqCst) {
            return true;
        }
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Embedding mock. The vector encodes the query bytes so [`MockKnowledgeStore`]
/// can script results per query text.
#[derive(Debug, Default)]
pub struct MockEmbedder {
    pub calls: AtomicUsize,
    pub failures: FailurePlan,
    delay: Option<Duration>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn encode(text: &str) -> Vec<f32> {
        text.trim().to_lowercase().bytes().map(f32::from).collect()
    }

    pub fn decode(embedding: &[f32]) -> String {
        let bytes: Vec<u8> = embedding.iter().map(|f| *f as u8).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl IEmbeddingService for MockEmbedder {
    fn embed(&self, text: &str) -> impl Future<Output = LevyResult<Vec<f32>>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.failures.should_fail();
        let delay = self.delay;
        let embedding = Self::encode(text);
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(EmbeddingError::Unavailable {
                    reason: "scripted failure".into(),
                }
                .into());
            }
            Ok(embedding)
        }
    }

    fn name(&self) -> &str {
        "mock-embedder"
    }
}

/// Knowledge store mock with per-query vector results.
#[derive(Debug, Default)]
pub struct MockKnowledgeStore {
    pub vector_calls: AtomicUsize,
    pub keyword_calls: AtomicUsize,
    pub vector_failures: FailurePlan,
    pub keyword_failures: FailurePlan,
    default_vector: Vec<ChunkMatch>,
    vector_by_query: HashMap<String, Vec<ChunkMatch>>,
    keyword: Vec<ChunkMatch>,
    last_terms: Mutex<Vec<String>>,
}

impl MockKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector results for any query without a specific script.
    pub fn with_vector(mut self, matches: Vec<ChunkMatch>) -> Self {
        self.default_vector = matches;
        self
    }

    /// Vector results for one query text (case-insensitive).
    pub fn with_vector_for(mut self, query: &str, matches: Vec<ChunkMatch>) -> Self {
        self.vector_by_query
            .insert(query.trim().to_lowercase(), matches);
        self
    }

    pub fn with_keyword(mut self, matches: Vec<ChunkMatch>) -> Self {
        self.keyword = matches;
        self
    }

    pub fn vector_calls(&self) -> usize {
        self.vector_calls.load(Ordering::SeqCst)
    }

    pub fn keyword_calls(&self) -> usize {
        self.keyword_calls.load(Ordering::SeqCst)
    }

    pub fn last_terms(&self) -> Vec<String> {
        self.last_terms.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn unavailable() -> LevyError {
        StoreError::Unavailable {
            store: "knowledge store".into(),
            reason: "scripted failure".into(),
        }
        .into()
    }
}

impl IKnowledgeStore for MockKnowledgeStore {
    fn vector_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        _category: Option<&str>,
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send {
        self.vector_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.vector_failures.should_fail() {
            Err(Self::unavailable())
        } else {
            let query = MockEmbedder::decode(embedding);
            let mut matches = self
                .vector_by_query
                .get(&query)
                .unwrap_or(&self.default_vector)
                .clone();
            matches.truncate(top_k);
            Ok(matches)
        };
        async move { result }
    }

    fn keyword_search(
        &self,
        terms: &[String],
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send {
        self.keyword_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_terms.lock() {
            *last = terms.to_vec();
        }
        let result = if self.keyword_failures.should_fail() {
            Err(Self::unavailable())
        } else {
            Ok(self.keyword.clone())
        };
        async move { result }
    }
}

/// Assessment service mock: per-chunk relevance scores, fixed rerank order,
/// fixed expansion variants.
#[derive(Debug, Default)]
pub struct MockAssessor {
    pub assess_calls: AtomicUsize,
    pub rerank_calls: AtomicUsize,
    pub expand_calls: AtomicUsize,
    pub assess_failures: FailurePlan,
    pub rerank_failures: FailurePlan,
    pub expand_failures: FailurePlan,
    scores: HashMap<String, f64>,
    default_score: f64,
    rerank_order: Option<Vec<String>>,
    variants: Vec<String>,
}

impl MockAssessor {
    pub fn new() -> Self {
        Self {
            default_score: 0.9,
            ..Self::default()
        }
    }

    /// Relevance score for the chunk whose text is `chunk_text`.
    pub fn with_score(mut self, chunk_text: &str, score: f64) -> Self {
        self.scores.insert(chunk_text.to_string(), score);
        self
    }

    pub fn with_default_score(mut self, score: f64) -> Self {
        self.default_score = score;
        self
    }

    /// Rerank answer. Without one the service echoes the input order.
    pub fn with_rerank_order(mut self, ids: &[&str]) -> Self {
        self.rerank_order = Some(ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_variants(mut self, variants: &[&str]) -> Self {
        self.variants = variants.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn assess_calls(&self) -> usize {
        self.assess_calls.load(Ordering::SeqCst)
    }

    pub fn rerank_calls(&self) -> usize {
        self.rerank_calls.load(Ordering::SeqCst)
    }

    pub fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.assess_calls() + self.rerank_calls() + self.expand_calls()
    }

    fn unavailable(operation: &str) -> LevyError {
        AssessmentError::Unavailable {
            operation: operation.into(),
            reason: "scripted failure".into(),
        }
        .into()
    }
}

impl IAssessmentService for MockAssessor {
    fn assess(
        &self,
        _query: &str,
        chunk_text: &str,
    ) -> impl Future<Output = LevyResult<f64>> + Send {
        self.assess_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.assess_failures.should_fail() {
            Err(Self::unavailable("assess"))
        } else {
            Ok(self
                .scores
                .get(chunk_text)
                .copied()
                .unwrap_or(self.default_score))
        };
        async move { result }
    }

    fn rerank(
        &self,
        _query: &str,
        candidates: &[RetrievalCandidate],
    ) -> impl Future<Output = LevyResult<Vec<String>>> + Send {
        self.rerank_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.rerank_failures.should_fail() {
            Err(Self::unavailable("rerank"))
        } else {
            Ok(self
                .rerank_order
                .clone()
                .unwrap_or_else(|| candidates.iter().map(|c| c.chunk_id.clone()).collect()))
        };
        async move { result }
    }

    fn expand(&self, _query: &str) -> impl Future<Output = LevyResult<Vec<String>>> + Send {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.expand_failures.should_fail() {
            Err(Self::unavailable("expand"))
        } else {
            Ok(self.variants.clone())
        };
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_plan_counts_down() {
        let plan = FailurePlan::default();
        plan.fail_next(2);
        assert!(plan.should_fail());
        assert!(plan.should_fail());
        assert!(!plan.should_fail());
    }

    #[test]
    fn embedding_round_trips_query_text() {
        let v = MockEmbedder::encode("Is SaaS taxable?");
        assert_eq!(MockEmbedder::decode(&v), "is saas taxable?");
    }
}
