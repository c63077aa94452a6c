//! Dense retrieval: embed the query, search the knowledge store, keep
//! cited chunks above the similarity floor.

use std::collections::HashSet;
use std::sync::Arc;

use levy_core::config::RetrievalConfig;
use levy_core::models::{sort_candidates_by, ChunkMatch};
use levy_core::traits::{IEmbeddingService, IKnowledgeStore};
use levy_core::{CandidateSource, LevyResult, RetrievalCandidate};
use tracing::{debug, warn};

use crate::embedding_cache::CachedEmbedder;
use crate::ledger::CallKind;
use crate::resilience::ResilientCaller;

pub struct VectorRetriever<'a, E, K> {
    embedder: &'a CachedEmbedder<E>,
    store: &'a K,
    config: &'a RetrievalConfig,
    caller: ResilientCaller<'a>,
}

impl<'a, E, K> VectorRetriever<'a, E, K>
where
    E: IEmbeddingService,
    K: IKnowledgeStore,
{
    pub fn new(
        embedder: &'a CachedEmbedder<E>,
        store: &'a K,
        config: &'a RetrievalConfig,
        caller: ResilientCaller<'a>,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
            caller,
        }
    }

    /// Embed `text`, consulting the embedding cache before the service.
    pub async fn embed_query(&self, text: &str) -> LevyResult<Arc<Vec<f32>>> {
        self.caller.check_cancelled()?;
        if let Some(hit) = self.embedder.lookup(text) {
            return Ok(hit);
        }
        self.caller
            .call(CallKind::Embed, || self.embedder.embed_uncached(text))
            .await
    }

    /// Search with a precomputed embedding.
    pub async fn search_embedding(
        &self,
        embedding: &[f32],
        top_k: usize,
        category: Option<&str>,
        source: CandidateSource,
    ) -> LevyResult<Vec<RetrievalCandidate>> {
        let matches = self
            .caller
            .call(CallKind::VectorSearch, || {
                self.store.vector_search(embedding, top_k, category)
            })
            .await?;
        let candidates = to_candidates(&matches, self.config.similarity_floor, source, top_k);
        debug!(
            returned = matches.len(),
            kept = candidates.len(),
            ?source,
            "vector search"
        );
        Ok(candidates)
    }

    /// Embed then search.
    pub async fn retrieve(
        &self,
        text: &str,
        top_k: usize,
        category: Option<&str>,
        source: CandidateSource,
    ) -> LevyResult<Vec<RetrievalCandidate>> {
        let embedding = self.embed_query(text).await?;
        self.search_embedding(&embedding, top_k, category, source)
            .await
    }
}

/// Floor-filter, drop uncited chunks, dedupe by id, sort, truncate.
pub(crate) fn to_candidates(
    matches: &[ChunkMatch],
    floor: f64,
    source: CandidateSource,
    top_k: usize,
) -> Vec<RetrievalCandidate> {
    let mut seen = HashSet::new();
    let mut out: Vec<RetrievalCandidate> = Vec::with_capacity(matches.len());
    for m in matches {
        if !m.chunk.has_citation() {
            warn!(chunk_id = %m.chunk.id, "dropping chunk without citation");
            continue;
        }
        if m.score < floor || !m.score.is_finite() {
            continue;
        }
        if !seen.insert(m.chunk.id.as_str()) {
            continue;
        }
        out.push(RetrievalCandidate::from_match(m, source));
    }
    sort_candidates_by(&mut out, |c| c.similarity_score);
    out.truncate(top_k);
    out
}

#[cfg(test)]
mod tests {
    use levy_core::KnowledgeChunk;

    use super::*;

    fn m(id: &str, citation: &str, score: f64) -> ChunkMatch {
        ChunkMatch {
            chunk: KnowledgeChunk {
                id: id.into(),
                text: format!("text of {id}"),
                citation: citation.into(),
                section_id: "s".into(),
                category_tags: vec![],
                embedding: vec![],
            },
            score,
        }
    }

    #[test]
    fn applies_floor_and_citation_filter() {
        let matches = vec![
            m("a", "RCW 82.04.050", 0.9),
            m("b", "", 0.95),
            m("c", "WAC 458-20-15502", 0.4),
            m("d", "WAC 458-20-15503", 0.6),
        ];
        let out = to_candidates(&matches, 0.5, CandidateSource::Vector, 10);
        let ids: Vec<_> = out.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn dedupes_and_orders_deterministically() {
        let matches = vec![
            m("b", "x", 0.8),
            m("a", "x", 0.8),
            m("a", "x", 0.7),
            m("c", "x", 0.9),
        ];
        let out = to_candidates(&matches, 0.0, CandidateSource::Vector, 10);
        let ids: Vec<_> = out.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn truncates_to_top_k() {
        let matches: Vec<_> = (0..10)
            .map(|i| m(&format!("c{i}"), "x", 0.5 + i as f64 / 100.0))
            .collect();
        let out = to_candidates(&matches, 0.0, CandidateSource::Vector, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].chunk_id, "c9");
    }
}
