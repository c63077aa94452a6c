//! Simple and enhanced retrieval paths.
//!
//! Only cancellation escapes as an error. Every other collaborator failure
//! falls back to the output of the last completed stage and is reported
//! through `degraded` and `degradations`.

use std::collections::HashSet;

use levy_core::models::DegradationEvent;
use levy_core::traits::{IAssessmentService, IEmbeddingService, IKnowledgeStore};
use levy_core::{
    CandidateSource, Confidence, LevyConfig, LevyError, LevyResult, Query, RetrievalCandidate,
};
use tracing::{debug, info, instrument, warn};

use crate::embedding_cache::CachedEmbedder;
use crate::expansion::{self, QueryExpander};
use crate::ranking::Reranker;
use crate::resilience::ResilientCaller;
use crate::search::{merge_max, KeywordRetriever, VectorRetriever};
use crate::validation::{self, Partition, RelevanceValidator};

/// Number of top scores averaged into the path confidence.
const CONFIDENCE_TOP_N: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub evidence: Vec<RetrievalCandidate>,
    pub confidence: Confidence,
    pub degraded: bool,
    pub degradations: Vec<DegradationEvent>,
}

impl PipelineOutput {
    /// Nothing usable came back and at least one stage failed.
    fn failed(degradations: Vec<DegradationEvent>) -> Self {
        Self {
            evidence: Vec::new(),
            confidence: Confidence::ZERO,
            degraded: true,
            degradations,
        }
    }
}

pub struct RetrievalPipeline<'a, E, K, A> {
    embedder: &'a CachedEmbedder<E>,
    store: &'a K,
    assessor: &'a A,
    config: &'a LevyConfig,
    caller: ResilientCaller<'a>,
}

impl<'a, E, K, A> RetrievalPipeline<'a, E, K, A>
where
    E: IEmbeddingService,
    K: IKnowledgeStore,
    A: IAssessmentService,
{
    pub fn new(
        embedder: &'a CachedEmbedder<E>,
        store: &'a K,
        assessor: &'a A,
        config: &'a LevyConfig,
        caller: ResilientCaller<'a>,
    ) -> Self {
        Self {
            embedder,
            store,
            assessor,
            config,
            caller,
        }
    }

    fn vector(&self) -> VectorRetriever<'a, E, K> {
        VectorRetriever::new(self.embedder, self.store, &self.config.retrieval, self.caller)
    }

    /// Single-pass vector retrieval with no validation or reranking.
    #[instrument(skip_all, fields(mode = "simple"))]
    pub async fn run_simple(&self, query: &Query) -> LevyResult<PipelineOutput> {
        let top_k = self.config.retrieval.simple_top_k;
        let result = self
            .vector()
            .retrieve(query.text(), top_k, query.category(), CandidateSource::Vector)
            .await;

        match result {
            Ok(evidence) => {
                let confidence = mean_top(&evidence, |c| c.similarity_score);
                debug!(candidates = evidence.len(), confidence, "simple retrieval complete");
                Ok(PipelineOutput {
                    evidence,
                    confidence: Confidence::new(confidence),
                    degraded: false,
                    degradations: Vec::new(),
                })
            }
            Err(LevyError::Cancelled) => Err(LevyError::Cancelled),
            Err(err) => {
                warn!(error = %err, "simple retrieval failed");
                Ok(PipelineOutput::failed(vec![DegradationEvent::now(
                    "vector_retriever",
                    err.to_string(),
                    "empty evidence",
                )]))
            }
        }
    }

    /// Hybrid search, validation, optional corrective expansion, rerank.
    #[instrument(skip_all, fields(mode = "enhanced"))]
    pub async fn run_enhanced(&self, query: &Query) -> LevyResult<PipelineOutput> {
        let cfg = self.config;
        let text = query.text();
        let category = query.category();
        let top_k = cfg.retrieval.enhanced_top_k;
        let mut degradations = Vec::new();

        // Stage 1: vector and keyword retrieval have no data dependency.
        let vector = self.vector();
        let keyword = KeywordRetriever::new(self.store, &cfg.retrieval, self.caller);
        let (vector_result, keyword_result) = tokio::join!(
            vector.retrieve(text, top_k, category, CandidateSource::Vector),
            keyword.retrieve(text, top_k),
        );

        let mut lists = Vec::with_capacity(2);
        let vector_available = match vector_result {
            Ok(candidates) => {
                lists.push(candidates);
                true
            }
            Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
            Err(err) => {
                warn!(error = %err, "vector retrieval failed, continuing keyword-only");
                degradations.push(DegradationEvent::now(
                    "vector_retriever",
                    err.to_string(),
                    "keyword results only",
                ));
                false
            }
        };
        match keyword_result {
            Ok(candidates) => lists.push(candidates),
            Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
            Err(err) => {
                warn!(error = %err, "keyword retrieval failed, continuing vector-only");
                degradations.push(DegradationEvent::now(
                    "keyword_retriever",
                    err.to_string(),
                    "vector results only",
                ));
            }
        }
        if lists.is_empty() {
            warn!("vector and keyword retrieval both failed");
            return Ok(PipelineOutput::failed(degradations));
        }

        // Stage 2: hybrid merge.
        let merged = merge_max(lists);
        if merged.is_empty() {
            info!("no candidates cleared the similarity floor");
            return Ok(self.finish(Vec::new(), 0.0, degradations));
        }

        // Stage 3: relevance validation.
        let validator = RelevanceValidator::new(self.assessor, &cfg.validation, self.caller);
        let mut partition = match validator.validate(text, merged.clone()).await {
            Ok(partition) => partition,
            Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
            Err(err) => {
                warn!(error = %err, "validation failed, returning unvalidated hybrid results");
                degradations.push(DegradationEvent::now(
                    validation::COMPONENT,
                    err.to_string(),
                    "unvalidated hybrid results",
                ));
                let mut evidence = merged;
                evidence.truncate(cfg.retrieval.final_k);
                let confidence = mean_top(&evidence, |c| c.similarity_score);
                return Ok(self.finish(evidence, confidence, degradations));
            }
        };

        // Stage 4: single corrective re-query.
        if partition.needs_correction(cfg.validation.min_accepted) {
            if vector_available {
                let expander =
                    QueryExpander::new(self.assessor, &vector, &cfg.expansion, self.caller);
                self.correct(
                    text,
                    category,
                    &expander,
                    &validator,
                    &mut partition,
                    &mut degradations,
                )
                .await?;
            } else {
                if !partition.borderline.is_empty() {
                    degradations.push(DegradationEvent::now(
                        expansion::COMPONENT,
                        "vector retrieval unavailable for re-query",
                        "borderline candidates accepted unverified",
                    ));
                }
                partition.promote_borderline();
            }
        }

        // Stage 5: rerank.
        let reranker = Reranker::new(self.assessor, &cfg.rerank, self.caller);
        let (evidence, rerank_event) = reranker
            .rerank(text, std::mem::take(&mut partition.accepted), cfg.retrieval.final_k)
            .await?;
        degradations.extend(rerank_event);

        let confidence = mean_top(&evidence, |c| c.validation_score.unwrap_or(0.0))
            * coverage(evidence.len(), cfg.validation.min_accepted);
        Ok(self.finish(evidence, confidence, degradations))
    }

    /// Expand, validate new candidates, settle borderline ones.
    async fn correct(
        &self,
        text: &str,
        category: Option<&str>,
        expander: &QueryExpander<'_, E, K, A>,
        validator: &RelevanceValidator<'_, A>,
        partition: &mut Partition,
        degradations: &mut Vec<DegradationEvent>,
    ) -> LevyResult<()> {
        let top_k = self.config.retrieval.enhanced_top_k;
        let expansion = match expander.expand_and_retrieve(text, top_k, category).await {
            Ok(expansion) => expansion,
            Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
            Err(err) => {
                warn!(error = %err, "query expansion failed");
                degradations.push(DegradationEvent::now(
                    expansion::COMPONENT,
                    err.to_string(),
                    "borderline candidates accepted unverified",
                ));
                partition.promote_borderline();
                return Ok(());
            }
        };
        degradations.extend(expansion.degradations);
        if expansion.all_failed {
            partition.promote_borderline();
            return Ok(());
        }

        // Only candidates that were borderline before the re-query can be
        // rescued by it; fresh borderline candidates get no second chance.
        let corroborated: HashSet<String> = expansion
            .candidates
            .iter()
            .map(|c| c.chunk_id.clone())
            .filter(|id| partition.borderline.iter().any(|b| &b.chunk_id == id))
            .collect();

        let fresh: Vec<RetrievalCandidate> = expansion
            .candidates
            .into_iter()
            .filter(|c| !partition.contains(&c.chunk_id))
            .collect();
        if !fresh.is_empty() {
            match validator.score(text, fresh).await {
                Ok(scored) => partition.absorb(scored, validator.config()),
                Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
                Err(err) => {
                    warn!(error = %err, "validation of expansion candidates failed");
                    degradations.push(DegradationEvent::now(
                        validation::COMPONENT,
                        err.to_string(),
                        "expansion candidates discarded",
                    ));
                }
            }
        }

        debug!(
            corroborated = corroborated.len(),
            borderline = partition.borderline.len(),
            "resolving borderline candidates"
        );
        partition.resolve_borderline(&corroborated);
        Ok(())
    }

    fn finish(
        &self,
        evidence: Vec<RetrievalCandidate>,
        confidence: f64,
        degradations: Vec<DegradationEvent>,
    ) -> PipelineOutput {
        let degraded = !degradations.is_empty();
        let confidence = if evidence.is_empty() {
            0.0
        } else if degraded {
            confidence * self.config.validation.degraded_confidence_factor
        } else {
            confidence
        };
        debug!(
            evidence = evidence.len(),
            confidence,
            degraded,
            "enhanced retrieval complete"
        );
        PipelineOutput {
            evidence,
            confidence: Confidence::new(confidence),
            degraded,
            degradations,
        }
    }
}

/// Mean of the `CONFIDENCE_TOP_N` highest values of `key`, or 0 when empty.
fn mean_top(candidates: &[RetrievalCandidate], key: impl Fn(&RetrievalCandidate) -> f64) -> f64 {
    let mut scores: Vec<f64> = candidates.iter().map(key).collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(CONFIDENCE_TOP_N);
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Penalty for returning fewer than `min_accepted` pieces of evidence.
fn coverage(count: usize, min_accepted: usize) -> f64 {
    if min_accepted == 0 {
        return 1.0;
    }
    0.5 + 0.5 * (count as f64 / min_accepted as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn cand(id: &str, sim: f64, val: Option<f64>) -> RetrievalCandidate {
        RetrievalCandidate {
            chunk_id: id.into(),
            citation: "RCW 82.04.050".into(),
            section_id: "s".into(),
            text: id.into(),
            similarity_score: sim,
            validation_score: val,
            rerank_score: None,
            source: CandidateSource::Vector,
            contributing_sources: BTreeSet::from([CandidateSource::Vector]),
        }
    }

    #[test]
    fn mean_top_uses_highest_three() {
        let c = vec![
            cand("a", 0.9, None),
            cand("b", 0.6, None),
            cand("c", 0.8, None),
            cand("d", 0.7, None),
        ];
        let mean = mean_top(&c, |c| c.similarity_score);
        assert!((mean - 0.8).abs() < 1e-9);
        assert_eq!(mean_top(&[], |c| c.similarity_score), 0.0);
    }

    #[test]
    fn coverage_penalizes_thin_evidence() {
        assert_eq!(coverage(3, 3), 1.0);
        assert_eq!(coverage(5, 3), 1.0);
        assert!((coverage(1, 3) - (0.5 + 0.5 / 3.0)).abs() < 1e-9);
        assert_eq!(coverage(0, 0), 1.0);
    }
}
