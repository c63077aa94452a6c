//! Final ordering of accepted candidates.
//!
//! The local composite score is blended with the position the assessment
//! service assigns. Ids the service invents are ignored, so the output is
//! always a permutation of (a prefix of) the input.

use std::collections::{HashMap, HashSet};

use levy_core::config::RerankConfig;
use levy_core::models::{sort_candidates_by, DegradationEvent};
use levy_core::traits::IAssessmentService;
use levy_core::{LevyError, LevyResult, RetrievalCandidate};
use tracing::{debug, warn};

use super::scorer::{citation_bonus, composite};
use crate::ledger::CallKind;
use crate::resilience::ResilientCaller;
use crate::search::extract_citation_codes;

pub const COMPONENT: &str = "reranker";

/// Score, sort, and truncate `candidates`.
///
/// `service_order` is the assessment service's ranking, best first. When it
/// is `None` only the local composite is used.
pub fn order_candidates(
    mut candidates: Vec<RetrievalCandidate>,
    query_codes: &[String],
    service_order: Option<&[String]>,
    weights: &RerankConfig,
    final_k: usize,
) -> Vec<RetrievalCandidate> {
    let positions = service_order.map(|order| service_positions(order, &candidates));
    let blend = weights.service_blend.clamp(0.0, 1.0);

    for candidate in &mut candidates {
        let bonus = citation_bonus(&candidate.citation, query_codes);
        let local = composite(candidate, bonus, weights);
        let score = match &positions {
            Some(positions) => {
                let position = positions.get(candidate.chunk_id.as_str()).copied().unwrap_or(0.0);
                (1.0 - blend) * local + blend * position
            }
            None => local,
        };
        candidate.rerank_score = Some(score);
    }

    sort_candidates_by(&mut candidates, |c| c.rerank_score.unwrap_or(0.0));
    candidates.truncate(final_k);
    candidates
}

/// Position score in (0, 1] for each input id the service ranked; first is 1.
fn service_positions(
    order: &[String],
    candidates: &[RetrievalCandidate],
) -> HashMap<String, f64> {
    let known: HashSet<&str> = candidates.iter().map(|c| c.chunk_id.as_str()).collect();
    let mut seen = HashSet::new();
    let ranked: Vec<&str> = order
        .iter()
        .map(String::as_str)
        .filter(|id| known.contains(id) && seen.insert(*id))
        .collect();

    let n = ranked.len() as f64;
    ranked
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), 1.0 - i as f64 / n))
        .collect()
}

pub struct Reranker<'a, A> {
    assessor: &'a A,
    config: &'a RerankConfig,
    caller: ResilientCaller<'a>,
}

impl<'a, A: IAssessmentService> Reranker<'a, A> {
    pub fn new(assessor: &'a A, config: &'a RerankConfig, caller: ResilientCaller<'a>) -> Self {
        Self {
            assessor,
            config,
            caller,
        }
    }

    /// Rerank `candidates` and keep the best `final_k`.
    ///
    /// If the service ranking fails the local composite alone decides the
    /// order and a degradation is returned.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievalCandidate>,
        final_k: usize,
    ) -> LevyResult<(Vec<RetrievalCandidate>, Option<DegradationEvent>)> {
        if candidates.is_empty() {
            return Ok((candidates, None));
        }
        let codes = extract_citation_codes(query);

        let service = self
            .caller
            .call(CallKind::Rerank, || self.assessor.rerank(query, &candidates))
            .await;

        match service {
            Ok(order) => {
                let ranked =
                    order_candidates(candidates, &codes, Some(&order), self.config, final_k);
                debug!(kept = ranked.len(), "reranked with service order");
                Ok((ranked, None))
            }
            Err(LevyError::Cancelled) => Err(LevyError::Cancelled),
            Err(err) => {
                warn!(error = %err, "rerank service failed, using local composite");
                let ranked = order_candidates(candidates, &codes, None, self.config, final_k);
                let event =
                    DegradationEvent::now(COMPONENT, err.to_string(), "local composite score");
                Ok((ranked, Some(event)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use levy_core::CandidateSource;

    use super::*;

    fn cand(id: &str, sim: f64, val: f64, citation: &str) -> RetrievalCandidate {
        RetrievalCandidate {
            chunk_id: id.into(),
            citation: citation.into(),
            section_id: "s".into(),
            text: id.into(),
            similarity_score: sim,
            validation_score: Some(val),
            rerank_score: None,
            source: CandidateSource::Vector,
            contributing_sources: BTreeSet::from([CandidateSource::Vector]),
        }
    }

    #[test]
    fn exact_citation_lifts_candidate() {
        let input = vec![
            cand("generic", 0.8, 0.8, "WAC 458-20-101"),
            cand("specific", 0.8, 0.8, "RCW 82.04.050"),
        ];
        let codes = extract_citation_codes("does RCW 82.04.050 apply");
        let out = order_candidates(input, &codes, None, &RerankConfig::default(), 5);
        assert_eq!(out[0].chunk_id, "specific");
    }

    #[test]
    fn unknown_service_ids_are_ignored() {
        let input = vec![cand("a", 0.7, 0.8, "x"), cand("b", 0.7, 0.8, "y")];
        let order = vec!["ghost".to_string(), "b".to_string(), "a".to_string()];
        let out = order_candidates(input, &[], Some(&order), &RerankConfig::default(), 5);
        let ids: Vec<_> = out.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn truncates_and_sets_scores() {
        let input: Vec<_> = (0..8)
            .map(|i| cand(&format!("c{i}"), 0.5 + i as f64 * 0.05, 0.8, "x"))
            .collect();
        let out = order_candidates(input, &[], None, &RerankConfig::default(), 5);
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|c| c.rerank_score.is_some()));
        assert_eq!(out[0].chunk_id, "c7");
    }

    #[test]
    fn service_order_breaks_local_ties() {
        let input = vec![cand("a", 0.8, 0.8, "x"), cand("b", 0.8, 0.8, "x")];
        let order = vec!["b".to_string(), "a".to_string()];
        let out = order_candidates(input, &[], Some(&order), &RerankConfig::default(), 5);
        assert_eq!(out[0].chunk_id, "b");
    }
}
