//! Relevance Validator: the corrective step of enhanced retrieval.
//!
//! Every candidate gets a `validation_score` from the assessment service and
//! lands in one of three bands. Borderline candidates wait for the single
//! corrective re-query before they are accepted or dropped.

use std::collections::HashSet;

use futures::future::join_all;
use levy_core::config::ValidationConfig;
use levy_core::errors::AssessmentError;
use levy_core::models::sort_candidates_by;
use levy_core::traits::IAssessmentService;
use levy_core::{LevyError, LevyResult, RetrievalCandidate};
use tracing::debug;

use crate::ledger::CallKind;
use crate::resilience::ResilientCaller;

pub const COMPONENT: &str = "relevance_validator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Above `accept_above`.
    Accept,
    /// Between the thresholds, inclusive.
    Borderline,
    /// Below `reject_below`; discarded for the rest of the call.
    Reject,
}

impl Band {
    pub fn of(score: f64, config: &ValidationConfig) -> Self {
        if score > config.accept_above {
            Self::Accept
        } else if score < config.reject_below {
            Self::Reject
        } else {
            Self::Borderline
        }
    }
}

/// Validated candidates split by band.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub accepted: Vec<RetrievalCandidate>,
    pub borderline: Vec<RetrievalCandidate>,
    pub rejected_ids: HashSet<String>,
}

impl Partition {
    pub fn split(scored: Vec<RetrievalCandidate>, config: &ValidationConfig) -> Self {
        let mut partition = Self::default();
        partition.absorb(scored, config);
        partition
    }

    /// Add newly scored candidates. Ids already rejected stay rejected and
    /// ids already present are ignored.
    pub fn absorb(&mut self, scored: Vec<RetrievalCandidate>, config: &ValidationConfig) {
        for candidate in scored {
            if self.contains(&candidate.chunk_id) {
                continue;
            }
            let score = candidate.validation_score.unwrap_or(0.0);
            match Band::of(score, config) {
                Band::Accept => self.accepted.push(candidate),
                Band::Borderline => self.borderline.push(candidate),
                Band::Reject => {
                    self.rejected_ids.insert(candidate.chunk_id);
                }
            }
        }
        sort_candidates_by(&mut self.accepted, validation_key);
        sort_candidates_by(&mut self.borderline, validation_key);
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.rejected_ids.contains(chunk_id)
            || self.accepted.iter().any(|c| c.chunk_id == chunk_id)
            || self.borderline.iter().any(|c| c.chunk_id == chunk_id)
    }

    /// Settle borderline candidates after the corrective re-query: those in
    /// `corroborated` are accepted, the rest are rejected.
    pub fn resolve_borderline(&mut self, corroborated: &HashSet<String>) {
        for candidate in std::mem::take(&mut self.borderline) {
            if corroborated.contains(&candidate.chunk_id) {
                self.accepted.push(candidate);
            } else {
                self.rejected_ids.insert(candidate.chunk_id);
            }
        }
        sort_candidates_by(&mut self.accepted, validation_key);
    }

    /// Accept every borderline candidate without corroboration.
    pub fn promote_borderline(&mut self) {
        self.accepted.append(&mut self.borderline);
        sort_candidates_by(&mut self.accepted, validation_key);
    }

    pub fn needs_correction(&self, min_accepted: usize) -> bool {
        self.accepted.len() < min_accepted || !self.borderline.is_empty()
    }
}

fn validation_key(c: &RetrievalCandidate) -> f64 {
    c.validation_score.unwrap_or(0.0)
}

pub struct RelevanceValidator<'a, A> {
    assessor: &'a A,
    config: &'a ValidationConfig,
    caller: ResilientCaller<'a>,
}

impl<'a, A: IAssessmentService> RelevanceValidator<'a, A> {
    pub fn new(assessor: &'a A, config: &'a ValidationConfig, caller: ResilientCaller<'a>) -> Self {
        Self {
            assessor,
            config,
            caller,
        }
    }

    /// Assign `validation_score` to every candidate that lacks one.
    ///
    /// Assessments run concurrently. The stage fails as a whole if any
    /// assessment fails or returns a score outside [0, 1].
    pub async fn score(
        &self,
        query: &str,
        mut candidates: Vec<RetrievalCandidate>,
    ) -> LevyResult<Vec<RetrievalCandidate>> {
        let pending: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.validation_score.is_none())
            .map(|(i, _)| i)
            .collect();

        let scores = join_all(pending.iter().map(|&i| {
            let text = candidates[i].text.as_str();
            self.caller
                .call(CallKind::Assess, move || self.assessor.assess(query, text))
        }))
        .await;

        let mut first_error: Option<LevyError> = None;
        let mut assigned = Vec::with_capacity(pending.len());
        for (&i, result) in pending.iter().zip(scores) {
            match result.and_then(checked_score) {
                Ok(score) => assigned.push((i, score)),
                Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        for (i, score) in assigned {
            candidates[i].validation_score = Some(score);
        }
        Ok(candidates)
    }

    /// Score and partition in one step.
    pub async fn validate(
        &self,
        query: &str,
        candidates: Vec<RetrievalCandidate>,
    ) -> LevyResult<Partition> {
        let scored = self.score(query, candidates).await?;
        let partition = Partition::split(scored, self.config);
        debug!(
            accepted = partition.accepted.len(),
            borderline = partition.borderline.len(),
            rejected = partition.rejected_ids.len(),
            "validation partition"
        );
        Ok(partition)
    }

    pub fn config(&self) -> &ValidationConfig {
        self.config
    }
}

fn checked_score(score: f64) -> LevyResult<f64> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(AssessmentError::InvalidScore { score }.into())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use levy_core::CandidateSource;

    use super::*;

    fn scored(id: &str, validation: f64) -> RetrievalCandidate {
        RetrievalCandidate {
            chunk_id: id.into(),
            citation: "RCW 82.04.050".into(),
            section_id: "s".into(),
            text: id.into(),
            similarity_score: 0.8,
            validation_score: Some(validation),
            rerank_score: None,
            source: CandidateSource::Vector,
            contributing_sources: BTreeSet::from([CandidateSource::Vector]),
        }
    }

    #[test]
    fn band_edges() {
        let cfg = ValidationConfig::default();
        assert_eq!(Band::of(0.71, &cfg), Band::Accept);
        assert_eq!(Band::of(0.7, &cfg), Band::Borderline);
        assert_eq!(Band::of(0.4, &cfg), Band::Borderline);
        assert_eq!(Band::of(0.39, &cfg), Band::Reject);
    }

    #[test]
    fn split_sorts_accepted_by_validation() {
        let cfg = ValidationConfig::default();
        let p = Partition::split(
            vec![scored("a", 0.75), scored("b", 0.9), scored("c", 0.5), scored("d", 0.1)],
            &cfg,
        );
        let ids: Vec<_> = p.accepted.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(p.borderline.len(), 1);
        assert!(p.rejected_ids.contains("d"));
        assert!(p.needs_correction(3));
    }

    #[test]
    fn rejected_ids_are_never_readmitted() {
        let cfg = ValidationConfig::default();
        let mut p = Partition::split(vec![scored("a", 0.1)], &cfg);
        p.absorb(vec![scored("a", 0.95)], &cfg);
        assert!(p.accepted.is_empty());
    }

    #[test]
    fn resolve_accepts_only_corroborated() {
        let cfg = ValidationConfig::default();
        let mut p = Partition::split(vec![scored("a", 0.5), scored("b", 0.6)], &cfg);
        p.resolve_borderline(&HashSet::from(["b".to_string()]));
        assert_eq!(p.accepted.len(), 1);
        assert_eq!(p.accepted[0].chunk_id, "b");
        assert!(p.rejected_ids.contains("a"));
        assert!(p.borderline.is_empty());
    }

    #[test]
    fn promote_moves_all_borderline() {
        let cfg = ValidationConfig::default();
        let mut p = Partition::split(vec![scored("a", 0.5), scored("b", 0.9)], &cfg);
        p.promote_borderline();
        assert_eq!(p.accepted.len(), 2);
        assert_eq!(p.accepted[0].chunk_id, "b");
    }

    #[test]
    fn out_of_range_scores_are_errors() {
        assert!(checked_score(1.2).is_err());
        assert!(checked_score(f64::NAN).is_err());
        assert_eq!(checked_score(0.0).unwrap(), 0.0);
    }
}
