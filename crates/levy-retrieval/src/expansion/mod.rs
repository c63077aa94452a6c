//! Query Expander: alternate phrasings, each run through the Vector
//! Retriever, merged highest-score-wins.

pub mod synonym_expander;

use std::collections::HashSet;

use futures::future::join_all;
use levy_core::config::ExpansionConfig;
use levy_core::models::DegradationEvent;
use levy_core::traits::{IAssessmentService, IEmbeddingService, IKnowledgeStore};
use levy_core::{CandidateSource, LevyError, LevyResult, RetrievalCandidate};
use tracing::{debug, warn};

use crate::ledger::CallKind;
use crate::resilience::ResilientCaller;
use crate::search::{merge_max, VectorRetriever};

pub const COMPONENT: &str = "query_expander";

/// Result of one corrective re-query.
#[derive(Debug, Default)]
pub struct Expansion {
    pub variants: Vec<String>,
    /// Union of every variant's candidates, one entry per `chunk_id`.
    pub candidates: Vec<RetrievalCandidate>,
    pub degradations: Vec<DegradationEvent>,
    /// No variant retrieval completed, so nothing was re-queried.
    pub all_failed: bool,
}

impl Expansion {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

pub struct QueryExpander<'a, E, K, A> {
    assessor: &'a A,
    vector: &'a VectorRetriever<'a, E, K>,
    config: &'a ExpansionConfig,
    caller: ResilientCaller<'a>,
}

impl<'a, E, K, A> QueryExpander<'a, E, K, A>
where
    E: IEmbeddingService,
    K: IKnowledgeStore,
    A: IAssessmentService,
{
    pub fn new(
        assessor: &'a A,
        vector: &'a VectorRetriever<'a, E, K>,
        config: &'a ExpansionConfig,
        caller: ResilientCaller<'a>,
    ) -> Self {
        Self {
            assessor,
            vector,
            config,
            caller,
        }
    }

    /// Between `min_variants` and `max_variants` phrasings of `query`.
    ///
    /// Service variants are preferred. The local synonym table fills the
    /// list when the service fails or returns too few usable variants, and
    /// that substitution is reported as a degradation.
    pub async fn variants(
        &self,
        query: &str,
    ) -> LevyResult<(Vec<String>, Option<DegradationEvent>)> {
        let requested = self
            .caller
            .call(CallKind::Expand, || self.assessor.expand(query))
            .await;

        let (mut variants, failure) = match requested {
            Ok(raw) => {
                let cleaned = clean_variants(query, raw, self.config.max_variants);
                let failure = (cleaned.len() < self.config.min_variants).then(|| {
                    format!(
                        "service returned {} usable variants, need {}",
                        cleaned.len(),
                        self.config.min_variants
                    )
                });
                (cleaned, failure)
            }
            Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
            Err(err) => {
                warn!(error = %err, "expansion service failed, using local synonyms");
                (Vec::new(), Some(err.to_string()))
            }
        };

        let Some(failure) = failure else {
            return Ok((variants, None));
        };

        let target = self.config.min_variants.max(1);
        let local = synonym_expander::local_variants(query, self.config.max_variants);
        let mut seen: HashSet<String> = variants.iter().map(|v| v.to_lowercase()).collect();
        for variant in local {
            if variants.len() >= target {
                break;
            }
            if seen.insert(variant.to_lowercase()) {
                variants.push(variant);
            }
        }
        let event = DegradationEvent::now(COMPONENT, failure, "local synonym expansion");
        Ok((variants, Some(event)))
    }

    /// Generate variants and run the Vector Retriever for each concurrently.
    ///
    /// A variant whose retrieval fails is skipped; the rest still merge.
    pub async fn expand_and_retrieve(
        &self,
        query: &str,
        top_k: usize,
        category: Option<&str>,
    ) -> LevyResult<Expansion> {
        let (variants, degradation) = self.variants(query).await?;
        let mut expansion = Expansion {
            degradations: degradation.into_iter().collect(),
            ..Expansion::default()
        };
        if variants.is_empty() {
            expansion.all_failed = true;
            if expansion.degradations.is_empty() {
                expansion.degradations.push(DegradationEvent::now(
                    COMPONENT,
                    "no expansion variants",
                    "pre-expansion candidates",
                ));
            }
            return Ok(expansion);
        }

        let results = join_all(variants.iter().map(|variant| {
            self.vector
                .retrieve(variant, top_k, category, CandidateSource::Expanded)
        }))
        .await;

        let mut lists = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for (variant, result) in variants.iter().zip(results) {
            match result {
                Ok(candidates) => lists.push(candidates),
                Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
                Err(err) => {
                    failed += 1;
                    warn!(variant = %variant, error = %err, "variant retrieval failed");
                }
            }
        }
        if failed == variants.len() {
            expansion.all_failed = true;
            expansion.degradations.push(DegradationEvent::now(
                COMPONENT,
                "every variant retrieval failed",
                "pre-expansion candidates",
            ));
        }

        expansion.candidates = merge_max(lists);
        debug!(
            variants = variants.len(),
            failed,
            candidates = expansion.candidates.len(),
            "expansion merged"
        );
        expansion.variants = variants;
        Ok(expansion)
    }
}

/// Trim, drop blanks and copies of the original, dedupe case-insensitively,
/// cap at `max`.
pub fn clean_variants(original: &str, raw: Vec<String>, max: usize) -> Vec<String> {
    let original = original.trim().to_lowercase();
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v.to_lowercase() != original)
        .filter(|v| seen.insert(v.to_lowercase()))
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_drops_original_blanks_and_duplicates() {
        let raw = vec![
            "Is SaaS taxable?".to_string(),
            "  ".to_string(),
            "software as a service taxability".to_string(),
            "Software as a Service taxability".to_string(),
            "digital automated service tax".to_string(),
        ];
        let cleaned = clean_variants("is saas taxable?", raw, 4);
        assert_eq!(
            cleaned,
            vec![
                "software as a service taxability".to_string(),
                "digital automated service tax".to_string()
            ]
        );
    }

    #[test]
    fn clean_caps_at_max() {
        let raw = (0..10).map(|i| format!("variant {i}")).collect();
        assert_eq!(clean_variants("q", raw, 4).len(), 4);
    }
}
