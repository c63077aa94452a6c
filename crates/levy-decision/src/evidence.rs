//! Evidence synthesized from a structured rule instead of retrieval.

use std::collections::BTreeSet;

use levy_core::constants::RULE_CHUNK_PREFIX;
use levy_core::models::normalize_category;
use levy_core::{CandidateSource, RetrievalCandidate, StructuredRule};

/// One candidate per rule citation, in the rule's citation order.
///
/// Each candidate's text is the rule's determination; exemptions whose
/// citation matches are appended to that candidate's text.
pub fn from_rule(rule: &StructuredRule) -> Vec<RetrievalCandidate> {
    let category = normalize_category(&rule.category_key);
    let summary = rule.summary();
    rule.citations
        .iter()
        .enumerate()
        .map(|(i, citation)| {
            let mut text = summary.clone();
            for exemption in rule
                .exemptions
                .iter()
                .filter(|e| e.citation.as_deref() == Some(citation.as_str()))
            {
                text.push_str(&format!("\n{}: {}", exemption.name, exemption.description));
            }
            RetrievalCandidate {
                chunk_id: format!("{RULE_CHUNK_PREFIX}:{category}:{i}"),
                citation: citation.clone(),
                section_id: citation.clone(),
                text,
                similarity_score: rule.confidence_weight,
                validation_score: None,
                rerank_score: None,
                source: CandidateSource::Rule,
                contributing_sources: BTreeSet::from([CandidateSource::Rule]),
            }
        })
        .collect()
}
