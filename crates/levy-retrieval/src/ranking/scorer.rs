//! Composite relevance score (3 factors).
//!
//! Factors: similarity, validation, citation specificity.

use levy_core::config::RerankConfig;
use levy_core::RetrievalCandidate;

/// Bonus when the candidate's citation is exactly a code named in the query.
pub const EXACT_CITATION_BONUS: f64 = 1.0;
/// Bonus when the citation and a query code share a section prefix.
pub const PARTIAL_CITATION_BONUS: f64 = 0.5;

/// Citation-specificity bonus in [0, 1] for `citation` against the codes
/// extracted from the query.
pub fn citation_bonus(citation: &str, query_codes: &[String]) -> f64 {
    let citation = normalize(citation);
    if citation.is_empty() || query_codes.is_empty() {
        return 0.0;
    }
    let number = section_number(&citation);

    let mut best = 0.0_f64;
    for code in query_codes {
        let code = normalize(code);
        let code_number = section_number(&code);
        if code == citation || code == number {
            return EXACT_CITATION_BONUS;
        }
        if is_section_prefix(code_number, number) || is_section_prefix(number, code_number) {
            best = best.max(PARTIAL_CITATION_BONUS);
        }
    }
    best
}

/// Weighted composite in [0, 1]. Missing validation counts as 0.
pub fn composite(candidate: &RetrievalCandidate, bonus: f64, weights: &RerankConfig) -> f64 {
    let total = weights.similarity_weight + weights.validation_weight + weights.citation_weight;
    if total <= 0.0 {
        return candidate.similarity_score;
    }
    let raw = weights.similarity_weight * candidate.similarity_score
        + weights.validation_weight * candidate.validation_score.unwrap_or(0.0)
        + weights.citation_weight * bonus;
    (raw / total).clamp(0.0, 1.0)
}

fn normalize(s: &str) -> String {
    s.replace('§', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn section_number(normalized: &str) -> &str {
    normalized.rsplit(' ').next().unwrap_or(normalized)
}

/// `prefix` names an enclosing section of `full` (e.g. `82.04` of `82.04.050`).
fn is_section_prefix(prefix: &str, full: &str) -> bool {
    prefix.len() < full.len()
        && full.starts_with(prefix)
        && full[prefix.len()..].starts_with(['.', '-'])
        && prefix.chars().any(|c| c.is_ascii_digit())
}
