//! Literal retrieval: citation codes and salient terms matched against the
//! knowledge store's text index.

use std::collections::HashSet;
use std::sync::LazyLock;

use levy_core::config::RetrievalConfig;
use levy_core::traits::IKnowledgeStore;
use levy_core::{CandidateSource, LevyResult, RetrievalCandidate};
use regex::Regex;
use tracing::debug;

use super::vector::to_candidates;
use crate::ledger::CallKind;
use crate::resilience::ResilientCaller;

/// Prefixed statute references: `RCW 82.04.050`, `WAC 458-20-15502`, `26 USC § 61`.
static PREFIXED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(RCW|WAC|USC|U\.S\.C\.|CFR|IRC)\s*§?\s*(\d+[0-9A-Za-z]*(?:[.\-]\d+[0-9A-Za-z]*)*)",
    )
    .unwrap()
});

/// Section-sign references: `§ 3.1`.
static SECTION_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"§\s*(\d+[0-9A-Za-z]*(?:[.\-]\d+[0-9A-Za-z]*)*)")
        .unwrap()
});

/// Bare dotted or dashed section numbers: `82.04.050`, `458-20-15502`.
static BARE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:[.\-]\d+)+\b").unwrap()
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9&']+").unwrap());

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "his", "how", "its", "may", "who", "did", "get", "does", "this",
    "that", "with", "from", "have", "what", "when", "where", "which", "will", "would", "should",
    "could", "there", "their", "they", "them", "then", "than", "into", "under", "about", "being",
    "been", "were", "also", "only", "other", "some", "such", "these", "those", "each", "more",
    "most", "very", "much", "many", "apply", "applies", "is", "it", "of", "on", "or", "to", "in",
    "a", "an", "be", "by", "as", "at", "if", "we", "my", "me", "do",
];

/// Citation codes found in `text`, normalized to `PREFIX number` or the bare
/// number, in order of appearance and without duplicates.
pub fn extract_citation_codes(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut codes = Vec::new();
    let mut push = |code: String| {
        if seen.insert(code.to_lowercase()) {
            codes.push(code);
        }
    };

    for cap in PREFIXED_CODE.captures_iter(text) {
        let prefix = cap[1].to_uppercase().replace('.', "");
        let number = cap[2].trim_end_matches(['.', '-']);
        push(format!("{prefix} {number}"));
    }
    for cap in SECTION_CODE.captures_iter(text) {
        push(cap[1].trim_end_matches(['.', '-']).to_string());
    }
    for m in BARE_CODE.find_iter(text) {
        push(m.as_str().to_string());
    }
    codes
}

/// Search terms for the keyword index: citation codes first, then salient
/// lowercase words, capped at `max_terms`.
pub fn extract_terms(text: &str, max_terms: usize) -> Vec<String> {
    let mut terms = extract_citation_codes(text);
    let mut seen: HashSet<String> = terms.iter().map(|t| t.to_lowercase()).collect();

    for m in WORD.find_iter(text) {
        let word = m.as_str().to_lowercase();
        if word.len() < 3 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        if seen.insert(word.clone()) {
            terms.push(word);
        }
    }
    terms.truncate(max_terms);
    terms
}

pub struct KeywordRetriever<'a, K> {
    store: &'a K,
    config: &'a RetrievalConfig,
    caller: ResilientCaller<'a>,
}

impl<'a, K: IKnowledgeStore> KeywordRetriever<'a, K> {
    pub fn new(store: &'a K, config: &'a RetrievalConfig, caller: ResilientCaller<'a>) -> Self {
        Self {
            store,
            config,
            caller,
        }
    }

    /// Keyword candidates for `text`. `match_score` is taken as the
    /// candidate's similarity; the vector floor does not apply.
    pub async fn retrieve(&self, text: &str, top_k: usize) -> LevyResult<Vec<RetrievalCandidate>> {
        let terms = extract_terms(text, self.config.keyword_max_terms);
        if terms.is_empty() {
            debug!("no keyword terms extracted, skipping keyword search");
            return Ok(Vec::new());
        }
        let matches = self
            .caller
            .call(CallKind::KeywordSearch, || self.store.keyword_search(&terms))
            .await?;
        let candidates = to_candidates(&matches, 0.0, CandidateSource::Keyword, top_k);
        debug!(
            terms = terms.len(),
            returned = matches.len(),
            kept = candidates.len(),
            "keyword search"
        );
        Ok(candidates)
    }
}
