//! Max-score merge of candidate lists from different retrieval strategies.

use std::collections::HashMap;

use levy_core::models::sort_candidates_by;
use levy_core::RetrievalCandidate;

/// Merge candidate lists, keeping each `chunk_id` exactly once.
///
/// The surviving entry carries the maximum `similarity_score` seen for that
/// id and the `source` that produced it; `contributing_sources` is the union
/// across every list. Validation scores, when present, are carried over from
/// whichever entry had one. Output is sorted by score, ties by `chunk_id`.
pub fn merge_max<I>(lists: I) -> Vec<RetrievalCandidate>
where
    I: IntoIterator<Item = Vec<RetrievalCandidate>>,
{
    let mut by_id: HashMap<String, RetrievalCandidate> = HashMap::new();

    for list in lists {
        for candidate in list {
            match by_id.get_mut(&candidate.chunk_id) {
                None => {
                    by_id.insert(candidate.chunk_id.clone(), candidate);
                }
                Some(existing) => absorb(existing, candidate),
            }
        }
    }

    let mut merged: Vec<RetrievalCandidate> = by_id.into_values().collect();
    sort_candidates_by(&mut merged, |c| c.similarity_score);
    merged
}

fn absorb(existing: &mut RetrievalCandidate, incoming: RetrievalCandidate) {
    let mut sources = std::mem::take(&mut existing.contributing_sources);
    sources.extend(incoming.contributing_sources.iter().copied());
    let validation = existing.validation_score.or(incoming.validation_score);

    if incoming.similarity_score > existing.similarity_score {
        *existing = incoming;
    }
    existing.contributing_sources = sources;
    existing.validation_score = validation;
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use levy_core::CandidateSource;

    use super::*;

    fn cand(id: &str, score: f64, source: CandidateSource) -> RetrievalCandidate {
        RetrievalCandidate {
            chunk_id: id.into(),
            citation: format!("cite-{id}"),
            section_id: "s".into(),
            text: id.into(),
            similarity_score: score,
            validation_score: None,
            rerank_score: None,
            source,
            contributing_sources: BTreeSet::from([source]),
        }
    }

    #[test]
    fn overlapping_ids_keep_max_score_once() {
        let merged = merge_max([
            vec![cand("a", 0.6, CandidateSource::Vector)],
            vec![cand("a", 0.9, CandidateSource::Keyword)],
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].similarity_score, 0.9);
        assert_eq!(merged[0].source, CandidateSource::Keyword);
        assert!(merged[0].was_found_by(CandidateSource::Vector));
        assert!(merged[0].was_found_by(CandidateSource::Keyword));
    }

    #[test]
    fn lower_duplicate_does_not_replace() {
        let merged = merge_max([
            vec![cand("a", 0.9, CandidateSource::Vector)],
            vec![cand("a", 0.3, CandidateSource::Expanded)],
        ]);
        assert_eq!(merged[0].similarity_score, 0.9);
        assert_eq!(merged[0].source, CandidateSource::Vector);
        assert!(merged[0].was_found_by(CandidateSource::Expanded));
    }

    #[test]
    fn validation_score_survives_replacement() {
        let mut validated = cand("a", 0.6, CandidateSource::Vector);
        validated.validation_score = Some(0.8);
        let merged = merge_max([vec![validated], vec![cand("a", 0.7, CandidateSource::Expanded)]]);
        assert_eq!(merged[0].similarity_score, 0.7);
        assert_eq!(merged[0].validation_score, Some(0.8));
    }

    #[test]
    fn output_sorted_with_id_tiebreak() {
        let merged = merge_max([
            vec![cand("b", 0.7, CandidateSource::Vector), cand("c", 0.9, CandidateSource::Vector)],
            vec![cand("a", 0.7, CandidateSource::Keyword)],
        ]);
        let ids: Vec<_> = merged.iter().map(|c| c.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn empty_inputs_merge_to_empty() {
        assert!(merge_max(Vec::<Vec<RetrievalCandidate>>::new()).is_empty());
    }
}
