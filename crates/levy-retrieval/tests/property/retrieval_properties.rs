//! Property tests for levy-retrieval: merge and rerank invariants.

use std::collections::{BTreeSet, HashMap, HashSet};

use proptest::prelude::*;

use levy_core::config::RerankConfig;
use levy_core::{CandidateSource, RetrievalCandidate};
use levy_retrieval::ranking::order_candidates;
use levy_retrieval::search::merge_max;

fn cand(id: usize, score: f64, validation: Option<f64>, source: CandidateSource) -> RetrievalCandidate {
    RetrievalCandidate {
        chunk_id: format!("c{id}"),
        citation: format!("RCW 82.04.{id:03}"),
        section_id: "s".into(),
        text: format!("chunk {id}"),
        similarity_score: score,
        validation_score: validation,
        rerank_score: None,
        source,
        contributing_sources: BTreeSet::from([source]),
    }
}

fn list_strategy(source: CandidateSource) -> impl Strategy<Value = Vec<RetrievalCandidate>> {
    prop::collection::vec((0usize..12, 0.0f64..1.0), 0..15).prop_map(move |entries| {
        entries
            .into_iter()
            .map(|(id, score)| cand(id, score, None, source))
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_keeps_each_id_once_at_max_score(
        vector in list_strategy(CandidateSource::Vector),
        keyword in list_strategy(CandidateSource::Keyword),
        expanded in list_strategy(CandidateSource::Expanded),
    ) {
        let mut expected: HashMap<String, f64> = HashMap::new();
        for c in vector.iter().chain(&keyword).chain(&expanded) {
            let e = expected.entry(c.chunk_id.clone()).or_insert(f64::MIN);
            *e = e.max(c.similarity_score);
        }

        let merged = merge_max([vector, keyword, expanded]);

        let ids: HashSet<&str> = merged.iter().map(|c| c.chunk_id.as_str()).collect();
        prop_assert_eq!(ids.len(), merged.len());
        prop_assert_eq!(merged.len(), expected.len());
        for c in &merged {
            prop_assert_eq!(c.similarity_score, expected[&c.chunk_id]);
        }
        for pair in merged.windows(2) {
            prop_assert!(pair[0].similarity_score >= pair[1].similarity_score);
        }
    }

    #[test]
    fn rerank_output_is_a_subset_of_input(
        scores in prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 0..20),
        service in prop::collection::vec(0usize..30, 0..30),
        final_k in 1usize..10,
        use_service in any::<bool>(),
    ) {
        let input: Vec<RetrievalCandidate> = scores
            .iter()
            .enumerate()
            .map(|(i, (sim, val))| cand(i, *sim, Some(*val), CandidateSource::Vector))
            .collect();
        let input_ids: HashSet<String> = input.iter().map(|c| c.chunk_id.clone()).collect();
        let order: Vec<String> = service.iter().map(|i| format!("c{i}")).collect();

        let output = order_candidates(
            input,
            &["82.04.003".to_string()],
            use_service.then_some(order.as_slice()),
            &RerankConfig::default(),
            final_k,
        );

        prop_assert!(output.len() <= final_k.min(scores.len()));
        let output_ids: HashSet<String> = output.iter().map(|c| c.chunk_id.clone()).collect();
        prop_assert_eq!(output_ids.len(), output.len());
        prop_assert!(output_ids.is_subset(&input_ids));
        for c in &output {
            let score = c.rerank_score.unwrap_or(-1.0);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
