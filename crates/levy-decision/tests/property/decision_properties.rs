//! Property tests: confidence range, routing, and feedback monotonicity.

use std::sync::Arc;

use levy_core::config::DecisionConfig;
use levy_core::{ContextKey, QueryContext, RetrievalMode};
use levy_decision::complexity;
use levy_decision::DecisionEngine;
use levy_storage::{InMemoryOutcomeCache, InMemoryRuleStore};
use proptest::prelude::*;
use test_fixtures::mocks::{MockAssessor, MockEmbedder, MockKnowledgeStore};
use test_fixtures::{chunk_match, fast_config};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn engine(
    assessor: MockAssessor,
) -> DecisionEngine<
    MockEmbedder,
    MockKnowledgeStore,
    InMemoryRuleStore,
    Arc<InMemoryOutcomeCache>,
    MockAssessor,
> {
    let store = MockKnowledgeStore::new()
        .with_vector(vec![
            chunk_match("rcw-82.04.050-6", 0.92),
            chunk_match("rcw-82.04.192-3", 0.71),
            chunk_match("wac-458-20-155-maintenance", 0.55),
        ])
        .with_keyword(vec![chunk_match("rcw-82.08.02088", 0.5)]);
    DecisionEngine::new(
        MockEmbedder::new(),
        store,
        InMemoryRuleStore::from_rules(test_fixtures::rules()).unwrap(),
        Arc::new(InMemoryOutcomeCache::new()),
        assessor,
        fast_config(),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn confidence_always_in_unit_range(
        text in "[A-Za-z0-9 ?$%.,]{1,120}",
        category in prop::option::of("[a-z_]{1,16}"),
        score in 0.0f64..=1.0,
    ) {
        prop_assume!(!text.trim().is_empty());
        let engine = engine(MockAssessor::new().with_default_score(score));
        let mut ctx = QueryContext::new().with_vendor("Acme");
        if let Some(category) = category {
            ctx = ctx.with_category(category);
        }
        let record = runtime()
            .block_on(engine.decide_and_retrieve(&text, &ctx))
            .unwrap();
        prop_assert!((0.0..=1.0).contains(&record.confidence.value()));
        prop_assert!(record.cost_saved_estimate >= 0.0);
        prop_assert!(record.evidence.iter().all(|c| !c.citation.is_empty()));
    }

    #[test]
    fn queries_over_word_limit_are_enhanced(words in prop::collection::vec("[a-z]{2,8}", 19..40)) {
        let text = words.join(" ");
        let assessment = complexity::assess(&text, None, &DecisionConfig::default());
        prop_assert_eq!(assessment.mode, RetrievalMode::Enhanced);
    }

    #[test]
    fn negative_feedback_is_non_increasing(
        first in 0.0f64..=1.0,
        observed in prop::collection::vec(0.0f64..=1.0, 1..12),
    ) {
        let engine = engine(MockAssessor::new());
        let key = ContextKey::normalize(Some("saas_subscription"), Some("Acme"));
        let rt = runtime();
        let mut last = rt.block_on(engine.record_outcome(&key, true, first)).unwrap().confidence();
        for c in observed {
            let next = rt.block_on(engine.record_outcome(&key, false, c)).unwrap().confidence();
            prop_assert!(next <= last);
            last = next;
        }
    }
}
