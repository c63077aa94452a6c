use chrono::Utc;
use levy_core::config::FeedbackConfig;
use levy_core::models::{ContextKey, Outcome, OutcomeRecord};
use proptest::prelude::*;

fn key() -> ContextKey {
    ContextKey::normalize(Some("saas_subscription"), Some("Acme"))
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    (any::<bool>(), 0.0f64..=1.0).prop_map(|(was_validated, observed_confidence)| Outcome {
        was_validated,
        observed_confidence,
    })
}

proptest! {
    #[test]
    fn confidence_stays_in_unit_interval(history in prop::collection::vec(arb_outcome(), 1..40)) {
        let cfg = FeedbackConfig::default();
        let now = Utc::now();
        let mut record = OutcomeRecord::first(key(), history[0], "", &cfg, now);
        for outcome in &history[1..] {
            record = record.applied(*outcome, None, &cfg, now);
            let c = record.confidence().value();
            prop_assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn counters_never_invert(history in prop::collection::vec(arb_outcome(), 1..40)) {
        let cfg = FeedbackConfig::default();
        let now = Utc::now();
        let mut record = OutcomeRecord::first(key(), history[0], "", &cfg, now);
        for outcome in &history[1..] {
            record = record.applied(*outcome, None, &cfg, now);
        }
        prop_assert_eq!(record.times_applied(), history.len() as u64);
        prop_assert!(record.times_validated() <= record.times_applied());
    }

    #[test]
    fn consecutive_negatives_are_non_increasing(
        history in prop::collection::vec(arb_outcome(), 1..20),
        negatives in 1usize..20,
    ) {
        let cfg = FeedbackConfig::default();
        let now = Utc::now();
        let mut record = OutcomeRecord::first(key(), history[0], "", &cfg, now);
        for outcome in &history[1..] {
            record = record.applied(*outcome, None, &cfg, now);
        }
        let rejected = Outcome { was_validated: false, observed_confidence: 0.9 };
        for _ in 0..negatives {
            let next = record.applied(rejected, None, &cfg, now);
            prop_assert!(next.confidence() <= record.confidence());
            if record.confidence().value() > 0.0 {
                prop_assert!(next.confidence() < record.confidence());
            }
            record = next;
        }
    }
}
