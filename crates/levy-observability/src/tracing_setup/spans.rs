//! Spans for the engine's entry points. Fields are recorded on entry;
//! stages add their own events inside.

/// Whole `decide_and_retrieve` call. `action` is recorded once decided.
#[macro_export]
macro_rules! decision_span {
    ($decision_id:expr, $context_key:expr) => {
        tracing::info_span!(
            "levy.decision",
            decision_id = %$decision_id,
            context_key = %$context_key,
            action = tracing::field::Empty
        )
    };
}

/// Outcome feedback write.
#[macro_export]
macro_rules! feedback_span {
    ($context_key:expr, $was_validated:expr) => {
        tracing::info_span!(
            "levy.feedback",
            context_key = %$context_key,
            was_validated = $was_validated
        )
    };
}
