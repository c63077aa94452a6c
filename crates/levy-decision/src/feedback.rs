//! Outcome feedback: the caller reports how a decision turned out.

use chrono::Utc;
use levy_core::models::Outcome;
use levy_core::traits::{
    IAssessmentService, IEmbeddingService, IKnowledgeStore, IOutcomeCache, IRuleStore,
};
use levy_core::{ContextKey, LevyError, LevyResult, OutcomeRecord};
use levy_observability::feedback_span;
use levy_observability::tracing_setup::events;
use tracing::Instrument;

use crate::engine::DecisionEngine;

impl<E, K, R, O, A> DecisionEngine<E, K, R, O, A>
where
    E: IEmbeddingService,
    K: IKnowledgeStore,
    R: IRuleStore,
    O: IOutcomeCache,
    A: IAssessmentService,
{
    /// Fold one outcome into the record for `context_key`.
    ///
    /// Counters accumulate through the cache's atomic update, so concurrent
    /// feedback for one key never loses an increment. Returns the stored
    /// record.
    pub async fn record_outcome(
        &self,
        context_key: &ContextKey,
        was_validated: bool,
        observed_confidence: f64,
    ) -> LevyResult<OutcomeRecord> {
        self.apply_outcome(context_key, was_validated, observed_confidence, None)
            .await
    }

    /// [`record_outcome`](Self::record_outcome) that also replaces the
    /// record's outcome summary.
    pub async fn record_outcome_with_summary(
        &self,
        context_key: &ContextKey,
        was_validated: bool,
        observed_confidence: f64,
        summary: &str,
    ) -> LevyResult<OutcomeRecord> {
        self.apply_outcome(context_key, was_validated, observed_confidence, Some(summary))
            .await
    }

    async fn apply_outcome(
        &self,
        context_key: &ContextKey,
        was_validated: bool,
        observed_confidence: f64,
        summary: Option<&str>,
    ) -> LevyResult<OutcomeRecord> {
        if !observed_confidence.is_finite() || !(0.0..=1.0).contains(&observed_confidence) {
            return Err(LevyError::invalid_input(format!(
                "observed confidence {observed_confidence} outside [0, 1]"
            )));
        }
        let outcome = Outcome {
            was_validated,
            observed_confidence,
        };
        let config = self.config.feedback.clone();
        let summary = summary.map(str::to_string);
        let key = context_key.clone();
        let now = Utc::now();

        let record = self
            .outcomes
            .update(context_key, move |existing| match existing {
                Some(record) => record.applied(outcome, summary.as_deref(), &config, now),
                None => OutcomeRecord::first(
                    key,
                    outcome,
                    summary.as_deref().unwrap_or_default(),
                    &config,
                    now,
                ),
            })
            .instrument(feedback_span!(context_key, was_validated))
            .await?;

        events::outcome_recorded(
            context_key.as_str(),
            record.times_applied(),
            record.confidence().value(),
        );
        Ok(record)
    }
}
