//! DecisionEngine: sequences cache, rules, complexity routing, and retrieval.
//!
//! `INIT → CHECK_CACHE → CHECK_RULES → ASSESS_COMPLEXITY →
//! {RETRIEVE_SIMPLE | RETRIEVE_ENHANCED} → DONE`
//!
//! Each transition is its own method. The engine keeps no state between
//! calls; everything durable lives behind the injected stores.

use chrono::Utc;
use levy_core::traits::{
    IAssessmentService, IEmbeddingService, IKnowledgeStore, IOutcomeCache, IRuleStore,
};
use levy_core::{
    CancellationToken, Confidence, ContextKey, DecisionAction, DecisionRecord, DecisionState,
    LevyConfig, LevyError, LevyResult, OutcomeRecord, Query, QueryContext, RetrievalMode,
    StructuredRule,
};
use levy_observability::decision_span;
use levy_observability::tracing_setup::events;
use levy_retrieval::{
    CachedEmbedder, CallLedger, PipelineOutput, ResilientCaller, RetrievalPipeline,
};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::complexity::{self, ComplexityAssessment};
use crate::evidence;

/// Result of the `CHECK_CACHE` state.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheCheck {
    /// Prior determination at or above `high_threshold`.
    Hit {
        record: OutcomeRecord,
        confidence: Confidence,
    },
    /// Prior determination below `high_threshold`; feeds complexity assessment.
    Weak(Confidence),
    Miss,
}

/// States visited during one call, in order.
#[derive(Debug)]
struct Trace {
    decision_id: Uuid,
    states: Vec<DecisionState>,
}

impl Trace {
    fn start(decision_id: Uuid) -> Self {
        Self {
            decision_id,
            states: vec![DecisionState::Init],
        }
    }

    fn enter(&mut self, next: DecisionState) {
        let from = self.states.last().copied().unwrap_or(DecisionState::Init);
        events::state_transition(from, next);
        self.states.push(next);
    }

    fn finish(mut self) -> (Uuid, Vec<DecisionState>) {
        self.enter(DecisionState::Done);
        (self.decision_id, self.states)
    }
}

/// Per-call execution context: ledger and cancellation for one decision.
struct CallScope<'a> {
    caller: ResilientCaller<'a>,
    ledger: &'a CallLedger,
}

pub struct DecisionEngine<E, K, R, O, A> {
    pub(crate) embedder: CachedEmbedder<E>,
    pub(crate) knowledge: K,
    pub(crate) rules: R,
    pub(crate) outcomes: O,
    pub(crate) assessor: A,
    pub(crate) config: LevyConfig,
}

impl<E, K, R, O, A> DecisionEngine<E, K, R, O, A>
where
    E: IEmbeddingService,
    K: IKnowledgeStore,
    R: IRuleStore,
    O: IOutcomeCache,
    A: IAssessmentService,
{
    /// Build an engine. The query-embedding cache is configured from
    /// `config.embedding_cache`.
    pub fn new(
        embedder: E,
        knowledge: K,
        rules: R,
        outcomes: O,
        assessor: A,
        config: LevyConfig,
    ) -> LevyResult<Self> {
        config.validate()?;
        Ok(Self {
            embedder: CachedEmbedder::new(embedder, &config.embedding_cache),
            knowledge,
            rules,
            outcomes,
            assessor,
            config,
        })
    }

    pub fn config(&self) -> &LevyConfig {
        &self.config
    }

    pub fn outcomes(&self) -> &O {
        &self.outcomes
    }

    pub fn embedder(&self) -> &CachedEmbedder<E> {
        &self.embedder
    }

    /// Primary entry point.
    ///
    /// Fails only for contract violations (`InvalidInput`). "No evidence" is
    /// a zero-confidence record, and collaborator outages produce degraded
    /// records.
    pub async fn decide_and_retrieve(
        &self,
        text: &str,
        context: &QueryContext,
    ) -> LevyResult<DecisionRecord> {
        self.decide_and_retrieve_with_cancel(text, context, &CancellationToken::new())
            .await
    }

    /// [`decide_and_retrieve`](Self::decide_and_retrieve) that also returns
    /// `Cancelled` once `cancel` fires. Pending external calls are abandoned.
    pub async fn decide_and_retrieve_with_cancel(
        &self,
        text: &str,
        context: &QueryContext,
        cancel: &CancellationToken,
    ) -> LevyResult<DecisionRecord> {
        let query = Query::new(text, context)?;
        let key = ContextKey::from_context(context);
        let decision_id = Uuid::new_v4();
        let span = decision_span!(decision_id, key.as_ref().map_or("-", ContextKey::as_str));

        let ledger = CallLedger::new();
        let scope = CallScope {
            caller: ResilientCaller::new(&self.config.resilience, cancel, &ledger),
            ledger: &ledger,
        };
        let record = self
            .decide(&query, key, Trace::start(decision_id), &scope)
            .instrument(span.clone())
            .await?;
        span.record("action", tracing::field::debug(record.action));
        Ok(record)
    }

    /// Bypass the cache and rule short-circuits and retrieve at `mode`.
    pub async fn force_retrieve(
        &self,
        text: &str,
        context: &QueryContext,
        mode: RetrievalMode,
    ) -> LevyResult<DecisionRecord> {
        let query = Query::new(text, context)?;
        let key = ContextKey::from_context(context);
        let cancel = CancellationToken::new();
        let ledger = CallLedger::new();
        let scope = CallScope {
            caller: ResilientCaller::new(&self.config.resilience, &cancel, &ledger),
            ledger: &ledger,
        };

        let mut trace = Trace::start(Uuid::new_v4());
        trace.enter(mode.state());
        let output = self.retrieve(&query, mode, &scope).await?;
        Ok(self.retrieval_record(mode, key, output, &scope, trace))
    }

    async fn decide(
        &self,
        query: &Query,
        key: Option<ContextKey>,
        mut trace: Trace,
        scope: &CallScope<'_>,
    ) -> LevyResult<DecisionRecord> {
        trace.enter(DecisionState::CheckCache);
        let prior = match self.check_cache(key.as_ref(), scope.caller).await? {
            CacheCheck::Hit { record, confidence } => {
                return Ok(self.cached_record(key, record, confidence, trace));
            }
            CacheCheck::Weak(confidence) => Some(confidence),
            CacheCheck::Miss => None,
        };

        trace.enter(DecisionState::CheckRules);
        if let Some(rule) = self.check_rules(query.category(), scope.caller).await? {
            return Ok(self.rule_record(key, rule, trace));
        }

        trace.enter(DecisionState::AssessComplexity);
        let assessment = self.assess_complexity(query, prior);
        let mode = assessment.mode;

        trace.enter(mode.state());
        let output = self.retrieve(query, mode, scope).await?;
        Ok(self.retrieval_record(mode, key, output, scope, trace))
    }

    /// `CHECK_CACHE`. A lookup failure is treated as a miss.
    pub(crate) async fn check_cache(
        &self,
        key: Option<&ContextKey>,
        caller: ResilientCaller<'_>,
    ) -> LevyResult<CacheCheck> {
        let Some(key) = key else {
            return Ok(CacheCheck::Miss);
        };
        let record = match caller.once("outcome_cache.get", self.outcomes.get(key)).await {
            Ok(record) => record,
            Err(LevyError::Cancelled) => return Err(LevyError::Cancelled),
            Err(err) => {
                events::lookup_failed("outcome_cache", &err);
                None
            }
        };
        let Some(record) = record else {
            return Ok(CacheCheck::Miss);
        };

        let confidence = record.effective_confidence(
            Utc::now(),
            self.config.feedback.stale_half_life_days,
        );
        debug!(context_key = %key, %confidence, "prior determination found");
        if confidence.meets(self.config.decision.high_threshold) {
            Ok(CacheCheck::Hit { record, confidence })
        } else {
            Ok(CacheCheck::Weak(confidence))
        }
    }

    /// `CHECK_RULES`. A lookup failure is treated as "no rule".
    pub(crate) async fn check_rules(
        &self,
        category: Option<&str>,
        caller: ResilientCaller<'_>,
    ) -> LevyResult<Option<StructuredRule>> {
        let Some(category) = category else {
            return Ok(None);
        };
        match caller.once("rule_store.lookup", self.rules.lookup(category)).await {
            Ok(Some(rule)) => match rule.validate() {
                Ok(()) => Ok(Some(rule)),
                Err(err) => {
                    events::lookup_failed("rule_store", &err);
                    Ok(None)
                }
            },
            Ok(None) => Ok(None),
            Err(LevyError::Cancelled) => Err(LevyError::Cancelled),
            Err(err) => {
                events::lookup_failed("rule_store", &err);
                Ok(None)
            }
        }
    }

    /// `ASSESS_COMPLEXITY`.
    pub(crate) fn assess_complexity(
        &self,
        query: &Query,
        prior: Option<Confidence>,
    ) -> ComplexityAssessment {
        let assessment = complexity::assess(query.text(), prior, &self.config.decision);
        debug!(mode = ?assessment.mode, signals = ?assessment.signals, "complexity assessed");
        assessment
    }

    /// `RETRIEVE_SIMPLE` or `RETRIEVE_ENHANCED`.
    async fn retrieve(
        &self,
        query: &Query,
        mode: RetrievalMode,
        scope: &CallScope<'_>,
    ) -> LevyResult<PipelineOutput> {
        let pipeline = RetrievalPipeline::new(
            &self.embedder,
            &self.knowledge,
            &self.assessor,
            &self.config,
            scope.caller,
        );
        match mode {
            RetrievalMode::Simple => pipeline.run_simple(query).await,
            RetrievalMode::Enhanced => pipeline.run_enhanced(query).await,
        }
    }

    fn baseline_cost(&self) -> f64 {
        self.config
            .cost
            .enhanced_baseline(self.config.retrieval.enhanced_top_k)
    }

    fn cached_record(
        &self,
        key: Option<ContextKey>,
        record: OutcomeRecord,
        confidence: Confidence,
        trace: Trace,
    ) -> DecisionRecord {
        let (decision_id, trace) = trace.finish();
        finish(DecisionRecord {
            decision_id,
            action: DecisionAction::UseCached,
            confidence,
            evidence: Vec::new(),
            degraded: false,
            cost_saved_estimate: self.baseline_cost(),
            context_key: key,
            cached: Some(record),
            rule: None,
            degradations: Vec::new(),
            trace,
        })
    }

    fn rule_record(
        &self,
        key: Option<ContextKey>,
        rule: StructuredRule,
        trace: Trace,
    ) -> DecisionRecord {
        let (decision_id, trace) = trace.finish();
        finish(DecisionRecord {
            decision_id,
            action: DecisionAction::UseRules,
            confidence: Confidence::new(rule.confidence_weight),
            evidence: evidence::from_rule(&rule),
            degraded: false,
            cost_saved_estimate: self.baseline_cost(),
            context_key: key,
            cached: None,
            rule: Some(rule),
            degradations: Vec::new(),
            trace,
        })
    }

    fn retrieval_record(
        &self,
        mode: RetrievalMode,
        key: Option<ContextKey>,
        output: PipelineOutput,
        scope: &CallScope<'_>,
        trace: Trace,
    ) -> DecisionRecord {
        let incurred = scope.ledger.cost(&self.config.cost);
        debug!(calls = scope.ledger.total(), incurred, "retrieval cost");
        let (decision_id, trace) = trace.finish();
        finish(DecisionRecord {
            decision_id,
            action: mode.action(),
            confidence: output.confidence,
            evidence: output.evidence,
            degraded: output.degraded,
            cost_saved_estimate: (self.baseline_cost() - incurred).max(0.0),
            context_key: key,
            cached: None,
            rule: None,
            degradations: output.degradations,
            trace,
        })
    }
}

fn finish(record: DecisionRecord) -> DecisionRecord {
    events::decision_made(
        record.action,
        record.confidence.value(),
        record.evidence.len(),
        record.degraded,
    );
    record
}
