//! Query complexity classification for the `ASSESS_COMPLEXITY` state.
//!
//! A query is simple only when no complexity signal fires: short, a single
//! question, no conditional or conjunctive language, no calculation request,
//! and no weak prior determination for its context.

use std::sync::LazyLock;

use levy_core::config::DecisionConfig;
use levy_core::{Confidence, RetrievalMode};
use regex::Regex;

/// Conjunctions and conditionals that imply several conditions to satisfy.
static MULTI_CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(and|or|if|unless|whether|both|either|except|provided|bundled|combined)\b")
        .unwrap()
});

static CALCULATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(calculate[ds]?|calculation|compute[ds]?|how much|apportion\w*|prorat\w*|allocate[ds]?|total)\b|\$\s?\d|\d\s?%",
    )
    .unwrap()
});

static MULTI_STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(explain|compare|why|walk me through|steps?|versus|vs\.?)\b").unwrap()
});

/// Why a query was routed to the enhanced pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexitySignal {
    LongQuery,
    MultiCondition,
    Calculation,
    MultiStep,
    MultipleQuestions,
    /// A prior determination exists but is below `medium_threshold`.
    WeakPrior,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityAssessment {
    pub mode: RetrievalMode,
    pub signals: Vec<ComplexitySignal>,
}

impl ComplexityAssessment {
    pub fn is_simple(&self) -> bool {
        self.mode == RetrievalMode::Simple
    }
}

/// Classify `text`, taking into account a prior cached confidence that did
/// not clear `high_threshold`.
pub fn assess(
    text: &str,
    prior: Option<Confidence>,
    config: &DecisionConfig,
) -> ComplexityAssessment {
    let mut signals = Vec::new();

    if text.split_whitespace().count() > config.simple_max_words {
        signals.push(ComplexitySignal::LongQuery);
    }
    if MULTI_CONDITION.is_match(text) {
        signals.push(ComplexitySignal::MultiCondition);
    }
    if CALCULATION.is_match(text) {
        signals.push(ComplexitySignal::Calculation);
    }
    if MULTI_STEP.is_match(text) {
        signals.push(ComplexitySignal::MultiStep);
    }
    if text.matches('?').count() > 1 {
        signals.push(ComplexitySignal::MultipleQuestions);
    }
    if let Some(prior) = prior {
        if !prior.meets(config.medium_threshold) {
            signals.push(ComplexitySignal::WeakPrior);
        }
    }

    let mode = if signals.is_empty() {
        RetrievalMode::Simple
    } else {
        RetrievalMode::Enhanced
    };
    ComplexityAssessment { mode, signals }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(text: &str) -> RetrievalMode {
        assess(text, None, &DecisionConfig::default()).mode
    }

    #[test]
    fn short_yes_no_is_simple() {
        assert_eq!(mode("Is SaaS taxable?"), RetrievalMode::Simple);
        assert_eq!(mode("Does RCW 82.04.050 cover remote software?"), RetrievalMode::Simple);
    }

    #[test]
    fn conjunctions_are_complex() {
        let a = assess(
            "Is SaaS taxable if the customer is out of state?",
            None,
            &DecisionConfig::default(),
        );
        assert_eq!(a.mode, RetrievalMode::Enhanced);
        assert_eq!(a.signals, vec![ComplexitySignal::MultiCondition]);
    }

    #[test]
    fn calculation_requests_are_complex() {
        assert_eq!(mode("Tax due on a $12,000 invoice?"), RetrievalMode::Enhanced);
        assert_eq!(mode("How much use tax applies here?"), RetrievalMode::Enhanced);
    }

    #[test]
    fn long_query_is_complex() {
        let text = "Is the annual platform fee charged by our vendor for hosted analytics \
                    dashboards used by our finance team in Seattle taxable this year?";
        let a = assess(text, None, &DecisionConfig::default());
        assert!(a.signals.contains(&ComplexitySignal::LongQuery));
    }

    #[test]
    fn weak_prior_pushes_to_enhanced() {
        let cfg = DecisionConfig::default();
        let weak = assess("Is SaaS taxable?", Some(Confidence::new(0.3)), &cfg);
        assert_eq!(weak.signals, vec![ComplexitySignal::WeakPrior]);

        let medium = assess("Is SaaS taxable?", Some(Confidence::new(0.7)), &cfg);
        assert!(medium.is_simple());
    }

    #[test]
    fn several_questions_are_complex() {
        assert_eq!(mode("Is it taxable? Is it exempt?"), RetrievalMode::Enhanced);
    }
}
