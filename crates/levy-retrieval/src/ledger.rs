//! Per-call accounting of external calls, used for cost estimates.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use levy_core::config::CostConfig;

/// Kind of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Embed,
    VectorSearch,
    KeywordSearch,
    Assess,
    Rerank,
    Expand,
}

impl CallKind {
    pub const ALL: [CallKind; 6] = [
        CallKind::Embed,
        CallKind::VectorSearch,
        CallKind::KeywordSearch,
        CallKind::Assess,
        CallKind::Rerank,
        CallKind::Expand,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Embed => "embed",
            Self::VectorSearch => "vector_search",
            Self::KeywordSearch => "keyword_search",
            Self::Assess => "assess",
            Self::Rerank => "rerank",
            Self::Expand => "expand",
        }
    }

    fn unit_cost(self, cost: &CostConfig) -> f64 {
        match self {
            Self::Embed => cost.embed,
            Self::VectorSearch => cost.vector_search,
            Self::KeywordSearch => cost.keyword_search,
            Self::Assess => cost.assess,
            Self::Rerank => cost.rerank,
            Self::Expand => cost.expand,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts every attempted external call (retries included) within one decision.
#[derive(Debug, Default)]
pub struct CallLedger {
    counts: [AtomicU32; 6],
}

impl CallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: CallKind) {
        self.counts[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, kind: CallKind) -> u32 {
        self.counts[kind.index()].load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u32 {
        CallKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    /// Cost actually incurred by the recorded calls.
    pub fn cost(&self, cost: &CostConfig) -> f64 {
        CallKind::ALL
            .iter()
            .map(|k| k.unit_cost(cost) * f64::from(self.count(*k)))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_kind() {
        let ledger = CallLedger::new();
        ledger.record(CallKind::Embed);
        ledger.record(CallKind::Assess);
        ledger.record(CallKind::Assess);
        assert_eq!(ledger.count(CallKind::Embed), 1);
        assert_eq!(ledger.count(CallKind::Assess), 2);
        assert_eq!(ledger.count(CallKind::Rerank), 0);
        assert_eq!(ledger.total(), 3);
    }

    #[test]
    fn cost_sums_unit_costs() {
        let cost = CostConfig::default();
        let ledger = CallLedger::new();
        ledger.record(CallKind::Embed);
        ledger.record(CallKind::VectorSearch);
        let expected = cost.embed + cost.vector_search;
        assert!((ledger.cost(&cost) - expected).abs() < 1e-12);
    }
}
