//! Benchmarks for complexity routing and rule evidence synthesis.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use levy_core::config::DecisionConfig;
use levy_core::StructuredRule;
use levy_decision::{complexity, evidence};

fn bench_assess(c: &mut Criterion) {
    let config = DecisionConfig::default();
    let queries = [
        "Is SaaS taxable?",
        "If we resell a SaaS subscription bundled with consulting and maintenance, and the \
         customer is out of state, how is tax calculated on the $12,000 invoice?",
        "Does RCW 82.04.050 cover remotely accessed prewritten software?",
    ];
    c.bench_function("complexity_assess_3", |b| {
        b.iter(|| {
            for q in &queries {
                black_box(complexity::assess(black_box(q), None, &config));
            }
        })
    });
}

fn bench_rule_evidence(c: &mut Criterion) {
    let rule = StructuredRule {
        category_key: "iaas_paas".into(),
        taxable: true,
        citations: (0..8).map(|i| format!("WAC 458-20-{}", 100 + i)).collect(),
        exemptions: Vec::new(),
        confidence_weight: 0.9,
    };
    c.bench_function("rule_evidence_8", |b| {
        b.iter(|| black_box(evidence::from_rule(black_box(&rule))))
    });
}

criterion_group!(benches, bench_assess, bench_rule_evidence);
criterion_main!(benches);
