//! Stores loaded from the shared fixture corpus.

use levy_core::traits::{IKnowledgeStore, IRuleStore};
use levy_storage::{InMemoryKnowledgeStore, InMemoryRuleStore};
use test_fixtures::fixture_path;

#[tokio::test]
async fn fixture_rules_load_and_resolve() {
    let store = InMemoryRuleStore::load(fixture_path("rules/rules.json")).unwrap();
    assert_eq!(store.len(), test_fixtures::rules().len());

    let rule = store.lookup("IaaS / PaaS").await.unwrap().unwrap();
    assert!(rule.taxable);
    assert_eq!(rule.citations[0], "RCW 82.04.050");
    assert!(store.lookup("groceries").await.unwrap().is_none());
}

#[tokio::test]
async fn fixture_chunks_answer_citation_lookup() {
    let store = InMemoryKnowledgeStore::load(fixture_path("knowledge/chunks.json")).unwrap();
    assert_eq!(store.len(), test_fixtures::knowledge_chunks().len());

    let hits = store
        .keyword_search(&["rcw 82.04.050".to_string()])
        .await
        .unwrap();
    assert_eq!(hits[0].chunk.citation, "RCW 82.04.050");
    assert_eq!(hits[0].score, 1.0);
}

#[tokio::test]
async fn fixture_chunks_searchable_after_embedding() {
    let mut store = InMemoryKnowledgeStore::load(fixture_path("knowledge/chunks.json")).unwrap();
    store.embed_missing(bag_of_letters);

    let query = bag_of_letters(&test_fixtures::chunk("rcw-82.12.020-use").text);
    let hits = store.vector_search(&query, 3, None).await.unwrap();
    assert_eq!(hits[0].chunk.id, "rcw-82.12.020-use");
    assert!(hits[0].score > 0.99);
}

fn bag_of_letters(text: &str) -> Vec<f32> {
    let mut v = vec![0.0_f32; 26];
    for b in text.bytes().filter(u8::is_ascii_alphabetic) {
        v[(b.to_ascii_lowercase() - b'a') as usize] += 1.0;
    }
    v
}
