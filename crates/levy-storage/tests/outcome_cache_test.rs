//! Outcome cache tests: atomic update under concurrency, persistence, and
//! the counter invariant.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use levy_core::config::FeedbackConfig;
use levy_core::models::Outcome;
use levy_core::traits::IOutcomeCache;
use levy_core::{ContextKey, LevyError, OutcomeRecord};
use levy_storage::{InMemoryOutcomeCache, SqliteOutcomeCache};
use proptest::prelude::*;

fn key() -> ContextKey {
    ContextKey::normalize(Some("saas_subscription"), Some("Acme Corp"))
}

fn outcome(was_validated: bool) -> Outcome {
    Outcome {
        was_validated,
        observed_confidence: 0.9,
    }
}

async fn record<C: IOutcomeCache>(cache: &C, key: &ContextKey, was_validated: bool) {
    let cfg = FeedbackConfig::default();
    let now = Utc::now();
    let owned = key.clone();
    cache
        .update(key, move |existing| match existing {
            Some(r) => r.applied(outcome(was_validated), None, &cfg, now),
            None => OutcomeRecord::first(owned, outcome(was_validated), "", &cfg, now),
        })
        .await
        .unwrap();
}

// ── In-memory ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn memory_get_missing_is_none() {
    let cache = InMemoryOutcomeCache::new();
    assert!(cache.get(&key()).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_put_then_get() {
    let cache = InMemoryOutcomeCache::new();
    let r = OutcomeRecord::first(
        key(),
        outcome(true),
        "taxable",
        &FeedbackConfig::default(),
        Utc::now(),
    );
    cache.put(r.clone()).await.unwrap();
    assert_eq!(cache.get(&key()).await.unwrap(), Some(r));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_concurrent_updates_lose_no_increment() {
    let cache = Arc::new(InMemoryOutcomeCache::new());
    let mut handles = Vec::new();
    for i in 0..40 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            record(&*cache, &key(), i % 2 == 0).await;
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    let r = cache.get(&key()).await.unwrap().unwrap();
    assert_eq!(r.times_applied(), 40);
    assert_eq!(r.times_validated(), 20);
}

#[tokio::test]
async fn memory_update_rejects_foreign_key() {
    let cache = InMemoryOutcomeCache::new();
    let other = ContextKey::normalize(Some("iaas_paas"), None);
    let err = cache
        .update(&key(), move |_| {
            OutcomeRecord::first(
                other,
                outcome(true),
                "",
                &FeedbackConfig::default(),
                Utc::now(),
            )
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LevyError::StoreError(_)));
    assert!(cache.is_empty());
}

// ── SQLite ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sqlite_put_then_get() {
    let cache = SqliteOutcomeCache::open_in_memory().unwrap();
    let r = OutcomeRecord::first(
        key(),
        outcome(true),
        "taxable under RCW 82.04.050",
        &FeedbackConfig::default(),
        Utc::now(),
    );
    cache.put(r.clone()).await.unwrap();
    let back = cache.get(&key()).await.unwrap().unwrap();
    assert_eq!(back.context_key(), r.context_key());
    assert_eq!(back.times_applied(), 1);
    assert_eq!(back.outcome_summary(), "taxable under RCW 82.04.050");
    assert!((back.confidence().value() - r.confidence().value()).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_concurrent_updates_lose_no_increment() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(SqliteOutcomeCache::open(dir.path().join("outcomes.db")).unwrap());
    let mut handles = Vec::new();
    for i in 0..30 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            record(&*cache, &key(), i % 3 == 0).await;
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    let r = cache.get(&key()).await.unwrap().unwrap();
    assert_eq!(r.times_applied(), 30);
    assert_eq!(r.times_validated(), 10);
    assert_eq!(cache.count().unwrap(), 1);
}

#[tokio::test]
async fn sqlite_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outcomes.db");
    {
        let cache = SqliteOutcomeCache::open(&path).unwrap();
        record(&cache, &key(), true).await;
        record(&cache, &key(), false).await;
    }
    let cache = SqliteOutcomeCache::open(&path).unwrap();
    let r = cache.get(&key()).await.unwrap().unwrap();
    assert_eq!(r.times_applied(), 2);
    assert_eq!(r.times_validated(), 1);
}

#[tokio::test]
async fn sqlite_update_rejects_foreign_key_and_rolls_back() {
    let cache = SqliteOutcomeCache::open_in_memory().unwrap();
    let other = ContextKey::normalize(Some("iaas_paas"), None);
    let result = cache
        .update(&key(), move |_| {
            OutcomeRecord::first(
                other,
                outcome(true),
                "",
                &FeedbackConfig::default(),
                Utc::now(),
            )
        })
        .await;
    assert!(result.is_err());
    assert_eq!(cache.count().unwrap(), 0);
}

#[tokio::test]
async fn sqlite_update_waiting_on_file_lock_yields_to_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outcomes.db");
    let cache = SqliteOutcomeCache::open(&path).unwrap();
    let holder = rusqlite::Connection::open(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE").unwrap();

    let cfg = FeedbackConfig::default();
    let target = key();
    let owned = key();
    let pending = cache.update(&target, move |_| {
        OutcomeRecord::first(owned, outcome(true), "", &cfg, Utc::now())
    });
    let waited = tokio::time::timeout(Duration::from_millis(100), pending).await;
    assert!(waited.is_err());

    // The abandoned update still lands once the lock is released, and the
    // next one queues behind it.
    holder.execute_batch("COMMIT").unwrap();
    record(&cache, &key(), false).await;
    let r = cache.get(&key()).await.unwrap().unwrap();
    assert_eq!(r.times_applied(), 2);
    assert_eq!(r.times_validated(), 1);
}

// ── Counter invariant ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn validated_never_exceeds_applied(outcomes in prop::collection::vec(any::<bool>(), 1..30)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let cache = InMemoryOutcomeCache::new();
            for &v in &outcomes {
                record(&cache, &key(), v).await;
            }
            let r = cache.get(&key()).await.unwrap().unwrap();
            prop_assert_eq!(r.times_applied(), outcomes.len() as u64);
            prop_assert_eq!(
                r.times_validated(),
                outcomes.iter().filter(|v| **v).count() as u64
            );
            prop_assert!(r.times_validated() <= r.times_applied());
            prop_assert!((0.0..=1.0).contains(&r.confidence().value()));
            Ok(())
        })?;
    }
}
