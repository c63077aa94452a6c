//! In-process outcome cache. The `dashmap` entry lock makes `update` atomic
//! per key.

use std::future::Future;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use levy_core::traits::IOutcomeCache;
use levy_core::{ContextKey, LevyResult, OutcomeRecord};

use super::check_key;

#[derive(Debug, Default)]
pub struct InMemoryOutcomeCache {
    records: DashMap<ContextKey, OutcomeRecord>,
}

impl InMemoryOutcomeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = OutcomeRecord>) -> Self {
        let cache = Self::new();
        for record in records {
            cache.records.insert(record.context_key().clone(), record);
        }
        cache
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn update_sync<F>(&self, key: &ContextKey, apply: F) -> LevyResult<OutcomeRecord>
    where
        F: FnOnce(Option<&OutcomeRecord>) -> OutcomeRecord,
    {
        match self.records.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let updated = apply(Some(entry.get()));
                check_key(key, &updated)?;
                entry.insert(updated.clone());
                Ok(updated)
            }
            Entry::Vacant(entry) => {
                let created = apply(None);
                check_key(key, &created)?;
                entry.insert(created.clone());
                Ok(created)
            }
        }
    }
}

impl IOutcomeCache for InMemoryOutcomeCache {
    fn get(
        &self,
        key: &ContextKey,
    ) -> impl Future<Output = LevyResult<Option<OutcomeRecord>>> + Send {
        std::future::ready(Ok(self.records.get(key).map(|r| r.value().clone())))
    }

    fn put(&self, record: OutcomeRecord) -> impl Future<Output = LevyResult<()>> + Send {
        self.records.insert(record.context_key().clone(), record);
        std::future::ready(Ok(()))
    }

    fn update<F>(
        &self,
        key: &ContextKey,
        apply: F,
    ) -> impl Future<Output = LevyResult<OutcomeRecord>> + Send
    where
        F: FnOnce(Option<&OutcomeRecord>) -> OutcomeRecord + Send + 'static,
    {
        std::future::ready(self.update_sync(key, apply))
    }
}
