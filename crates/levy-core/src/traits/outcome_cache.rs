use std::future::Future;
use std::sync::Arc;

use crate::errors::LevyResult;
use crate::models::{ContextKey, OutcomeRecord};

/// Read/write store of prior determinations.
pub trait IOutcomeCache: Send + Sync {
    fn get(
        &self,
        key: &ContextKey,
    ) -> impl Future<Output = LevyResult<Option<OutcomeRecord>>> + Send;

    /// Replace the record stored under its context key.
    fn put(&self, record: OutcomeRecord) -> impl Future<Output = LevyResult<()>> + Send;

    /// Atomic read-modify-write of one record.
    ///
    /// `apply` receives the current record (if any) and returns its
    /// replacement. Concurrent updates to the same key must serialize so no
    /// counter increment is lost.
    ///
    /// Implementations may run `apply` off the calling task, so it owns
    /// everything it captures.
    fn update<F>(
        &self,
        key: &ContextKey,
        apply: F,
    ) -> impl Future<Output = LevyResult<OutcomeRecord>> + Send
    where
        F: FnOnce(Option<&OutcomeRecord>) -> OutcomeRecord + Send + 'static;
}

impl<T: IOutcomeCache> IOutcomeCache for Arc<T> {
    fn get(
        &self,
        key: &ContextKey,
    ) -> impl Future<Output = LevyResult<Option<OutcomeRecord>>> + Send {
        (**self).get(key)
    }

    fn put(&self, record: OutcomeRecord) -> impl Future<Output = LevyResult<()>> + Send {
        (**self).put(record)
    }

    fn update<F>(
        &self,
        key: &ContextKey,
        apply: F,
    ) -> impl Future<Output = LevyResult<OutcomeRecord>> + Send
    where
        F: FnOnce(Option<&OutcomeRecord>) -> OutcomeRecord + Send + 'static,
    {
        (**self).update(key, apply)
    }
}
