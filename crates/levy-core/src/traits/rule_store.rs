use std::future::Future;
use std::sync::Arc;

use crate::errors::LevyResult;
use crate::models::StructuredRule;

/// Read-only table of curated, category-keyed determinations.
pub trait IRuleStore: Send + Sync {
    /// Exact match on the normalized category key.
    fn lookup(
        &self,
        category_key: &str,
    ) -> impl Future<Output = LevyResult<Option<StructuredRule>>> + Send;
}

impl<T: IRuleStore> IRuleStore for Arc<T> {
    fn lookup(
        &self,
        category_key: &str,
    ) -> impl Future<Output = LevyResult<Option<StructuredRule>>> + Send {
        (**self).lookup(category_key)
    }
}
