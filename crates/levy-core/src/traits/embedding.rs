use std::future::Future;
use std::sync::Arc;

use crate::errors::LevyResult;

/// Embedding generation service.
pub trait IEmbeddingService: Send + Sync {
    /// Embed a single text. Must be safe to retry.
    fn embed(&self, text: &str) -> impl Future<Output = LevyResult<Vec<f32>>> + Send;

    /// Human-readable service name.
    fn name(&self) -> &str;
}

impl<T: IEmbeddingService> IEmbeddingService for Arc<T> {
    fn embed(&self, text: &str) -> impl Future<Output = LevyResult<Vec<f32>>> + Send {
        (**self).embed(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
