//! In-process embedding cache in front of the embedding service.
//!
//! Keys are blake3 hashes of the whitespace-normalized, lowercased query
//! text. Only successful embeddings are stored; failures always reach the
//! service again on the next call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use levy_core::config::EmbeddingCacheConfig;
use levy_core::errors::EmbeddingError;
use levy_core::traits::IEmbeddingService;
use levy_core::LevyResult;
use moka::sync::Cache;
use tracing::trace;

pub struct CachedEmbedder<E> {
    inner: E,
    cache: Option<Cache<String, Arc<Vec<f32>>>>,
}

impl<E: IEmbeddingService> CachedEmbedder<E> {
    pub fn new(inner: E, config: &EmbeddingCacheConfig) -> Self {
        let cache = config.enabled.then(|| {
            Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(Duration::from_secs(config.ttl_secs))
                .build()
        });
        Self { inner, cache }
    }

    /// Wrap `inner` with caching disabled.
    pub fn uncached(inner: E) -> Self {
        Self { inner, cache: None }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Cached embedding for `text`, if any. Never calls the service.
    pub fn lookup(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        let cache = self.cache.as_ref()?;
        let hit = cache.get(&content_hash(text));
        if hit.is_some() {
            trace!(embedder = self.inner.name(), "embedding cache hit");
        }
        hit
    }

    /// Embed through the service and remember the result.
    pub async fn embed_uncached(&self, text: &str) -> LevyResult<Arc<Vec<f32>>> {
        let embedding = self.inner.embed(text).await?;
        if embedding.is_empty() {
            return Err(EmbeddingError::EmptyEmbedding.into());
        }
        let embedding = Arc::new(embedding);
        if let Some(cache) = &self.cache {
            cache.insert(content_hash(text), Arc::clone(&embedding));
        }
        Ok(embedding)
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.as_ref().map_or(0, |c| {
            c.run_pending_tasks();
            c.entry_count()
        })
    }
}

impl<E: IEmbeddingService> IEmbeddingService for CachedEmbedder<E> {
    fn embed(&self, text: &str) -> impl Future<Output = LevyResult<Vec<f32>>> + Send {
        async move {
            if let Some(hit) = self.lookup(text) {
                return Ok(hit.as_ref().clone());
            }
            let fresh = self.embed_uncached(text).await?;
            Ok(fresh.as_ref().clone())
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

fn content_hash(text: &str) -> String {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}
