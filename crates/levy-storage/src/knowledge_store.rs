//! In-memory knowledge store: brute-force cosine search and substring
//! keyword matching over a fixed chunk corpus.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;

use levy_core::errors::StoreError;
use levy_core::models::{normalize_category, ChunkMatch};
use levy_core::traits::IKnowledgeStore;
use levy_core::{KnowledgeChunk, LevyResult};
use rayon::prelude::*;
use tracing::debug;

use crate::load_failed;

pub struct InMemoryKnowledgeStore {
    chunks: Vec<KnowledgeChunk>,
}

impl InMemoryKnowledgeStore {
    /// Build a store, rejecting blank or duplicate chunk ids.
    pub fn new(chunks: Vec<KnowledgeChunk>) -> LevyResult<Self> {
        let mut seen = HashSet::new();
        for chunk in &chunks {
            if chunk.id.trim().is_empty() {
                return Err(StoreError::InvalidRecord {
                    reason: "chunk id is empty".into(),
                }
                .into());
            }
            if !seen.insert(chunk.id.as_str()) {
                return Err(StoreError::InvalidRecord {
                    reason: format!("duplicate chunk id {}", chunk.id),
                }
                .into());
            }
        }
        Ok(Self { chunks })
    }

    pub fn from_json(json: &str) -> LevyResult<Self> {
        let chunks: Vec<KnowledgeChunk> =
            serde_json::from_str(json).map_err(|e| load_failed("knowledge chunks", e))?;
        Self::new(chunks)
    }

    pub fn load(path: impl AsRef<Path>) -> LevyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| load_failed(path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Fill in missing chunk embeddings with `embed`.
    pub fn embed_missing(&mut self, embed: impl Fn(&str) -> Vec<f32> + Sync) {
        self.chunks
            .par_iter_mut()
            .filter(|c| c.embedding.is_empty())
            .for_each(|c| c.embedding = embed(&c.text));
    }

    fn search_vector(
        &self,
        embedding: &[f32],
        top_k: usize,
        category: Option<&str>,
    ) -> Vec<ChunkMatch> {
        let category = category.map(normalize_category).filter(|c| !c.is_empty());
        let mut matches: Vec<ChunkMatch> = self
            .chunks
            .par_iter()
            .filter(|c| c.embedding.len() == embedding.len())
            .filter(|c| in_category(c, category.as_deref()))
            .map(|c| ChunkMatch {
                chunk: c.clone(),
                score: cosine_similarity(embedding, &c.embedding).max(0.0),
            })
            .collect();
        sort_matches(&mut matches);
        matches.truncate(top_k);
        matches
    }

    fn search_keyword(&self, terms: &[String]) -> Vec<ChunkMatch> {
        let terms: Vec<String> = terms
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }
        let mut matches: Vec<ChunkMatch> = self
            .chunks
            .par_iter()
            .filter_map(|c| {
                let score = keyword_score(c, &terms);
                (score > 0.0).then(|| ChunkMatch {
                    chunk: c.clone(),
                    score,
                })
            })
            .collect();
        sort_matches(&mut matches);
        matches
    }
}

/// Untagged chunks are general and match every category.
fn in_category(chunk: &KnowledgeChunk, category: Option<&str>) -> bool {
    match category {
        None => true,
        Some(_) if chunk.category_tags.is_empty() => true,
        Some(category) => chunk
            .category_tags
            .iter()
            .any(|t| normalize_category(t) == category),
    }
}

/// Exact citation hit scores 1; otherwise the fraction of terms found in
/// the chunk text or citation.
fn keyword_score(chunk: &KnowledgeChunk, terms: &[String]) -> f64 {
    let citation = chunk.citation.to_lowercase();
    if terms.iter().any(|t| *t == citation) {
        return 1.0;
    }
    let text = chunk.text.to_lowercase();
    let hits = terms
        .iter()
        .filter(|t| text.contains(t.as_str()) || citation.contains(t.as_str()))
        .count();
    hits as f64 / terms.len() as f64
}

fn sort_matches(matches: &mut [ChunkMatch]) {
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
}

/// Cosine similarity between two vectors. Returns 0 for zero-length or
/// mismatched inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

impl IKnowledgeStore for InMemoryKnowledgeStore {
    fn vector_search(
        &self,
        embedding: &[f32],
        top_k: usize,
        category: Option<&str>,
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send {
        let matches = self.search_vector(embedding, top_k, category);
        debug!(returned = matches.len(), "in-memory vector search");
        std::future::ready(Ok(matches))
    }

    fn keyword_search(
        &self,
        terms: &[String],
    ) -> impl Future<Output = LevyResult<Vec<ChunkMatch>>> + Send {
        let matches = self.search_keyword(terms);
        debug!(terms = terms.len(), returned = matches.len(), "in-memory keyword search");
        std::future::ready(Ok(matches))
    }
}
