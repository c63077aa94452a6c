/// Embedding Service errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding service returned an empty vector")]
    EmptyEmbedding,
}

impl EmbeddingError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
