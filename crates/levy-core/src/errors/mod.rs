//! Error types. One enum per subsystem, all wrapped by [`LevyError`].

mod assessment_error;
mod config_error;
mod embedding_error;
mod store_error;

pub use assessment_error::AssessmentError;
pub use config_error::ConfigError;
pub use embedding_error::EmbeddingError;
pub use store_error::StoreError;

/// Result alias used across the workspace.
pub type LevyResult<T> = Result<T, LevyError>;

/// Top-level error for the levy decision engine.
#[derive(Debug, thiserror::Error)]
pub enum LevyError {
    /// The caller violated the input contract (empty query, malformed context).
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("assessment error: {0}")]
    AssessmentError(#[from] AssessmentError),

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("operation cancelled")]
    Cancelled,
}

impl LevyError {
    /// Shorthand for [`LevyError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Timeouts and unavailable collaborators are transient. Contract
    /// violations, malformed records, and cancellation are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::EmbeddingError(e) => e.is_transient(),
            Self::AssessmentError(e) => e.is_transient(),
            Self::StoreError(e) => e.is_transient(),
            Self::InvalidInput { .. } | Self::ConfigError(_) | Self::Cancelled => false,
        }
    }
}
