/// Assessment Service errors (assess, rerank, expand).
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("assessment service unavailable during {operation}: {reason}")]
    Unavailable { operation: String, reason: String },

    #[error("relevance score {score} outside [0, 1]")]
    InvalidScore { score: f64 },

    #[error("malformed assessment response: {reason}")]
    MalformedResponse { reason: String },
}

impl AssessmentError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
