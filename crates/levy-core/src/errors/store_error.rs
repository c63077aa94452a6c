/// Knowledge Store, Rule Store, and Outcome Cache errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{store} unavailable: {reason}")]
    Unavailable { store: String, reason: String },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("failed to load {source_name}: {reason}")]
    LoadFailed { source_name: String, reason: String },
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
