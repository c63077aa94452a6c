//! # levy-storage
//!
//! Reference implementations of the stores the decision engine consumes:
//! an in-memory knowledge store, a curated rule table, and outcome caches
//! with atomic read-modify-write (`dashmap` in-process, SQLite durable).

pub mod knowledge_store;
pub mod outcome_cache;
pub mod rule_store;

pub use knowledge_store::InMemoryKnowledgeStore;
pub use outcome_cache::{InMemoryOutcomeCache, SqliteOutcomeCache};
pub use rule_store::InMemoryRuleStore;

use levy_core::errors::StoreError;
use levy_core::LevyError;

/// Convert a SQLite error string into a LevyError.
pub(crate) fn to_sqlite_err(message: impl Into<String>) -> LevyError {
    StoreError::Sqlite {
        message: message.into(),
    }
    .into()
}

pub(crate) fn load_failed(source_name: impl Into<String>, reason: impl ToString) -> LevyError {
    StoreError::LoadFailed {
        source_name: source_name.into(),
        reason: reason.to_string(),
    }
    .into()
}
