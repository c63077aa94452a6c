//! Outcome caches with atomic read-modify-write.

mod memory;
mod sqlite;

pub use memory::InMemoryOutcomeCache;
pub use sqlite::SqliteOutcomeCache;

use levy_core::errors::StoreError;
use levy_core::{ContextKey, LevyResult, OutcomeRecord};

/// An update closure must return a record for the key it was given.
pub(crate) fn check_key(key: &ContextKey, record: &OutcomeRecord) -> LevyResult<()> {
    if record.context_key() != key {
        return Err(StoreError::InvalidRecord {
            reason: format!(
                "update for {key} produced a record for {}",
                record.context_key()
            ),
        }
        .into());
    }
    Ok(())
}
