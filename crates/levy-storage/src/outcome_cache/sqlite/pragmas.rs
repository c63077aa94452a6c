//! PRAGMA configuration for file-backed outcome caches.
//!
//! WAL mode, NORMAL sync, 5s busy_timeout so concurrent writers wait for
//! the `BEGIN IMMEDIATE` lock instead of failing.

use rusqlite::Connection;

use levy_core::LevyResult;

use crate::to_sqlite_err;

pub fn apply_pragmas(conn: &Connection) -> LevyResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .map_err(|e| to_sqlite_err(e.to_string()))?;
    Ok(())
}
