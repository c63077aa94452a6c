use rusqlite::Connection;

use levy_core::LevyResult;

use crate::to_sqlite_err;

pub fn create_tables(conn: &Connection) -> LevyResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS outcome_records (
            context_key     TEXT PRIMARY KEY,
            confidence      REAL NOT NULL CHECK (confidence BETWEEN 0.0 AND 1.0),
            outcome_summary TEXT NOT NULL DEFAULT '',
            times_applied   INTEGER NOT NULL CHECK (times_applied >= 0),
            times_validated INTEGER NOT NULL
                CHECK (times_validated >= 0 AND times_validated <= times_applied),
            recency_signal  REAL NOT NULL CHECK (recency_signal BETWEEN 0.0 AND 1.0),
            last_updated    TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| to_sqlite_err(format!("create outcome_records: {e}")))?;
    Ok(())
}
