//! Durable outcome cache on SQLite.
//!
//! `update` runs inside a `BEGIN IMMEDIATE` transaction, so concurrent
//! writers (threads or processes sharing the file) serialize on the write
//! lock and no counter increment is lost. Every trait operation runs on the
//! blocking pool; the returned future only awaits it, so a caller's timeout
//! or cancellation can abandon a slow lock without stalling a runtime worker.

mod pragmas;
mod schema;

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use levy_core::errors::StoreError;
use levy_core::traits::IOutcomeCache;
use levy_core::{ContextKey, LevyResult, OutcomeRecord};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::check_key;
use crate::to_sqlite_err;

pub struct SqliteOutcomeCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOutcomeCache {
    /// Open (or create) the cache at `path`.
    pub fn open(path: impl AsRef<Path>) -> LevyResult<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| to_sqlite_err(e.to_string()))?;
        pragmas::apply_pragmas(&conn)?;
        Self::initialize(conn)
    }

    /// In-memory database (for testing).
    pub fn open_in_memory() -> LevyResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_sqlite_err(e.to_string()))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> LevyResult<Self> {
        schema::create_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn count(&self) -> LevyResult<u64> {
        let conn = lock(&self.conn)?;
        conn.query_row("SELECT COUNT(*) FROM outcome_records", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n.max(0) as u64)
        .map_err(|e| to_sqlite_err(e.to_string()))
    }

    /// Run `op` against the connection on the blocking pool.
    fn blocking<T, F>(&self, op: F) -> impl Future<Output = LevyResult<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> LevyResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        async move {
            tokio::task::spawn_blocking(move || {
                let mut conn = lock(&conn)?;
                op(&mut conn)
            })
            .await
            .map_err(|e| to_sqlite_err(format!("blocking task failed: {e}")))?
        }
    }
}

fn lock(conn: &Mutex<Connection>) -> LevyResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| {
        StoreError::Unavailable {
            store: "sqlite outcome cache".into(),
            reason: "connection mutex poisoned".into(),
        }
        .into()
    })
}

fn update_record<F>(conn: &mut Connection, key: &ContextKey, apply: F) -> LevyResult<OutcomeRecord>
where
    F: FnOnce(Option<&OutcomeRecord>) -> OutcomeRecord,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| to_sqlite_err(format!("update begin: {e}")))?;

    let current = read_record(&tx, key)?;
    let updated = apply(current.as_ref());
    check_key(key, &updated)?;
    write_record(&tx, &updated)?;

    tx.commit()
        .map_err(|e| to_sqlite_err(format!("update commit: {e}")))?;
    debug!(
        context_key = %key,
        times_applied = updated.times_applied(),
        "outcome record updated"
    );
    Ok(updated)
}

fn read_record(conn: &Connection, key: &ContextKey) -> LevyResult<Option<OutcomeRecord>> {
    let row = conn
        .query_row(
            "SELECT confidence, outcome_summary, times_applied, times_validated,
                    recency_signal, last_updated
             FROM outcome_records WHERE context_key = ?1",
            params![key.as_str()],
            |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_sqlite_err(e.to_string()))?;

    let Some((confidence, summary, applied, validated, recency, updated)) = row else {
        return Ok(None);
    };
    let last_updated = DateTime::parse_from_rfc3339(&updated)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidRecord {
            reason: format!("{key}: bad last_updated {updated:?}: {e}"),
        })?;
    let counter = |value: i64, name: &str| {
        u64::try_from(value).map_err(|_| StoreError::InvalidRecord {
            reason: format!("{key}: negative {name}"),
        })
    };

    OutcomeRecord::from_parts(
        key.clone(),
        confidence,
        summary,
        counter(applied, "times_applied")?,
        counter(validated, "times_validated")?,
        recency,
        last_updated,
    )
    .map(Some)
}

fn write_record(conn: &Connection, record: &OutcomeRecord) -> LevyResult<()> {
    let applied = i64::try_from(record.times_applied()).map_err(|_| StoreError::InvalidRecord {
        reason: "times_applied overflows i64".into(),
    })?;
    let validated =
        i64::try_from(record.times_validated()).map_err(|_| StoreError::InvalidRecord {
            reason: "times_validated overflows i64".into(),
        })?;
    conn.execute(
        "INSERT INTO outcome_records (
            context_key, confidence, outcome_summary, times_applied,
            times_validated, recency_signal, last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(context_key) DO UPDATE SET
            confidence = excluded.confidence,
            outcome_summary = excluded.outcome_summary,
            times_applied = excluded.times_applied,
            times_validated = excluded.times_validated,
            recency_signal = excluded.recency_signal,
            last_updated = excluded.last_updated",
        params![
            record.context_key().as_str(),
            record.confidence().value(),
            record.outcome_summary(),
            applied,
            validated,
            record.recency_signal(),
            record.last_updated().to_rfc3339(),
        ],
    )
    .map_err(|e| to_sqlite_err(format!("write outcome record: {e}")))?;
    Ok(())
}

impl IOutcomeCache for SqliteOutcomeCache {
    fn get(
        &self,
        key: &ContextKey,
    ) -> impl Future<Output = LevyResult<Option<OutcomeRecord>>> + Send {
        let key = key.clone();
        self.blocking(move |conn| read_record(conn, &key))
    }

    fn put(&self, record: OutcomeRecord) -> impl Future<Output = LevyResult<()>> + Send {
        self.blocking(move |conn| write_record(conn, &record))
    }

    fn update<F>(
        &self,
        key: &ContextKey,
        apply: F,
    ) -> impl Future<Output = LevyResult<OutcomeRecord>> + Send
    where
        F: FnOnce(Option<&OutcomeRecord>) -> OutcomeRecord + Send + 'static,
    {
        let key = key.clone();
        self.blocking(move |conn| update_record(conn, &key, apply))
    }
}
