//! Connection handling and schema.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use faqdesk_core::FaqError;
use rusqlite::types::Type;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// How long a connection waits for another process's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite database holding backlog items, interactions, and per-file stats.
///
/// # Examples
///
/// ```
/// use faqdesk_backlog::DeskDb;
///
/// let db = DeskDb::in_memory().unwrap();
/// assert!(db.list_backlog(&Default::default()).unwrap().is_empty());
/// ```
pub struct DeskDb {
    pub(crate) conn: Connection,
}

impl std::fmt::Debug for DeskDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeskDb")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl DeskDb {
    /// Open or create a database at `path`, creating parent directories and
    /// tables as needed.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] if the database cannot be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use faqdesk_backlog::DeskDb;
    ///
    /// let db = DeskDb::open(Path::new(".faqdesk/desk.db")).unwrap();
    /// ```
    pub fn open(path: &Path) -> Result<Self, FaqError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                FaqError::Database(format!("failed to create database directory: {e}"))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| FaqError::Database(format!("failed to open database: {e}")))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| FaqError::Database(format!("failed to set busy timeout: {e}")))?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] if schema creation fails.
    pub fn in_memory() -> Result<Self, FaqError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            FaqError::Database(format!("failed to create in-memory database: {e}"))
        })?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Take the database write lock for the lifetime of the returned
    /// transaction. Other connections, including other processes, block on
    /// their own write until it commits or is dropped.
    ///
    /// Statements issued through `self` while the transaction is live run
    /// inside it.
    pub(crate) fn write_lock(&self) -> Result<Transaction<'_>, FaqError> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|e| FaqError::Database(format!("failed to begin write transaction: {e}")))
    }

    fn init_schema(&self) -> Result<(), FaqError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS backlog_items (
                    id TEXT PRIMARY KEY,
                    raw_text TEXT NOT NULL,
                    normalized_text TEXT NOT NULL,
                    frequency INTEGER NOT NULL DEFAULT 1 CHECK (frequency >= 1),
                    first_seen TEXT NOT NULL,
                    last_seen TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending',
                    priority TEXT NOT NULL DEFAULT 'low',
                    category TEXT NOT NULL DEFAULT 'general',
                    assignee TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_backlog_status ON backlog_items(status);

                CREATE TABLE IF NOT EXISTS interactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    query_text TEXT NOT NULL,
                    status TEXT NOT NULL,
                    source_file TEXT,
                    reasoning TEXT,
                    processing_time_ms INTEGER
                );

                CREATE INDEX IF NOT EXISTS idx_interactions_timestamp ON interactions(timestamp);

                CREATE TABLE IF NOT EXISTS file_stats (
                    file_name TEXT NOT NULL,
                    day TEXT NOT NULL,
                    total_queries INTEGER NOT NULL DEFAULT 0,
                    successful_queries INTEGER NOT NULL DEFAULT 0,
                    last_updated TEXT NOT NULL,
                    PRIMARY KEY (file_name, day)
                );
                ",
            )
            .map_err(|e| FaqError::Database(format!("failed to create schema: {e}")))?;

        Ok(())
    }
}

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that string
/// order matches time order.
pub(crate) fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_time(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Map a `FromStr` failure on column `idx` into a rusqlite conversion error.
pub(crate) fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("desk.db");
        let _db = DeskDb::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn reopening_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db");
        drop(DeskDb::open(&path).unwrap());
        let db = DeskDb::open(&path).unwrap();
        assert_eq!(db.analytics_summary().unwrap().total_interactions, 0);
    }

    #[test]
    fn time_format_round_trips_and_sorts() {
        let earlier = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = earlier + chrono::Duration::milliseconds(1500);
        let (a, b) = (format_time(&earlier), format_time(&later));
        assert!(a < b);
        assert_eq!(parse_time(0, &a).unwrap(), earlier);
    }
}
