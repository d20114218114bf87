//! Interaction log and per-file usage statistics.

use chrono::{DateTime, NaiveDate, Utc};
use faqdesk_core::{BacklogStatus, FaqError};
use rusqlite::{params, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::{conversion_error, format_time, parse_time, DeskDb};

/// How a query was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStatus {
    /// Answered from the knowledge base.
    Success,
    /// Deferred to the backlog.
    NoAnswer,
    /// Processing failed.
    Error,
}

impl InteractionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionStatus::Success => "success",
            InteractionStatus::NoAnswer => "no_answer",
            InteractionStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for InteractionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(InteractionStatus::Success),
            "no_answer" => Ok(InteractionStatus::NoAnswer),
            "error" => Ok(InteractionStatus::Error),
            other => Err(format!("unknown interaction status: {other}")),
        }
    }
}

/// One handled query.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use faqdesk_backlog::{Interaction, InteractionStatus};
///
/// let record = Interaction::new("How do I pair?", InteractionStatus::Success, Utc::now())
///     .with_source_file("device_setup.txt")
///     .with_processing_time_ms(3);
/// assert_eq!(record.source_file.as_deref(), Some("device_setup.txt"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Row id; `None` until stored.
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub query_text: String,
    pub status: InteractionStatus,
    pub source_file: Option<String>,
    pub reasoning: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl Interaction {
    pub fn new(
        query_text: impl Into<String>,
        status: InteractionStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            timestamp,
            query_text: query_text.into(),
            status,
            source_file: None,
            reasoning: None,
            processing_time_ms: None,
        }
    }

    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_processing_time_ms(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }
}

/// Query counts for one knowledge file on one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub file_name: String,
    pub day: NaiveDate,
    pub total_queries: u64,
    pub successful_queries: u64,
    /// Percentage of successful queries; 0 when there were none.
    pub success_rate: f64,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate view over all interactions and the backlog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_interactions: u64,
    pub successful_interactions: u64,
    /// Percentage, rounded to two decimals.
    pub success_rate: f64,
    /// Backlog items still waiting in `pending`.
    pub pending_questions: u64,
    pub generated_at: DateTime<Utc>,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

fn interaction_from_row(row: &Row<'_>) -> rusqlite::Result<Interaction> {
    let timestamp: String = row.get(1)?;
    let status: String = row.get(3)?;
    let ms: Option<i64> = row.get(6)?;
    Ok(Interaction {
        id: Some(row.get(0)?),
        timestamp: parse_time(1, &timestamp)?,
        query_text: row.get(2)?,
        status: status.parse().map_err(|e| conversion_error(3, e))?,
        source_file: row.get(4)?,
        reasoning: row.get(5)?,
        processing_time_ms: ms.map(count),
    })
}

fn file_stat_from_row(row: &Row<'_>) -> rusqlite::Result<FileStat> {
    let day: String = row.get(1)?;
    let total = count(row.get(2)?);
    let successful = count(row.get(3)?);
    let last_updated: String = row.get(4)?;
    Ok(FileStat {
        file_name: row.get(0)?,
        day: day
            .parse::<NaiveDate>()
            .map_err(|e| conversion_error(1, e.to_string()))?,
        total_queries: total,
        successful_queries: successful,
        success_rate: percent(successful, total),
        last_updated: parse_time(4, &last_updated)?,
    })
}

impl DeskDb {
    /// Store an interaction and, when it names a source file, bump that
    /// file's counters for the interaction's UTC day. Returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on write failure; nothing is stored in
    /// that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use faqdesk_backlog::{DeskDb, Interaction, InteractionStatus};
    ///
    /// let mut db = DeskDb::in_memory().unwrap();
    /// let record = Interaction::new("hours?", InteractionStatus::Success, Utc::now())
    ///     .with_source_file("general.txt");
    /// db.log_interaction(&record).unwrap();
    ///
    /// let stats = db.file_stats(Some("general.txt")).unwrap();
    /// assert_eq!(stats[0].total_queries, 1);
    /// assert_eq!(stats[0].success_rate, 100.0);
    /// ```
    pub fn log_interaction(&mut self, record: &Interaction) -> Result<i64, FaqError> {
        let db_err =
            |e: rusqlite::Error| FaqError::Database(format!("failed to log interaction: {e}"));

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;
        tx.execute(
            "INSERT INTO interactions
             (timestamp, query_text, status, source_file, reasoning, processing_time_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                format_time(&record.timestamp),
                record.query_text,
                record.status.as_str(),
                record.source_file,
                record.reasoning,
                record
                    .processing_time_ms
                    .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX)),
            ],
        )
        .map_err(db_err)?;
        let id = tx.last_insert_rowid();

        if let Some(file) = &record.source_file {
            let success = i64::from(record.status == InteractionStatus::Success);
            tx.execute(
                "INSERT INTO file_stats (file_name, day, total_queries, successful_queries, last_updated)
                 VALUES (?1, ?2, 1, ?3, ?4)
                 ON CONFLICT (file_name, day) DO UPDATE SET
                     total_queries = total_queries + 1,
                     successful_queries = successful_queries + excluded.successful_queries,
                     last_updated = excluded.last_updated",
                params![
                    file,
                    record.timestamp.date_naive().to_string(),
                    success,
                    format_time(&record.timestamp),
                ],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        Ok(id)
    }

    /// Most recent interactions first.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    pub fn recent_interactions(&self, limit: usize) -> Result<Vec<Interaction>, FaqError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, query_text, status, source_file, reasoning, processing_time_ms
                 FROM interactions ORDER BY timestamp DESC, id DESC LIMIT ?1",
            )
            .map_err(|e| FaqError::Database(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map(
                params![i64::try_from(limit).unwrap_or(i64::MAX)],
                interaction_from_row,
            )
            .map_err(|e| FaqError::Database(format!("failed to query interactions: {e}")))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| FaqError::Database(format!("failed to read interaction row: {e}")))
    }

    /// Per-day statistics, newest day first; all files when `file_name` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    pub fn file_stats(&self, file_name: Option<&str>) -> Result<Vec<FileStat>, FaqError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT file_name, day, total_queries, successful_queries, last_updated
                 FROM file_stats
                 WHERE ?1 IS NULL OR file_name = ?1
                 ORDER BY day DESC, file_name ASC",
            )
            .map_err(|e| FaqError::Database(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map(params![file_name], file_stat_from_row)
            .map_err(|e| FaqError::Database(format!("failed to query file stats: {e}")))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| FaqError::Database(format!("failed to read file stat row: {e}")))
    }

    /// Totals across all interactions plus the pending backlog size.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    pub fn analytics_summary(&self) -> Result<AnalyticsSummary, FaqError> {
        let (total, successful): (i64, Option<i64>) = self
            .conn
            .query_row(
                "SELECT COUNT(*), SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END) FROM interactions",
                params![InteractionStatus::Success.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| FaqError::Database(format!("failed to summarize interactions: {e}")))?;

        let pending: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM backlog_items WHERE status = ?1",
                params![BacklogStatus::Pending.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| FaqError::Database(format!("failed to count pending questions: {e}")))?;

        let total = count(total);
        let successful = count(successful.unwrap_or(0));
        Ok(AnalyticsSummary {
            total_interactions: total,
            successful_interactions: successful,
            success_rate: percent(successful, total),
            pending_questions: count(pending),
            generated_at: Utc::now(),
        })
    }
}
