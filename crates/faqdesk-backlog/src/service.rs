//! Thread-safe front door to the desk database.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use faqdesk_core::{BacklogConfig, FaqError};
use faqdesk_engine::{Deduplicator, TriageOutcome};

use crate::db::DeskDb;

/// Shared handle over a [`DeskDb`].
///
/// Threads share one connection behind a mutex. Each submission runs as
/// one immediate SQLite transaction, so concurrent submissions of the same
/// new question, from this process or another one on the same file,
/// produce one backlog item whose frequency counts every submission.
///
/// # Examples
///
/// ```
/// use faqdesk_backlog::{BacklogService, DeskDb};
/// use faqdesk_core::BacklogConfig;
///
/// let service = BacklogService::new(DeskDb::in_memory().unwrap(), &BacklogConfig::default());
/// let first = service.submit("Do you ship to Canada?").unwrap();
/// let second = service.submit("do you ship to canada").unwrap();
/// assert!(!first.is_merged());
/// assert!(second.is_merged());
/// assert_eq!(second.item().frequency, 2);
/// ```
#[derive(Debug)]
pub struct BacklogService {
    db: Mutex<DeskDb>,
    dedup: Deduplicator,
}

impl BacklogService {
    /// Wrap an open database.
    pub fn new(db: DeskDb, config: &BacklogConfig) -> Self {
        Self {
            db: Mutex::new(db),
            dedup: Deduplicator::from_config(config),
        }
    }

    /// Open `config.database` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] if the database cannot be opened.
    pub fn open(config: &BacklogConfig) -> Result<Self, FaqError> {
        let db = DeskDb::open(&config.database)?;
        Ok(Self::new(db, config))
    }

    /// Deduplicate and triage an unanswered question into the backlog.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] if reading candidates or writing the
    /// result fails.
    pub fn submit(&self, question: &str) -> Result<TriageOutcome, FaqError> {
        self.lock().triage(&self.dedup, question, Utc::now())
    }

    /// Run `f` with exclusive access to the database.
    pub fn with_db<T>(&self, f: impl FnOnce(&mut DeskDb) -> T) -> T {
        let mut db = self.lock();
        f(&mut db)
    }

    fn lock(&self) -> MutexGuard<'_, DeskDb> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
