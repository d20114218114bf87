//! Backlog item storage and the manual review workflow.

use chrono::{DateTime, Utc};
use faqdesk_core::{BacklogItem, BacklogStatus, FaqError, Priority};
use faqdesk_engine::{BacklogRepository, Deduplicator, TriageOutcome};
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::db::{conversion_error, format_time, parse_time, DeskDb};

const ITEM_COLUMNS: &str = "id, raw_text, normalized_text, frequency, first_seen, last_seen, \
                            status, priority, category, assignee";

/// Which backlog items [`DeskDb::list_backlog`] returns.
///
/// # Examples
///
/// ```
/// use faqdesk_backlog::BacklogFilter;
/// use faqdesk_core::BacklogStatus;
///
/// let filter = BacklogFilter {
///     status: Some(BacklogStatus::Pending),
///     limit: Some(10),
/// };
/// assert_eq!(filter.limit, Some(10));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BacklogFilter {
    /// Only items in this status; `None` for all.
    pub status: Option<BacklogStatus>,
    /// At most this many items.
    pub limit: Option<usize>,
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<BacklogItem> {
    let id: String = row.get(0)?;
    let first_seen: String = row.get(4)?;
    let last_seen: String = row.get(5)?;
    let status: String = row.get(6)?;
    let priority: String = row.get(7)?;

    Ok(BacklogItem {
        id: Uuid::parse_str(&id).map_err(|e| conversion_error(0, e.to_string()))?,
        raw_text: row.get(1)?,
        normalized_text: row.get(2)?,
        frequency: row.get(3)?,
        first_seen: parse_time(4, &first_seen)?,
        last_seen: parse_time(5, &last_seen)?,
        status: status
            .parse::<BacklogStatus>()
            .map_err(|e| conversion_error(6, e))?,
        priority: priority
            .parse::<Priority>()
            .map_err(|e| conversion_error(7, e))?,
        category: row.get(8)?,
        assignee: row.get(9)?,
    })
}

impl DeskDb {
    /// Store a new backlog item.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on insert failure, including a
    /// duplicate id.
    pub fn insert_item(&self, item: &BacklogItem) -> Result<(), FaqError> {
        self.conn
            .execute(
                "INSERT INTO backlog_items
                 (id, raw_text, normalized_text, frequency, first_seen, last_seen,
                  status, priority, category, assignee)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    item.id.to_string(),
                    item.raw_text,
                    item.normalized_text,
                    item.frequency,
                    format_time(&item.first_seen),
                    format_time(&item.last_seen),
                    item.status.as_str(),
                    item.priority.as_str(),
                    item.category,
                    item.assignee,
                ],
            )
            .map_err(|e| FaqError::Database(format!("failed to insert backlog item: {e}")))?;
        Ok(())
    }

    /// Overwrite the mutable fields of an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::NotFound`] if no item has `item.id`, or
    /// [`FaqError::Database`] on update failure.
    pub fn update_item(&self, item: &BacklogItem) -> Result<(), FaqError> {
        let changed = self
            .conn
            .execute(
                "UPDATE backlog_items
                 SET frequency = ?2, last_seen = ?3, status = ?4, priority = ?5,
                     category = ?6, assignee = ?7
                 WHERE id = ?1",
                params![
                    item.id.to_string(),
                    item.frequency,
                    format_time(&item.last_seen),
                    item.status.as_str(),
                    item.priority.as_str(),
                    item.category,
                    item.assignee,
                ],
            )
            .map_err(|e| FaqError::Database(format!("failed to update backlog item: {e}")))?;
        if changed == 0 {
            return Err(FaqError::NotFound(item.id.to_string()));
        }
        Ok(())
    }

    /// Look up an item by id.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    pub fn get_item(&self, id: Uuid) -> Result<Option<BacklogItem>, FaqError> {
        let result = self.conn.query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM backlog_items WHERE id = ?1"),
            params![id.to_string()],
            item_from_row,
        );

        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(FaqError::Database(format!(
                "failed to get backlog item {id}: {e}"
            ))),
        }
    }

    /// Items with status `pending` or `in_progress`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    pub fn open_items(&self) -> Result<Vec<BacklogItem>, FaqError> {
        let [a, b] = BacklogStatus::OPEN;
        self.query_items(
            &format!(
                "SELECT {ITEM_COLUMNS} FROM backlog_items
                 WHERE status IN (?1, ?2)
                 ORDER BY first_seen ASC"
            ),
            params![a.as_str(), b.as_str()],
        )
    }

    /// Backlog items, most frequently asked first, then most recently seen.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use faqdesk_backlog::{BacklogFilter, DeskDb};
    /// use faqdesk_core::{BacklogItem, Priority};
    ///
    /// let db = DeskDb::in_memory().unwrap();
    /// let item = BacklogItem::new("Do you ship abroad?", "do you ship abroad", Priority::Low, "general", Utc::now());
    /// db.insert_item(&item).unwrap();
    ///
    /// let items = db.list_backlog(&BacklogFilter::default()).unwrap();
    /// assert_eq!(items.len(), 1);
    /// ```
    pub fn list_backlog(&self, filter: &BacklogFilter) -> Result<Vec<BacklogItem>, FaqError> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = filter
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        match filter.status {
            Some(status) => self.query_items(
                &format!(
                    "SELECT {ITEM_COLUMNS} FROM backlog_items
                     WHERE status = ?1
                     ORDER BY frequency DESC, last_seen DESC
                     LIMIT ?2"
                ),
                params![status.as_str(), limit],
            ),
            None => self.query_items(
                &format!(
                    "SELECT {ITEM_COLUMNS} FROM backlog_items
                     ORDER BY frequency DESC, last_seen DESC
                     LIMIT ?1"
                ),
                params![limit],
            ),
        }
    }

    fn query_items(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<BacklogItem>, FaqError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| FaqError::Database(format!("failed to prepare query: {e}")))?;
        let rows = stmt
            .query_map(params, item_from_row)
            .map_err(|e| FaqError::Database(format!("failed to query backlog: {e}")))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(
                row.map_err(|e| FaqError::Database(format!("failed to read backlog row: {e}")))?,
            );
        }
        Ok(items)
    }

    /// Start work on an item: `pending → in_progress`, recording the assignee.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::NotFound`] for an unknown id,
    /// [`FaqError::InvalidTransition`] if the item is not pending, or
    /// [`FaqError::Database`] on storage failure.
    pub fn assign(&self, id: Uuid, assignee: &str) -> Result<BacklogItem, FaqError> {
        self.modify(id, |item| {
            item.status = item.status.transition(BacklogStatus::InProgress)?;
            item.assignee = Some(assignee.to_string());
            Ok(())
        })
    }

    /// Mark an in-progress item answered.
    ///
    /// # Errors
    ///
    /// As for [`assign`](Self::assign).
    pub fn resolve(&self, id: Uuid) -> Result<BacklogItem, FaqError> {
        self.modify(id, |item| {
            item.status = item.status.transition(BacklogStatus::Answered)?;
            Ok(())
        })
    }

    /// Reject a pending or in-progress item.
    ///
    /// # Errors
    ///
    /// As for [`assign`](Self::assign).
    pub fn reject(&self, id: Uuid) -> Result<BacklogItem, FaqError> {
        self.modify(id, |item| {
            item.status = item.status.transition(BacklogStatus::Rejected)?;
            Ok(())
        })
    }

    /// Override the triaged priority.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::NotFound`] for an unknown id.
    pub fn set_priority(&self, id: Uuid, priority: Priority) -> Result<BacklogItem, FaqError> {
        self.modify(id, |item| {
            item.priority = priority;
            Ok(())
        })
    }

    /// Override the triaged category.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::NotFound`] for an unknown id.
    pub fn set_category(&self, id: Uuid, category: &str) -> Result<BacklogItem, FaqError> {
        self.modify(id, |item| {
            item.category = category.to_string();
            Ok(())
        })
    }

    /// Deduplicate `question` against the open items and store the merge or
    /// the new item, holding the database write lock throughout.
    ///
    /// Separate connections on the same file, including other `faqdesk`
    /// processes, cannot interleave between the candidate read and the
    /// write, so two of them never both create an item for one question.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on storage failure; nothing is written.
    pub fn triage(
        &self,
        dedup: &Deduplicator,
        question: &str,
        now: DateTime<Utc>,
    ) -> Result<TriageOutcome, FaqError> {
        let tx = self.write_lock()?;
        let outcome = dedup.triage_into(question, &mut Locked(self), now)?;
        tx.commit()
            .map_err(|e| FaqError::Database(format!("failed to commit triage: {e}")))?;
        Ok(outcome)
    }

    fn modify(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut BacklogItem) -> Result<(), FaqError>,
    ) -> Result<BacklogItem, FaqError> {
        let tx = self.write_lock()?;
        let mut item = self
            .get_item(id)?
            .ok_or_else(|| FaqError::NotFound(id.to_string()))?;
        change(&mut item)?;
        self.update_workflow(&item)?;
        tx.commit()
            .map_err(|e| FaqError::Database(format!("failed to commit backlog update: {e}")))?;
        tracing::info!(%id, status = %item.status, priority = %item.priority, "backlog item updated");
        Ok(item)
    }

    /// Write only the reviewer-owned columns; `frequency` and `last_seen`
    /// belong to the deduplicator.
    fn update_workflow(&self, item: &BacklogItem) -> Result<(), FaqError> {
        self.conn
            .execute(
                "UPDATE backlog_items
                 SET status = ?2, priority = ?3, category = ?4, assignee = ?5
                 WHERE id = ?1",
                params![
                    item.id.to_string(),
                    item.status.as_str(),
                    item.priority.as_str(),
                    item.category,
                    item.assignee,
                ],
            )
            .map_err(|e| FaqError::Database(format!("failed to update backlog item: {e}")))?;
        Ok(())
    }
}

/// Repository view used while [`DeskDb::triage`] holds the write lock.
struct Locked<'a>(&'a DeskDb);

impl BacklogRepository for Locked<'_> {
    fn find_candidates(&self) -> Result<Vec<BacklogItem>, FaqError> {
        self.0.open_items()
    }

    fn insert(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
        self.0.insert_item(item)
    }

    fn update(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
        self.0.update_item(item)
    }
}

impl BacklogRepository for DeskDb {
    fn find_candidates(&self) -> Result<Vec<BacklogItem>, FaqError> {
        self.open_items()
    }

    fn insert(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
        self.insert_item(item)
    }

    fn update(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
        self.update_item(item)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn item(text: &str, frequency: u32, minutes_ago: i64) -> BacklogItem {
        let seen = Utc::now() - Duration::minutes(minutes_ago);
        let mut item = BacklogItem::new(text, text.to_lowercase(), Priority::Medium, "general", seen);
        item.frequency = frequency;
        item
    }

    #[test]
    fn insert_then_get_round_trips() {
        let db = DeskDb::in_memory().unwrap();
        let mut original = item("Can I pay by invoice?", 3, 5);
        original.assignee = Some("sam".into());
        original.status = BacklogStatus::InProgress;
        db.insert_item(&original).unwrap();

        let loaded = db.get_item(original.id).unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn get_unknown_item_is_none() {
        let db = DeskDb::in_memory().unwrap();
        assert!(db.get_item(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn update_unknown_item_is_not_found() {
        let db = DeskDb::in_memory().unwrap();
        let err = db.update_item(&item("ghost", 1, 0)).unwrap_err();
        assert!(matches!(err, FaqError::NotFound(_)));
    }

    #[test]
    fn list_orders_by_frequency_then_recency() {
        let db = DeskDb::in_memory().unwrap();
        let rare = item("rare", 1, 0);
        let common_old = item("common old", 5, 60);
        let common_new = item("common new", 5, 1);
        for i in [&rare, &common_old, &common_new] {
            db.insert_item(i).unwrap();
        }

        let listed = db.list_backlog(&BacklogFilter::default()).unwrap();
        let texts: Vec<&str> = listed.iter().map(|i| i.raw_text.as_str()).collect();
        assert_eq!(texts, vec!["common new", "common old", "rare"]);

        let limited = db
            .list_backlog(&BacklogFilter {
                limit: Some(1),
                ..BacklogFilter::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].raw_text, "common new");
    }

    #[test]
    fn list_filters_by_status() {
        let db = DeskDb::in_memory().unwrap();
        let pending = item("pending one", 1, 0);
        db.insert_item(&pending).unwrap();
        let other = item("assigned one", 1, 0);
        db.insert_item(&other).unwrap();
        db.assign(other.id, "alex").unwrap();

        let filter = BacklogFilter {
            status: Some(BacklogStatus::InProgress),
            limit: None,
        };
        let listed = db.list_backlog(&filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, other.id);
        assert_eq!(listed[0].assignee.as_deref(), Some("alex"));
    }

    #[test]
    fn workflow_follows_state_machine() {
        let db = DeskDb::in_memory().unwrap();
        let it = item("how do refunds work", 1, 0);
        db.insert_item(&it).unwrap();

        // Cannot resolve before assignment.
        let err = db.resolve(it.id).unwrap_err();
        assert!(matches!(
            err,
            FaqError::InvalidTransition {
                from: BacklogStatus::Pending,
                to: BacklogStatus::Answered
            }
        ));

        assert_eq!(db.assign(it.id, "kim").unwrap().status, BacklogStatus::InProgress);
        assert_eq!(db.resolve(it.id).unwrap().status, BacklogStatus::Answered);
        assert!(db.reject(it.id).is_err());
        assert_eq!(
            db.get_item(it.id).unwrap().unwrap().status,
            BacklogStatus::Answered
        );
    }

    #[test]
    fn reject_from_pending() {
        let db = DeskDb::in_memory().unwrap();
        let it = item("spam spam spam", 1, 0);
        db.insert_item(&it).unwrap();
        assert_eq!(db.reject(it.id).unwrap().status, BacklogStatus::Rejected);
        assert!(db.open_items().unwrap().is_empty());
    }

    #[test]
    fn priority_and_category_overrides() {
        let db = DeskDb::in_memory().unwrap();
        let it = item("export my data", 1, 0);
        db.insert_item(&it).unwrap();

        db.set_priority(it.id, Priority::Urgent).unwrap();
        db.set_category(it.id, "privacy_security").unwrap();

        let loaded = db.get_item(it.id).unwrap().unwrap();
        assert_eq!(loaded.priority, Priority::Urgent);
        assert_eq!(loaded.category, "privacy_security");
        assert_eq!(loaded.status, BacklogStatus::Pending);
    }

    #[test]
    fn workflow_on_unknown_id_is_not_found() {
        let db = DeskDb::in_memory().unwrap();
        assert!(matches!(
            db.assign(Uuid::new_v4(), "x").unwrap_err(),
            FaqError::NotFound(_)
        ));
    }

    #[test]
    fn workflow_updates_do_not_drop_concurrent_merges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.db");
        let intake = DeskDb::open(&path).unwrap();
        let dedup = Deduplicator::default();
        let question = "is there a family plan";
        let id = intake.triage(&dedup, question, Utc::now()).unwrap().item().id;

        let reviewer_path = path.clone();
        let reviewer = std::thread::spawn(move || {
            let db = DeskDb::open(&reviewer_path).unwrap();
            for round in 0..50 {
                let priority = if round % 2 == 0 { Priority::High } else { Priority::Low };
                db.set_priority(id, priority).unwrap();
            }
        });
        for _ in 0..50 {
            intake.triage(&dedup, question, Utc::now()).unwrap();
        }
        reviewer.join().unwrap();

        let stored = intake.get_item(id).unwrap().unwrap();
        assert_eq!(stored.frequency, 51);
        assert_eq!(stored.priority, Priority::Low);
    }

    #[test]
    fn triage_merges_within_one_connection() {
        let db = DeskDb::in_memory().unwrap();
        let dedup = Deduplicator::default();
        let first = db.triage(&dedup, "Can I change my plan?", Utc::now()).unwrap();
        let second = db.triage(&dedup, "can i change my plan", Utc::now()).unwrap();

        assert!(!first.is_merged());
        assert!(second.is_merged());
        let items = db.list_backlog(&BacklogFilter::default()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].frequency, 2);
    }

    #[test]
    fn candidates_exclude_closed_items() {
        let mut db = DeskDb::in_memory().unwrap();
        let open = item("open", 1, 0);
        let closed = item("closed", 1, 0);
        db.insert(&open).unwrap();
        db.insert(&closed).unwrap();
        db.reject(closed.id).unwrap();

        let candidates = db.find_candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, open.id);
    }
}
