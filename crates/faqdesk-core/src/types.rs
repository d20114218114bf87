use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FaqError;

/// One question/answer pair from a knowledge file.
///
/// # Examples
///
/// ```
/// use faqdesk_core::Entry;
///
/// let entry = Entry::new("How do I reset my password?", "Use the reset link.");
/// assert_eq!(entry.answer, "Use the reset link.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Question text, whitespace-collapsed.
    pub question: String,
    /// Answer text, whitespace-collapsed.
    pub answer: String,
}

impl Entry {
    /// Create an entry from any string-like question and answer.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A single topic file and its entries, in file order.
///
/// # Examples
///
/// ```
/// use faqdesk_core::{Entry, KnowledgeFile};
///
/// let file = KnowledgeFile::new(
///     "account_management.txt",
///     vec![Entry::new("How do I sign up?", "Click Register.")],
/// );
/// assert_eq!(file.topic(), "Account Management");
/// assert_eq!(file.content_block(), "How do I sign up?\nClick Register.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeFile {
    /// File identifier (the file name, e.g. `billing.txt`).
    pub name: String,
    /// Entries in the order they appear in the file.
    pub entries: Vec<Entry>,
}

impl KnowledgeFile {
    /// Create a knowledge file from its identifier and entries.
    pub fn new(name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// All entries joined into one block: each entry contributes its question
    /// line followed by its answer line.
    pub fn content_block(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}\n{}", e.question, e.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Human-readable topic derived from the file stem:
    /// `device_setup.txt` becomes `Device Setup`.
    pub fn topic(&self) -> String {
        let stem = match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => self.name.as_str(),
        };
        stem.split(['_', '-', ' '])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Ordered collection of knowledge files.
///
/// Immutable once built; a reload produces a whole new `KnowledgeBase`.
///
/// # Examples
///
/// ```
/// use faqdesk_core::{Entry, KnowledgeBase, KnowledgeFile};
///
/// let kb = KnowledgeBase::new(vec![
///     KnowledgeFile::new("a.txt", vec![Entry::new("q1", "a1"), Entry::new("q2", "a2")]),
///     KnowledgeFile::new("b.txt", vec![Entry::new("q3", "a3")]),
/// ]);
/// assert_eq!(kb.len(), 2);
/// assert_eq!(kb.total_entries(), 3);
/// assert!(kb.get("b.txt").is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    files: Vec<KnowledgeFile>,
    /// When this snapshot was built.
    pub loaded_at: DateTime<Utc>,
}

impl KnowledgeBase {
    /// Build a knowledge base from files in iteration order, stamped now.
    pub fn new(files: Vec<KnowledgeFile>) -> Self {
        Self {
            files,
            loaded_at: Utc::now(),
        }
    }

    /// A knowledge base with no files.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Files in iteration order.
    pub fn files(&self) -> &[KnowledgeFile] {
        &self.files
    }

    /// Look up a file by identifier.
    pub fn get(&self, name: &str) -> Option<&KnowledgeFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `true` when there are no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of entries across all files.
    pub fn total_entries(&self) -> usize {
        self.files.iter().map(|f| f.entries.len()).sum()
    }
}

/// Whether a query was answered from the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// A file scored above the answer threshold.
    Answer,
    /// Nothing scored high enough; defer to a human.
    NoAnswer,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Answer => write!(f, "ANSWER"),
            Decision::NoAnswer => write!(f, "NO_ANSWER"),
        }
    }
}

/// Coarse relevance band for a match score.
///
/// # Examples
///
/// ```
/// use faqdesk_core::Relevance;
///
/// assert_eq!(Relevance::High.to_string(), "high");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relevance::High => write!(f, "high"),
            Relevance::Medium => write!(f, "medium"),
            Relevance::Low => write!(f, "low"),
        }
    }
}

/// Outcome of matching one query against the knowledge base.
///
/// `file` and `answer` are always `None` when `decision` is
/// [`Decision::NoAnswer`].
///
/// # Examples
///
/// ```
/// use faqdesk_core::{Decision, MatchResult, Relevance};
///
/// let result = MatchResult {
///     decision: Decision::NoAnswer,
///     file: None,
///     score: 0.2,
///     relevance: Relevance::Low,
///     answer: None,
///     rationale: "Best score was 0.20, required minimum is 0.5".into(),
/// };
/// assert!(!result.is_answer());
/// assert!(result.user_reasoning().starts_with("Could not find"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Answer or defer.
    pub decision: Decision,
    /// Winning file identifier, when answered.
    pub file: Option<String>,
    /// Best file score observed (0.0–1.0).
    pub score: f64,
    /// Relevance band of `score`; always `low` for `NO_ANSWER`.
    pub relevance: Relevance,
    /// Extracted answer text, when answered.
    pub answer: Option<String>,
    /// Explanation of the decision.
    pub rationale: String,
}

impl MatchResult {
    /// `true` when the decision is [`Decision::Answer`].
    pub fn is_answer(&self) -> bool {
        self.decision == Decision::Answer
    }

    /// Rationale phrased for the person who asked.
    pub fn user_reasoning(&self) -> String {
        match (&self.decision, &self.file) {
            (Decision::Answer, Some(file)) => format!(
                "Found relevant information in {file} (relevance: {}). {}",
                self.relevance, self.rationale
            ),
            _ => format!(
                "Could not find sufficiently relevant content. {}",
                self.rationale
            ),
        }
    }
}

/// Workflow state of a backlog item.
///
/// Allowed transitions: `pending → in_progress → answered`, and
/// `pending | in_progress → rejected`.
///
/// # Examples
///
/// ```
/// use faqdesk_core::BacklogStatus;
///
/// let next = BacklogStatus::Pending.transition(BacklogStatus::InProgress).unwrap();
/// assert_eq!(next, BacklogStatus::InProgress);
/// assert!(BacklogStatus::Answered.transition(BacklogStatus::Pending).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacklogStatus {
    Pending,
    InProgress,
    Answered,
    Rejected,
}

impl BacklogStatus {
    /// Statuses the deduplicator considers when looking for duplicates.
    pub const OPEN: [BacklogStatus; 2] = [BacklogStatus::Pending, BacklogStatus::InProgress];

    /// `true` for `pending` and `in_progress`.
    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }

    /// Validate a workflow step from `self` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::InvalidTransition`] for any step outside the
    /// workflow.
    pub fn transition(self, to: BacklogStatus) -> Result<BacklogStatus, FaqError> {
        use BacklogStatus::*;
        match (self, to) {
            (Pending, InProgress) | (InProgress, Answered) | (Pending | InProgress, Rejected) => {
                Ok(to)
            }
            _ => Err(FaqError::InvalidTransition { from: self, to }),
        }
    }

    /// Stable string form used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            BacklogStatus::Pending => "pending",
            BacklogStatus::InProgress => "in_progress",
            BacklogStatus::Answered => "answered",
            BacklogStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BacklogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BacklogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(BacklogStatus::Pending),
            "in_progress" => Ok(BacklogStatus::InProgress),
            "answered" => Ok(BacklogStatus::Answered),
            "rejected" => Ok(BacklogStatus::Rejected),
            other => Err(format!("unknown backlog status: {other}")),
        }
    }
}

/// Triage priority of a backlog item, ordered `Low < Medium < High < Urgent`.
///
/// # Examples
///
/// ```
/// use faqdesk_core::Priority;
///
/// assert!(Priority::Urgent > Priority::High);
/// assert_eq!("medium".parse::<Priority>().unwrap(), Priority::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Stable string form used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A question the knowledge base could not answer, awaiting a human.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use faqdesk_core::{BacklogItem, BacklogStatus, Priority};
///
/// let item = BacklogItem::new(
///     "Can I export invoices?",
///     "can i export invoices",
///     Priority::High,
///     "billing_payments",
///     Utc::now(),
/// );
/// assert_eq!(item.frequency, 1);
/// assert_eq!(item.status, BacklogStatus::Pending);
/// assert_eq!(item.first_seen, item.last_seen);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItem {
    pub id: Uuid,
    /// The question as first asked.
    pub raw_text: String,
    /// Lowercased, punctuation-stripped form used for deduplication.
    pub normalized_text: String,
    /// How many times this question (or a near-duplicate) was asked. Always ≥ 1.
    pub frequency: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: BacklogStatus,
    pub priority: Priority,
    pub category: String,
    pub assignee: Option<String>,
}

impl BacklogItem {
    /// Create a fresh pending item seen once at `now`.
    pub fn new(
        raw_text: impl Into<String>,
        normalized_text: impl Into<String>,
        priority: Priority,
        category: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_text: raw_text.into(),
            normalized_text: normalized_text.into(),
            frequency: 1,
            first_seen: now,
            last_seen: now,
            status: BacklogStatus::Pending,
            priority,
            category: category.into(),
            assignee: None,
        }
    }

    /// Record another occurrence at `now`.
    pub fn record_occurrence(&mut self, now: DateTime<Utc>) {
        self.frequency = self.frequency.saturating_add(1);
        self.last_seen = now;
    }
}

/// Output format for CLI subcommands.
///
/// # Examples
///
/// ```
/// use faqdesk_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
