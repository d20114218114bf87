//! Request handling shared by the CLI and the MCP tools.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use faqdesk_backlog::{
    AnalyticsSummary, BacklogFilter, BacklogService, Interaction, InteractionStatus,
};
use faqdesk_core::{BacklogItem, Decision, FaqConfig, FaqError, MatchingConfig, Relevance};
use faqdesk_engine::{match_query, TriageOutcome};
use faqdesk_kb::{KnowledgeStore, ReloadReport};
use serde::Serialize;
use uuid::Uuid;

/// Response to a single question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerResponse {
    /// Answered from the knowledge base.
    #[serde(rename_all = "camelCase")]
    Success {
        answer: String,
        source_file: String,
        relevance: Relevance,
        score: f64,
        reasoning: String,
        processing_time_ms: u64,
    },
    /// Deferred; the question was recorded in the backlog.
    #[serde(rename_all = "camelCase")]
    NoAnswer {
        message: String,
        reasoning: String,
        backlog: BacklogRef,
        processing_time_ms: u64,
    },
}

impl AnswerResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, AnswerResponse::Success { .. })
    }
}

/// The backlog item a deferred question landed on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogRef {
    pub id: Uuid,
    pub frequency: u32,
    /// `true` when an existing item absorbed the question.
    pub merged: bool,
}

impl From<&TriageOutcome> for BacklogRef {
    fn from(outcome: &TriageOutcome) -> Self {
        Self {
            id: outcome.item().id,
            frequency: outcome.item().frequency,
            merged: outcome.is_merged(),
        }
    }
}

/// One knowledge file in a [`FileListing`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub filename: String,
    pub qa_count: usize,
    /// Title-cased file stem.
    pub category: String,
}

/// Overview of the current knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub total_files: usize,
    pub total_qa_pairs: usize,
    pub files: Vec<FileSummary>,
    pub last_loaded: DateTime<Utc>,
}

/// Result of a reload request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: ReloadReport,
}

const NO_ANSWER_MESSAGE: &str = "I couldn't find a good answer in the FAQ. \
Your question has been recorded and will be reviewed by the support team.";

/// The faqdesk request layer.
///
/// Owns no global state: the knowledge store and backlog are passed in and
/// may be shared with other front ends.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use faqdesk_backlog::{BacklogService, DeskDb};
/// use faqdesk_core::{Entry, FaqConfig, KnowledgeBase, KnowledgeFile};
/// use faqdesk_kb::KnowledgeStore;
/// use faqdesk_mcp::FaqDesk;
///
/// let config = FaqConfig::default();
/// let kb = KnowledgeBase::new(vec![KnowledgeFile::new(
///     "general.txt",
///     vec![Entry::new("What are your opening hours?", "9am to 5pm, Monday to Friday.")],
/// )]);
/// let desk = FaqDesk::new(
///     &config,
///     Arc::new(KnowledgeStore::with_base(config.knowledge.clone(), kb)),
///     Arc::new(BacklogService::new(DeskDb::in_memory().unwrap(), &config.backlog)),
/// );
///
/// let response = desk.answer("what are your opening hours").unwrap();
/// assert!(response.is_success());
/// ```
#[derive(Debug, Clone)]
pub struct FaqDesk {
    matching: MatchingConfig,
    knowledge: Arc<KnowledgeStore>,
    backlog: Arc<BacklogService>,
}

impl FaqDesk {
    pub fn new(
        config: &FaqConfig,
        knowledge: Arc<KnowledgeStore>,
        backlog: Arc<BacklogService>,
    ) -> Self {
        Self {
            matching: config.matching.clone(),
            knowledge,
            backlog,
        }
    }

    /// Load the knowledge directory and open the backlog database named in
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::FileNotFound`] if the knowledge directory is
    /// missing, or [`FaqError::Database`] if the database cannot be opened.
    pub fn open(config: &FaqConfig) -> Result<Self, FaqError> {
        let knowledge = KnowledgeStore::open(config.knowledge.clone())?;
        let backlog = BacklogService::open(&config.backlog)?;
        Ok(Self::new(config, Arc::new(knowledge), Arc::new(backlog)))
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeStore> {
        &self.knowledge
    }

    pub fn backlog(&self) -> &Arc<BacklogService> {
        &self.backlog
    }

    /// Answer `query` or defer it to the backlog.
    ///
    /// Every call, including a rejected empty query, is recorded as an
    /// interaction. Failing to record analytics is logged and does not fail
    /// the request.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::EmptyQuery`] for an empty or whitespace-only
    /// query, or [`FaqError::Database`] if the backlog cannot be updated.
    pub fn answer(&self, query: &str) -> Result<AnswerResponse, FaqError> {
        let start = Instant::now();
        let kb = self.knowledge.snapshot();

        let result = match match_query(query, &kb, &self.matching) {
            Ok(r) => r,
            Err(e) => {
                self.record(
                    Interaction::new(query, InteractionStatus::Error, Utc::now())
                        .with_reasoning(e.to_string())
                        .with_processing_time_ms(elapsed_ms(start)),
                );
                return Err(e);
            }
        };
        tracing::debug!(query, score = result.score, decision = %result.decision, "matched query");

        let reasoning = result.user_reasoning();
        match (result.decision, result.file, result.answer) {
            (Decision::Answer, Some(file), Some(answer)) => {
                let processing_time_ms = elapsed_ms(start);
                tracing::info!(file = %file, score = result.score, "answered");
                self.record(
                    Interaction::new(query, InteractionStatus::Success, Utc::now())
                        .with_source_file(file.clone())
                        .with_reasoning(reasoning.clone())
                        .with_processing_time_ms(processing_time_ms),
                );
                Ok(AnswerResponse::Success {
                    answer,
                    source_file: file,
                    relevance: result.relevance,
                    score: result.score,
                    reasoning,
                    processing_time_ms,
                })
            }
            _ => {
                let outcome = self.backlog.submit(query)?;
                let processing_time_ms = elapsed_ms(start);
                tracing::info!(score = result.score, backlog_id = %outcome.item().id, "deferred to backlog");
                self.record(
                    Interaction::new(query, InteractionStatus::NoAnswer, Utc::now())
                        .with_reasoning(reasoning.clone())
                        .with_processing_time_ms(processing_time_ms),
                );
                Ok(AnswerResponse::NoAnswer {
                    message: NO_ANSWER_MESSAGE.to_string(),
                    reasoning,
                    backlog: BacklogRef::from(&outcome),
                    processing_time_ms,
                })
            }
        }
    }

    /// Files in the current snapshot.
    pub fn list_files(&self) -> FileListing {
        let kb = self.knowledge.snapshot();
        FileListing {
            total_files: kb.len(),
            total_qa_pairs: kb.total_entries(),
            files: kb
                .files()
                .iter()
                .map(|f| FileSummary {
                    filename: f.name.clone(),
                    qa_count: f.entries.len(),
                    category: f.topic(),
                })
                .collect(),
            last_loaded: kb.loaded_at,
        }
    }

    /// Reload the knowledge directory.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::FileNotFound`] if the directory has disappeared;
    /// the previous snapshot stays active.
    pub fn reload(&self) -> Result<ReloadResponse, FaqError> {
        let report = self.knowledge.reload()?;
        Ok(ReloadResponse {
            message: format!(
                "Reloaded {} FAQ file(s), {} changed",
                report.files_loaded, report.files_changed
            ),
            report,
        })
    }

    /// Interaction totals and pending backlog size.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    pub fn summary(&self) -> Result<AnalyticsSummary, FaqError> {
        self.backlog.with_db(|db| db.analytics_summary())
    }

    /// Backlog items, most frequent first.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Database`] on query failure.
    pub fn list_backlog(&self, filter: &BacklogFilter) -> Result<Vec<BacklogItem>, FaqError> {
        self.backlog.with_db(|db| db.list_backlog(filter))
    }

    fn record(&self, interaction: Interaction) {
        if let Err(e) = self.backlog.with_db(|db| db.log_interaction(&interaction)) {
            tracing::warn!(error = %e, "failed to record interaction");
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
