//! Tool implementations for the faqdesk MCP server.
//!
//! Five tools are exposed: `answer_faq`, `list_faq_files`,
//! `reload_faq_content`, `get_analytics_summary`, and `list_backlog`. Each
//! delegates to [`FaqDesk`] and returns JSON via `CallToolResult`.

use std::sync::Arc;

use faqdesk_backlog::BacklogFilter;
use faqdesk_core::{BacklogStatus, FaqError};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_router, ErrorData as McpError,
};
use serde::{Deserialize, Serialize};

use crate::desk::FaqDesk;

/// Default page size for `list_backlog`.
const DEFAULT_BACKLOG_LIMIT: usize = 20;

/// MCP server exposing faqdesk tools.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use faqdesk_backlog::{BacklogService, DeskDb};
/// use faqdesk_core::{FaqConfig, KnowledgeBase};
/// use faqdesk_kb::KnowledgeStore;
/// use faqdesk_mcp::{tools::FaqServer, FaqDesk};
///
/// let config = FaqConfig::default();
/// let desk = FaqDesk::new(
///     &config,
///     Arc::new(KnowledgeStore::with_base(config.knowledge.clone(), KnowledgeBase::empty())),
///     Arc::new(BacklogService::new(DeskDb::in_memory().unwrap(), &config.backlog)),
/// );
/// let server = FaqServer::new(Arc::new(desk));
/// ```
#[derive(Clone)]
pub struct FaqServer {
    pub(crate) desk: Arc<FaqDesk>,
    pub(crate) tool_router: ToolRouter<Self>,
}

// --- Parameter structs ---

/// Parameters for the `answer_faq` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnswerFaqParams {
    /// The user's question, in free text.
    pub query: String,
}

/// Parameters for the `list_backlog` tool.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListBacklogParams {
    /// Only items in this status: "pending", "in_progress", "answered", or "rejected".
    pub status: Option<String>,
    /// Maximum items (default: 20).
    pub limit: Option<usize>,
}

// --- Response structs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BacklogResponse {
    items: Vec<faqdesk_core::BacklogItem>,
    total: usize,
}

/// Run a blocking desk call off the async runtime's worker threads.
async fn blocking<T, F>(desk: &Arc<FaqDesk>, f: F) -> Result<T, McpError>
where
    T: Send + 'static,
    F: FnOnce(&FaqDesk) -> Result<T, FaqError> + Send + 'static,
{
    let desk = Arc::clone(desk);
    tokio::task::spawn_blocking(move || f(desk.as_ref()))
        .await
        .map_err(|e| McpError::internal_error(format!("task failed: {e}"), None))?
        .map_err(mcp_err)
}

fn mcp_err(e: FaqError) -> McpError {
    match e {
        FaqError::EmptyQuery => McpError::invalid_params(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_result(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| mcp_err(e.into()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl FaqServer {
    /// Create a new server around a request layer.
    pub fn new(desk: Arc<FaqDesk>) -> Self {
        Self {
            desk,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "answer_faq",
        description = "Answer a user question from the FAQ knowledge base. Returns status \"success\" with the answer, source file, and relevance when a file matches well enough; otherwise status \"no_answer\" and records the question in the review backlog. Use this for any customer-facing question."
    )]
    pub async fn answer_faq(
        &self,
        Parameters(params): Parameters<AnswerFaqParams>,
    ) -> Result<CallToolResult, McpError> {
        let response = blocking(&self.desk, move |desk| desk.answer(&params.query)).await?;
        json_result(&response)
    }

    #[tool(
        name = "list_faq_files",
        description = "List the loaded FAQ files with their question counts and topic names. Use this to see what the knowledge base covers."
    )]
    pub fn list_faq_files(&self) -> Result<CallToolResult, McpError> {
        json_result(&self.desk.list_files())
    }

    #[tool(
        name = "reload_faq_content",
        description = "Re-read the FAQ directory and atomically replace the knowledge base. Reports how many files were loaded and how many changed. Use this after editing FAQ files."
    )]
    pub async fn reload_faq_content(&self) -> Result<CallToolResult, McpError> {
        let response = blocking(&self.desk, FaqDesk::reload).await?;
        json_result(&response)
    }

    #[tool(
        name = "get_analytics_summary",
        description = "Get interaction totals, the overall success rate, and the number of pending backlog questions."
    )]
    pub async fn get_analytics_summary(&self) -> Result<CallToolResult, McpError> {
        let summary = blocking(&self.desk, FaqDesk::summary).await?;
        json_result(&summary)
    }

    #[tool(
        name = "list_backlog",
        description = "List unanswered questions from the review backlog, most frequently asked first. Optionally filter by status."
    )]
    pub async fn list_backlog(
        &self,
        Parameters(params): Parameters<ListBacklogParams>,
    ) -> Result<CallToolResult, McpError> {
        let status = params
            .status
            .as_deref()
            .map(str::parse::<BacklogStatus>)
            .transpose()
            .map_err(|e| McpError::invalid_params(e, None))?;
        let filter = BacklogFilter {
            status,
            limit: Some(params.limit.unwrap_or(DEFAULT_BACKLOG_LIMIT)),
        };

        let items = blocking(&self.desk, move |desk| desk.list_backlog(&filter)).await?;
        let total = items.len();
        json_result(&BacklogResponse { items, total })
    }
}
