//! MCP server setup and lifecycle.
//!
//! Provides [`run_server`] which starts the stdio-based MCP server,
//! registering all faqdesk tools and blocking until the client disconnects.

use std::sync::Arc;

use faqdesk_core::{FaqConfig, FaqError};
use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};

use crate::desk::FaqDesk;
use crate::tools::FaqServer;

const SERVER_INSTRUCTIONS: &str = "\
faqdesk answers customer questions from a curated FAQ knowledge base and \
collects the ones it cannot answer for human review:\n\
- answer_faq: Answer a question, or record it in the backlog when no FAQ entry fits\n\
- list_faq_files: See which FAQ files are loaded and how many questions each holds\n\
- reload_faq_content: Pick up edits to the FAQ files without restarting\n\
- get_analytics_summary: Success rate and pending backlog size\n\
- list_backlog: Unanswered questions, most frequently asked first";

#[tool_handler]
impl ServerHandler for FaqServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "faqdesk".to_string(),
                title: Some("faqdesk FAQ Assistant".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "Lexical FAQ matching with a triaged backlog for unanswered questions"
                        .to_string(),
                ),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}

/// Start the MCP server on stdio transport.
///
/// This is called by the `faqdesk mcp` CLI subcommand. It loads the
/// knowledge base and opens the backlog database named in `config`, then
/// blocks until the client closes stdin.
///
/// # Errors
///
/// Returns [`FaqError`] if the knowledge base or database cannot be opened,
/// or if the server fails to initialize or hits a transport error.
///
/// # Examples
///
/// ```no_run
/// use faqdesk_core::FaqConfig;
///
/// # async fn example() -> Result<(), faqdesk_core::FaqError> {
/// faqdesk_mcp::server::run_server(FaqConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server(config: FaqConfig) -> Result<(), FaqError> {
    let desk = FaqDesk::open(&config)?;
    let server = FaqServer::new(Arc::new(desk));
    tracing::info!("starting MCP server on stdio");

    let service = server
        .serve(stdio())
        .await
        .map_err(|e| FaqError::Config(format!("MCP server failed to start: {e}")))?;

    service
        .waiting()
        .await
        .map_err(|e| FaqError::Config(format!("MCP server error: {e}")))?;

    Ok(())
}
