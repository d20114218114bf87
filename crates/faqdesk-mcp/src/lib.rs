//! Request layer and MCP server for faqdesk.
//!
//! [`desk::FaqDesk`] wires the knowledge store, matcher, and backlog together
//! and produces the JSON-shaped responses shared by the CLI and the MCP
//! tools. [`server::run_server`] exposes those operations as `answer_faq`,
//! `list_faq_files`, `reload_faq_content`, `get_analytics_summary`, and
//! `list_backlog` over stdio.
//!
//! # Examples
//!
//! ```no_run
//! use faqdesk_core::FaqConfig;
//!
//! # async fn example() -> Result<(), faqdesk_core::FaqError> {
//! faqdesk_mcp::server::run_server(FaqConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod desk;
pub mod server;
pub mod tools;

pub use desk::FaqDesk;
