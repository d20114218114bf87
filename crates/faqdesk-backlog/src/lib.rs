//! SQLite persistence for the faqdesk backlog and interaction analytics.
//!
//! [`DeskDb`] owns the connection and implements
//! [`BacklogRepository`](faqdesk_engine::BacklogRepository) plus the manual
//! backlog workflow. [`BacklogService`] is the shared, thread-safe handle the
//! request layer uses; it serializes deduplication so two identical questions
//! arriving together still land on one backlog item.

pub mod analytics;
pub mod backlog;
pub mod db;
pub mod service;

pub use analytics::{AnalyticsSummary, FileStat, Interaction, InteractionStatus};
pub use backlog::BacklogFilter;
pub use db::DeskDb;
pub use service::BacklogService;
