//! Core types, configuration, and error handling for faqdesk.
//!
//! This crate provides the shared foundation used by all other faqdesk crates:
//! - [`FaqError`] — unified error type using `thiserror`
//! - [`FaqConfig`] — configuration loaded from `.faqdesk.toml`
//! - Shared types: [`Entry`], [`KnowledgeFile`], [`KnowledgeBase`], [`MatchResult`],
//!   [`BacklogItem`], [`BacklogStatus`], [`Priority`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{BacklogConfig, FaqConfig, KnowledgeConfig, MatchingConfig};
pub use error::FaqError;
pub use types::{
    BacklogItem, BacklogStatus, Decision, Entry, KnowledgeBase, KnowledgeFile, MatchResult,
    OutputFormat, Priority, Relevance,
};

/// A convenience `Result` type for faqdesk operations.
pub type Result<T> = std::result::Result<T, FaqError>;
