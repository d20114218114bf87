use std::path::PathBuf;

use crate::types::BacklogStatus;

/// Errors that can occur across faqdesk.
///
/// Library crates use this type directly; the binary crate converts to
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use faqdesk_core::FaqError;
///
/// let err = FaqError::Config("answer_threshold out of range".into());
/// assert!(err.to_string().contains("answer_threshold"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum FaqError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(faqdesk::config),
        help("run `faqdesk init` to write a default .faqdesk.toml")
    )]
    Config(String),

    /// The query was empty or whitespace only.
    #[error("query cannot be empty")]
    #[diagnostic(code(faqdesk::empty_query))]
    EmptyQuery,

    /// Backlog or analytics persistence failure.
    #[error("database error: {0}")]
    Database(String),

    /// Knowledge-base content could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file or directory was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A backlog status change that the workflow does not allow.
    #[error("invalid backlog transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status of the item.
        from: BacklogStatus,
        /// Requested status.
        to: BacklogStatus,
    },

    /// A backlog item with the given id does not exist.
    #[error("backlog item not found: {0}")]
    NotFound(String),
}
