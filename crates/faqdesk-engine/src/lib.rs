//! Deterministic decision engine for faqdesk.
//!
//! Scores a free-text question against knowledge files, picks the best file
//! and entry, and, when nothing is good enough, deduplicates and triages the
//! question into a backlog. Everything here is pure apart from the
//! [`repository::BacklogRepository`] seam, which persistence crates implement.
//!
//! # Examples
//!
//! ```
//! use faqdesk_core::{Decision, Entry, KnowledgeBase, KnowledgeFile, MatchingConfig};
//! use faqdesk_engine::matcher::match_query;
//!
//! let kb = KnowledgeBase::new(vec![KnowledgeFile::new(
//!     "account.txt",
//!     vec![Entry::new("How do I reset my password?", "Use the reset link on the login page.")],
//! )]);
//! let result = match_query("reset my password", &kb, &MatchingConfig::default()).unwrap();
//! assert_eq!(result.decision, Decision::Answer);
//! ```

pub mod dedup;
pub mod extractor;
pub mod matcher;
pub mod repository;
pub mod scorer;
pub mod triage;

pub use dedup::{Deduplicator, TriageOutcome};
pub use matcher::match_query;
pub use repository::BacklogRepository;
pub use scorer::Scorer;
