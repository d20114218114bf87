//! Knowledge-base loading and hot reload.
//!
//! [`loader`] turns a directory of `Q:`/`A:` text files into a
//! [`KnowledgeBase`](faqdesk_core::KnowledgeBase); [`store`] keeps the current
//! base behind an atomically swappable snapshot.

pub mod loader;
pub mod store;

pub use loader::{load_directory, parse_entries};
pub use store::{KnowledgeStore, ReloadReport};
