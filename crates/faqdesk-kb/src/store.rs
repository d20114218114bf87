//! Atomically reloadable knowledge-base snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use faqdesk_core::{FaqError, KnowledgeBase, KnowledgeConfig};
use serde::Serialize;

use crate::loader::load_directory;

/// Result of a [`KnowledgeStore::reload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadReport {
    /// Files in the new snapshot.
    pub files_loaded: usize,
    /// Files added, removed, or with different entries compared to the
    /// previous snapshot.
    pub files_changed: usize,
    /// When the new snapshot was built.
    pub reload_time: DateTime<Utc>,
}

/// Holds the current [`KnowledgeBase`] and swaps it as a whole on reload.
///
/// Readers take an `Arc` snapshot and keep using it for the rest of their
/// matching pass, so a concurrent reload never exposes a half-built base.
///
/// # Examples
///
/// ```
/// use faqdesk_core::{Entry, KnowledgeBase, KnowledgeConfig, KnowledgeFile};
/// use faqdesk_kb::KnowledgeStore;
///
/// let store = KnowledgeStore::with_base(KnowledgeConfig::default(), KnowledgeBase::empty());
/// let before = store.snapshot();
///
/// store.replace(KnowledgeBase::new(vec![KnowledgeFile::new(
///     "a.txt",
///     vec![Entry::new("q", "a")],
/// )]));
///
/// assert!(before.is_empty());
/// assert_eq!(store.snapshot().len(), 1);
/// ```
#[derive(Debug)]
pub struct KnowledgeStore {
    config: KnowledgeConfig,
    current: RwLock<Arc<KnowledgeBase>>,
}

impl KnowledgeStore {
    /// Load `config.directory` and wrap the result.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::FileNotFound`] if the directory does not exist.
    pub fn open(config: KnowledgeConfig) -> Result<Self, FaqError> {
        let kb = load_directory(&config)?;
        Ok(Self::with_base(config, kb))
    }

    /// Wrap an already built knowledge base. `config` is used by later
    /// reloads.
    pub fn with_base(config: KnowledgeConfig, kb: KnowledgeBase) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(kb)),
        }
    }

    /// The knowledge-base settings reloads read from.
    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<KnowledgeBase> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in `kb`, returning the previous snapshot.
    pub fn replace(&self, kb: KnowledgeBase) -> Arc<KnowledgeBase> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(kb))
    }

    /// Re-read the knowledge directory and swap the new base in.
    ///
    /// Parsing happens before the write lock is taken. On error the current
    /// snapshot is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::FileNotFound`] if the directory has disappeared.
    pub fn reload(&self) -> Result<ReloadReport, FaqError> {
        let fresh = load_directory(&self.config)?;
        let files_loaded = fresh.len();
        let reload_time = fresh.loaded_at;
        let files_changed = count_changed(&self.snapshot(), &fresh);

        self.replace(fresh);

        tracing::info!(files_loaded, files_changed, "knowledge base reloaded");
        Ok(ReloadReport {
            files_loaded,
            files_changed,
            reload_time,
        })
    }
}

fn count_changed(old: &KnowledgeBase, new: &KnowledgeBase) -> usize {
    let modified_or_added = new
        .files()
        .iter()
        .filter(|f| old.get(&f.name) != Some(*f))
        .count();
    let removed = old
        .files()
        .iter()
        .filter(|f| new.get(&f.name).is_none())
        .count();
    modified_or_added + removed
}
