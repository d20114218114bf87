//! Persistence seam for backlog items.

use faqdesk_core::{BacklogItem, FaqError};

/// Storage the deduplicator reads candidates from and writes results to.
///
/// Implementations surface storage failures as [`FaqError::Database`]; the
/// engine never opens a connection itself.
pub trait BacklogRepository {
    /// All items whose status is `pending` or `in_progress`.
    fn find_candidates(&self) -> Result<Vec<BacklogItem>, FaqError>;

    /// Persist a newly created item.
    fn insert(&mut self, item: &BacklogItem) -> Result<(), FaqError>;

    /// Persist changes to an existing item, matched by id.
    fn update(&mut self, item: &BacklogItem) -> Result<(), FaqError>;
}

impl<R: BacklogRepository + ?Sized> BacklogRepository for &mut R {
    fn find_candidates(&self) -> Result<Vec<BacklogItem>, FaqError> {
        (**self).find_candidates()
    }

    fn insert(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
        (**self).insert(item)
    }

    fn update(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
        (**self).update(item)
    }
}
