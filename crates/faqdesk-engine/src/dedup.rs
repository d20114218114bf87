//! Near-duplicate detection for unanswered questions.
//!
//! Questions are normalized to lowercase ASCII words and compared with
//! Jaccard similarity over their word sets. A question close enough to an
//! open backlog item bumps that item's frequency instead of creating a new
//! one.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use faqdesk_core::{BacklogConfig, BacklogItem, FaqError};

use crate::repository::BacklogRepository;
use crate::triage::{classify_category, classify_priority};

/// What happened to an incoming unanswered question.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageOutcome {
    /// Folded into an existing open item; holds the item after the update.
    Merged {
        item: BacklogItem,
        similarity: f64,
    },
    /// No open item was similar enough; a new pending item was triaged.
    Created(BacklogItem),
}

impl TriageOutcome {
    /// The merged or newly created item.
    pub fn item(&self) -> &BacklogItem {
        match self {
            TriageOutcome::Merged { item, .. } | TriageOutcome::Created(item) => item,
        }
    }

    /// Consume the outcome, returning the item.
    pub fn into_item(self) -> BacklogItem {
        match self {
            TriageOutcome::Merged { item, .. } | TriageOutcome::Created(item) => item,
        }
    }

    /// `true` when an existing item absorbed the question.
    pub fn is_merged(&self) -> bool {
        matches!(self, TriageOutcome::Merged { .. })
    }
}

/// Deduplicates unanswered questions against open backlog items.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use faqdesk_engine::Deduplicator;
///
/// let dedup = Deduplicator::default();
/// let mut open = Vec::new();
///
/// let first = dedup.triage("How do I reset my password?", &mut open, Utc::now());
/// assert!(!first.is_merged());
/// open.push(first.into_item());
///
/// let second = dedup.triage("how do i reset my password", &mut open, Utc::now());
/// assert!(second.is_merged());
/// assert_eq!(open[0].frequency, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deduplicator {
    similarity_threshold: f64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::from_config(&BacklogConfig::default())
    }
}

impl Deduplicator {
    /// Deduplicator merging at similarity strictly above `similarity_threshold`.
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Deduplicator using `config.similarity_threshold`.
    pub fn from_config(config: &BacklogConfig) -> Self {
        Self::new(config.similarity_threshold)
    }

    /// Index and similarity of the most similar open candidate, if any.
    ///
    /// Every candidate is scanned; on ties the earliest wins. Candidates that
    /// are not open are ignored. Returns `None` for no open candidates.
    pub fn most_similar(&self, question: &str, candidates: &[BacklogItem]) -> Option<(usize, f64)> {
        let normalized = normalize(question);
        let words = word_set(&normalized);

        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if !candidate.status.is_open() {
                continue;
            }
            let similarity = jaccard(&words, &word_set(&candidate.normalized_text));
            match best {
                Some((_, best_similarity)) if similarity <= best_similarity => {}
                _ => best = Some((idx, similarity)),
            }
        }
        best
    }

    /// Merge `question` into the most similar open item in `open_items`, or
    /// create and classify a new pending item.
    ///
    /// On merge the matching element of `open_items` is updated in place and
    /// a copy is returned. On create nothing in `open_items` changes; the
    /// caller decides where the new item goes.
    pub fn triage(
        &self,
        question: &str,
        open_items: &mut [BacklogItem],
        now: DateTime<Utc>,
    ) -> TriageOutcome {
        if let Some((idx, similarity)) = self.most_similar(question, open_items) {
            if similarity > self.similarity_threshold {
                let item = &mut open_items[idx];
                item.record_occurrence(now);
                return TriageOutcome::Merged {
                    item: item.clone(),
                    similarity,
                };
            }
        }

        TriageOutcome::Created(BacklogItem::new(
            question,
            normalize(question),
            classify_priority(question),
            classify_category(question),
            now,
        ))
    }

    /// Run [`triage`](Self::triage) against a repository and persist the
    /// result: `update` on merge, `insert` on create.
    ///
    /// This is one logical transaction: the repository must keep other
    /// writers out between `find_candidates` and the write.
    ///
    /// # Errors
    ///
    /// Propagates repository failures unchanged.
    pub fn triage_into<R: BacklogRepository>(
        &self,
        question: &str,
        repo: &mut R,
        now: DateTime<Utc>,
    ) -> Result<TriageOutcome, FaqError> {
        let mut candidates = repo.find_candidates()?;
        let outcome = self.triage(question, &mut candidates, now);
        match &outcome {
            TriageOutcome::Merged { item, similarity } => {
                tracing::info!(id = %item.id, frequency = item.frequency, similarity, "merged into backlog item");
                repo.update(item)?;
            }
            TriageOutcome::Created(item) => {
                tracing::info!(id = %item.id, priority = %item.priority, category = %item.category, "created backlog item");
                repo.insert(item)?;
            }
        }
        Ok(outcome)
    }
}

/// Lowercase, drop everything except ASCII letters, digits, and whitespace,
/// and collapse whitespace runs to single spaces.
///
/// # Examples
///
/// ```
/// use faqdesk_engine::dedup::normalize;
///
/// assert_eq!(normalize("  How do I   reset my Password?! "), "how do i reset my password");
/// assert_eq!(normalize("Café\tWi-Fi"), "caf wifi");
/// ```
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-separated words of `text` as a set.
pub fn word_set(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`; 0 when both sets are empty.
///
/// # Examples
///
/// ```
/// use faqdesk_engine::dedup::{jaccard, word_set};
///
/// let a = word_set("reset my password");
/// let b = word_set("reset password now");
/// assert_eq!(jaccard(&a, &b), 0.5);
/// ```
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use faqdesk_core::{BacklogStatus, Priority};

    use super::*;

    #[derive(Default)]
    struct VecRepo {
        items: Vec<BacklogItem>,
        fail_writes: bool,
    }

    impl BacklogRepository for VecRepo {
        fn find_candidates(&self) -> Result<Vec<BacklogItem>, FaqError> {
            Ok(self
                .items
                .iter()
                .filter(|i| i.status.is_open())
                .cloned()
                .collect())
        }

        fn insert(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
            if self.fail_writes {
                return Err(FaqError::Database("disk full".into()));
            }
            self.items.push(item.clone());
            Ok(())
        }

        fn update(&mut self, item: &BacklogItem) -> Result<(), FaqError> {
            if self.fail_writes {
                return Err(FaqError::Database("disk full".into()));
            }
            let slot = self
                .items
                .iter_mut()
                .find(|i| i.id == item.id)
                .ok_or_else(|| FaqError::NotFound(item.id.to_string()))?;
            *slot = item.clone();
            Ok(())
        }
    }

    fn item(text: &str) -> BacklogItem {
        BacklogItem::new(text, normalize(text), Priority::Low, "general", Utc::now())
    }

    #[test]
    fn normalized_duplicate_merges() {
        let dedup = Deduplicator::default();
        let mut open = vec![item("How do I reset my password?")];
        let before = open[0].last_seen;
        let now = before + chrono::Duration::minutes(5);

        let outcome = dedup.triage("how do i reset my password", &mut open, now);

        match outcome {
            TriageOutcome::Merged { item, similarity } => {
                assert_eq!(similarity, 1.0);
                assert_eq!(item.frequency, 2);
                assert_eq!(item.id, open[0].id);
            }
            other => panic!("expected merge, got {other:?}"),
        }
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].frequency, 2);
        assert_eq!(open[0].last_seen, now);
    }

    #[test]
    fn dissimilar_question_creates_triaged_item() {
        let dedup = Deduplicator::default();
        let mut open = vec![item("How do I reset my password?")];
        let now = Utc::now();

        let outcome = dedup.triage("urgent: app is broken", &mut open, now);

        let TriageOutcome::Created(created) = outcome else {
            panic!("expected a new item");
        };
        assert_eq!(created.frequency, 1);
        assert_eq!(created.first_seen, now);
        assert_eq!(created.last_seen, now);
        assert_eq!(created.status, BacklogStatus::Pending);
        assert_eq!(created.priority, Priority::Urgent);
        assert_eq!(created.category, "technical_issues");
        assert_eq!(created.normalized_text, "urgent app is broken");
        assert_eq!(created.raw_text, "urgent: app is broken");
        assert_eq!(open[0].frequency, 1);
    }

    #[test]
    fn similarity_at_threshold_does_not_merge() {
        // 7 shared of 10 distinct words: exactly 0.7.
        let dedup = Deduplicator::default();
        let mut open = vec![item("a b c d e f g h i")];
        let outcome = dedup.triage("a b c d e f g j", &mut open, Utc::now());
        let (_, similarity) = dedup.most_similar("a b c d e f g j", &open).unwrap();
        assert!((similarity - 0.7).abs() < 1e-9);
        assert!(!outcome.is_merged());
    }

    #[test]
    fn best_match_wins_and_first_wins_ties() {
        let dedup = Deduplicator::default();
        let open = vec![
            item("cancel my plan please"),
            item("how do i cancel my plan"),
            item("how do i cancel my plan"),
        ];
        let (idx, similarity) = dedup.most_similar("How do I cancel my plan?", &open).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(similarity, 1.0);
    }

    #[test]
    fn closed_items_are_not_candidates() {
        let dedup = Deduplicator::default();
        let mut answered = item("where is my order");
        answered.status = BacklogStatus::Answered;
        let mut open = vec![answered];
        let outcome = dedup.triage("Where is my order?", &mut open, Utc::now());
        assert!(!outcome.is_merged());
        assert_eq!(open[0].frequency, 1);
    }

    #[test]
    fn in_progress_items_still_merge() {
        let dedup = Deduplicator::default();
        let mut busy = item("where is my order");
        busy.status = BacklogStatus::InProgress;
        let mut open = vec![busy];
        assert!(dedup.triage("where is my order", &mut open, Utc::now()).is_merged());
    }

    #[test]
    fn no_candidates_creates() {
        let dedup = Deduplicator::default();
        let outcome = dedup.triage("anything", &mut [], Utc::now());
        assert!(!outcome.is_merged());
    }

    #[test]
    fn punctuation_only_question_never_merges() {
        let dedup = Deduplicator::default();
        let mut open = vec![item("???")];
        // Both normalize to "": empty union, similarity 0.
        assert!(!dedup.triage("!!!", &mut open, Utc::now()).is_merged());
    }

    #[test]
    fn jaccard_properties() {
        let a = word_set("reset my password");
        let b = word_set("my password expired today");
        let ab = jaccard(&a, &b);
        assert_eq!(ab, jaccard(&b, &a));
        assert!((0.0..=1.0).contains(&ab));
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
        assert_eq!(jaccard(&a, &HashSet::new()), 0.0);
    }

    #[test]
    fn triage_into_persists_create_then_merge() {
        let dedup = Deduplicator::default();
        let mut repo = VecRepo::default();

        let first = dedup
            .triage_into("Can I pay by invoice?", &mut repo, Utc::now())
            .unwrap();
        assert!(!first.is_merged());
        assert_eq!(repo.items.len(), 1);
        assert_eq!(repo.items[0].category, "billing_payments");

        let second = dedup
            .triage_into("can i pay by invoice", &mut repo, Utc::now())
            .unwrap();
        assert!(second.is_merged());
        assert_eq!(repo.items.len(), 1);
        assert_eq!(repo.items[0].frequency, 2);
    }

    #[test]
    fn triage_into_surfaces_storage_failure() {
        let dedup = Deduplicator::default();
        let mut repo = VecRepo {
            fail_writes: true,
            ..VecRepo::default()
        };
        let err = dedup
            .triage_into("brand new question", &mut repo, Utc::now())
            .unwrap_err();
        assert!(matches!(err, FaqError::Database(_)));
    }
}
