//! Best-entry selection inside a single knowledge file.

use faqdesk_core::Entry;

use crate::scorer::Scorer;

/// Pick the entry whose question best matches `query`.
///
/// Only question text is scored. Ties keep the earliest entry. When every
/// entry scores zero the first entry is returned as a fallback, so this only
/// yields `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use faqdesk_core::Entry;
/// use faqdesk_engine::{extractor::best_entry, Scorer};
///
/// let entries = vec![
///     Entry::new("What payment methods do you accept?", "Visa and Mastercard."),
///     Entry::new("How do I update my card?", "Go to Billing > Cards."),
/// ];
/// let best = best_entry(&entries, "update card", &Scorer::default()).unwrap();
/// assert_eq!(best.answer, "Go to Billing > Cards.");
///
/// // Nothing overlaps: fall back to the first entry.
/// let fallback = best_entry(&entries, "zebra", &Scorer::default()).unwrap();
/// assert_eq!(fallback.answer, "Visa and Mastercard.");
/// ```
pub fn best_entry<'a>(entries: &'a [Entry], query: &str, scorer: &Scorer) -> Option<&'a Entry> {
    let mut best: Option<&Entry> = None;
    let mut best_score = 0.0;

    for entry in entries {
        let score = scorer.score(query, &entry.question);
        if score > best_score {
            best_score = score;
            best = Some(entry);
        }
    }

    best.or_else(|| entries.first())
}

/// Answer text of [`best_entry`].
pub fn extract_answer<'a>(entries: &'a [Entry], query: &str, scorer: &Scorer) -> Option<&'a str> {
    best_entry(entries, query, scorer).map(|e| e.answer.as_str())
}
