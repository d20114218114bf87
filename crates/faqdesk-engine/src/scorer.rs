//! Lexical relevance scoring.
//!
//! The score is the fraction of distinct query tokens that also occur in the
//! content, plus a bonus when the whole query appears verbatim, capped at 1.

use std::collections::HashSet;

use faqdesk_core::MatchingConfig;

/// Relevance scorer with a configurable exact-phrase bonus.
///
/// Stateless and `Copy`; safe to share across threads.
///
/// # Examples
///
/// ```
/// use faqdesk_engine::Scorer;
///
/// let scorer = Scorer::default();
/// assert_eq!(scorer.score("reset password", "How to reset your password"), 1.0);
/// assert_eq!(scorer.score("refund policy", "Shipping times"), 0.0);
/// assert_eq!(scorer.score("!!!", "anything"), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    phrase_bonus: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl Scorer {
    /// Scorer with an explicit exact-phrase bonus.
    pub fn new(phrase_bonus: f64) -> Self {
        Self { phrase_bonus }
    }

    /// Scorer using `config.phrase_bonus`.
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(config.phrase_bonus)
    }

    /// Score `query` against `content`, in `[0.0, 1.0]`.
    ///
    /// Returns 0 when the query has no word tokens.
    pub fn score(&self, query: &str, content: &str) -> f64 {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return 0.0;
        }
        let content_tokens = tokenize(content);

        let overlap = query_tokens.intersection(&content_tokens).count();
        let mut score = overlap as f64 / query_tokens.len() as f64;

        if content.to_lowercase().contains(&query.to_lowercase()) {
            score += self.phrase_bonus;
        }

        score.clamp(0.0, 1.0)
    }
}

/// Lowercased set of maximal alphanumeric runs in `text`.
///
/// # Examples
///
/// ```
/// use faqdesk_engine::scorer::tokenize;
///
/// let tokens = tokenize("Wi-Fi won't connect!");
/// assert!(tokens.contains("wi"));
/// assert!(tokens.contains("won"));
/// assert!(tokens.contains("t"));
/// assert_eq!(tokens.len(), 5);
/// ```
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overlap_is_fraction_of_query_tokens() {
        let scorer = Scorer::default();
        // 2 of 4 query tokens present, no verbatim match.
        let score = scorer.score("cancel my premium plan", "premium features and plan tiers");
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_query_words_count_once() {
        let scorer = Scorer::default();
        let score = scorer.score("plan plan plan other", "the plan");
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn verbatim_phrase_adds_bonus() {
        let scorer = Scorer::default();
        // "reset link" fully overlaps (1.0) and appears verbatim; capped at 1.0.
        assert_eq!(scorer.score("reset link", "Use the reset link"), 1.0);

        // No token overlap, but "cat" is a substring of "catalog".
        let score = scorer.score("cat", "browse the catalog");
        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn bonus_requires_case_insensitive_substring() {
        let scorer = Scorer::new(0.3);
        let with = scorer.score("Two Factor", "enable two factor auth and more words");
        assert_eq!(with, 1.0);

        let without = scorer.score("factor two", "enable two factor");
        assert_eq!(without, 1.0);

        let half = scorer.score("factor two sms", "enable two factor");
        assert!((half - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_bonus_disables_phrase_boost() {
        let scorer = Scorer::new(0.0);
        let score = scorer.score("cat", "browse the catalog");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn empty_query_scores_zero() {
        let scorer = Scorer::default();
        assert_eq!(scorer.score("", "anything at all"), 0.0);
        assert_eq!(scorer.score("   ", "   "), 0.0);
        assert_eq!(scorer.score("?!", "?!"), 0.0);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let scorer = Scorer::new(1.0);
        let cases = [
            ("a", "a"),
            ("a b c", ""),
            ("", ""),
            ("hello world", "hello world hello world"),
            ("ünïcödé text", "ÜNÏCÖDÉ TEXT"),
        ];
        for (q, c) in cases {
            let s = scorer.score(q, c);
            assert!((0.0..=1.0).contains(&s), "{q:?} vs {c:?} gave {s}");
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = Scorer::default();
        let a = scorer.score("how do I sync my device", "Device sync runs hourly");
        let b = scorer.score("how do I sync my device", "Device sync runs hourly");
        assert_eq!(a, b);
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        let tokens = tokenize("Hello, WORLD! e-mail 2fa");
        let mut sorted: Vec<_> = tokens.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, vec!["2fa", "e", "hello", "mail", "world"]);
    }
}
