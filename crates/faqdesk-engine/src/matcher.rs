//! Best-file selection and the answer/defer decision.

use faqdesk_core::{
    Decision, FaqError, KnowledgeBase, KnowledgeFile, MatchResult, MatchingConfig, Relevance,
};

use crate::extractor::extract_answer;
use crate::scorer::Scorer;

/// Match `query` against every file in `kb` and decide whether to answer.
///
/// Files are scored in knowledge-base order against their concatenated
/// entries; the first file with the highest score wins. The query is answered
/// when that score is strictly above `config.answer_threshold`, in which case
/// the answer comes from the file's best-matching entry.
///
/// An empty knowledge base, or a winning file without entries, yields
/// `NO_ANSWER` with a rationale saying so.
///
/// # Errors
///
/// Returns [`FaqError::EmptyQuery`] if `query` is empty or whitespace only.
///
/// # Examples
///
/// ```
/// use faqdesk_core::{Decision, Entry, KnowledgeBase, KnowledgeFile, MatchingConfig, Relevance};
/// use faqdesk_engine::match_query;
///
/// let kb = KnowledgeBase::new(vec![
///     KnowledgeFile::new("billing.txt", vec![
///         Entry::new("What payment methods do you accept?", "Visa, Mastercard and PayPal."),
///     ]),
/// ]);
/// let config = MatchingConfig::default();
///
/// let hit = match_query("payment methods", &kb, &config).unwrap();
/// assert_eq!(hit.decision, Decision::Answer);
/// assert_eq!(hit.relevance, Relevance::High);
/// assert_eq!(hit.answer.as_deref(), Some("Visa, Mastercard and PayPal."));
///
/// let miss = match_query("where is my parcel", &kb, &config).unwrap();
/// assert_eq!(miss.decision, Decision::NoAnswer);
/// assert!(miss.file.is_none());
///
/// assert!(match_query("   ", &kb, &config).is_err());
/// ```
pub fn match_query(
    query: &str,
    kb: &KnowledgeBase,
    config: &MatchingConfig,
) -> Result<MatchResult, FaqError> {
    if query.trim().is_empty() {
        return Err(FaqError::EmptyQuery);
    }

    let scorer = Scorer::from_config(config);

    let Some((best_file, best_score)) = best_file(query, kb, &scorer) else {
        return Ok(no_answer(
            0.0,
            "The knowledge base contains no files to match against.".to_string(),
        ));
    };

    tracing::debug!(
        file = %best_file.name,
        score = best_score,
        "best knowledge file"
    );

    if best_score <= config.answer_threshold {
        return Ok(no_answer(
            best_score,
            format!(
                "No sufficiently relevant content found. Best score was {best_score:.2}, required minimum is {}",
                config.answer_threshold
            ),
        ));
    }

    let Some(answer) = extract_answer(&best_file.entries, query, &scorer) else {
        return Ok(no_answer(
            best_score,
            format!(
                "Best matching file {} has no entries to answer from.",
                best_file.name
            ),
        ));
    };

    Ok(MatchResult {
        decision: Decision::Answer,
        file: Some(best_file.name.clone()),
        score: best_score,
        relevance: relevance_label(best_score, config),
        answer: Some(answer.to_string()),
        rationale: format!(
            "Found relevant content in {} with score {best_score:.2}",
            best_file.name
        ),
    })
}

/// Highest-scoring file and its score; ties keep the earliest file.
///
/// Returns `None` only for an empty knowledge base.
pub fn best_file<'a>(
    query: &str,
    kb: &'a KnowledgeBase,
    scorer: &Scorer,
) -> Option<(&'a KnowledgeFile, f64)> {
    let mut best: Option<(&KnowledgeFile, f64)> = None;

    for file in kb.files() {
        let score = scorer.score(query, &file.content_block());
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((file, score)),
        }
    }

    best
}

/// Relevance band for an answered score.
///
/// # Examples
///
/// ```
/// use faqdesk_core::{MatchingConfig, Relevance};
/// use faqdesk_engine::matcher::relevance_label;
///
/// let config = MatchingConfig::default();
/// assert_eq!(relevance_label(0.81, &config), Relevance::High);
/// assert_eq!(relevance_label(0.8, &config), Relevance::Medium);
/// assert_eq!(relevance_label(0.6, &config), Relevance::Low);
/// ```
pub fn relevance_label(score: f64, config: &MatchingConfig) -> Relevance {
    if score > config.high_relevance {
        Relevance::High
    } else if score > config.medium_relevance {
        Relevance::Medium
    } else {
        Relevance::Low
    }
}

fn no_answer(score: f64, rationale: String) -> MatchResult {
    MatchResult {
        decision: Decision::NoAnswer,
        file: None,
        score,
        relevance: Relevance::Low,
        answer: None,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use faqdesk_core::Entry;

    use super::*;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(vec![
            KnowledgeFile::new(
                "account_management.txt",
                vec![
                    Entry::new(
                        "How do I reset my password?",
                        "Click Forgot Password on the login page.",
                    ),
                    Entry::new("How do I change my email?", "Open Settings > Profile."),
                ],
            ),
            KnowledgeFile::new(
                "billing_payments.txt",
                vec![
                    Entry::new(
                        "What payment methods do you accept?",
                        "We accept Visa, Mastercard and PayPal.",
                    ),
                    Entry::new("How do I cancel my subscription?", "Go to Billing > Plan."),
                ],
            ),
        ])
    }

    #[test]
    fn answers_from_best_file_and_entry() {
        let result = match_query("How do I cancel my subscription?", &kb(), &MatchingConfig::default())
            .unwrap();
        assert_eq!(result.decision, Decision::Answer);
        assert_eq!(result.file.as_deref(), Some("billing_payments.txt"));
        assert_eq!(result.answer.as_deref(), Some("Go to Billing > Plan."));
        assert_eq!(result.relevance, Relevance::High);
        assert!(result.rationale.contains("billing_payments.txt"));
    }

    #[test]
    fn higher_scoring_file_wins_over_earlier_file() {
        // File a holds 6 of the 10 query tokens (0.6), file b holds 9 (0.9).
        let query = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let kb = KnowledgeBase::new(vec![
            KnowledgeFile::new(
                "a.txt",
                vec![Entry::new("alpha beta gamma delta epsilon", "zeta")],
            ),
            KnowledgeFile::new(
                "b.txt",
                vec![Entry::new("kappa iota theta eta zeta epsilon delta gamma", "beta")],
            ),
        ]);
        let scorer = Scorer::default();
        let a = scorer.score(query, &kb.files()[0].content_block());
        let b = scorer.score(query, &kb.files()[1].content_block());
        assert!((a - 0.6).abs() < 1e-9);
        assert!((b - 0.9).abs() < 1e-9);

        let result = match_query(query, &kb, &MatchingConfig::default()).unwrap();
        assert_eq!(result.decision, Decision::Answer);
        assert_eq!(result.file.as_deref(), Some("b.txt"));
        assert_eq!(result.relevance, Relevance::High);
        assert!((result.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_first_file() {
        let kb = KnowledgeBase::new(vec![
            KnowledgeFile::new("first.txt", vec![Entry::new("shipping times", "3 days")]),
            KnowledgeFile::new("second.txt", vec![Entry::new("shipping times", "5 days")]),
        ]);
        let result = match_query("shipping times", &kb, &MatchingConfig::default()).unwrap();
        assert_eq!(result.file.as_deref(), Some("first.txt"));
        assert_eq!(result.answer.as_deref(), Some("3 days"));
    }

    #[test]
    fn score_at_threshold_is_not_answered() {
        // 2 of 4 tokens: exactly 0.5, which must not pass a strict > 0.5 check.
        let kb = KnowledgeBase::new(vec![KnowledgeFile::new(
            "f.txt",
            vec![Entry::new("refund window", "30 days")],
        )]);
        let result = match_query("refund window for laptops", &kb, &MatchingConfig::default())
            .unwrap();
        assert_eq!(result.decision, Decision::NoAnswer);
        assert_eq!(result.relevance, Relevance::Low);
        assert!(result.answer.is_none());
        assert!(result.file.is_none());
        assert!(result.rationale.contains("Best score was 0.50"));
        assert!(result.rationale.contains("required minimum is 0.5"));
    }

    #[test]
    fn threshold_is_configurable() {
        let kb = KnowledgeBase::new(vec![KnowledgeFile::new(
            "f.txt",
            vec![Entry::new("refund window", "30 days")],
        )]);
        let config = MatchingConfig {
            answer_threshold: 0.4,
            ..MatchingConfig::default()
        };
        let result = match_query("refund window for laptops", &kb, &config).unwrap();
        assert_eq!(result.decision, Decision::Answer);
        assert_eq!(result.relevance, Relevance::Low);
    }

    #[test]
    fn medium_band() {
        // 3 of 4 tokens: 0.75.
        let kb = KnowledgeBase::new(vec![KnowledgeFile::new(
            "f.txt",
            vec![Entry::new("reset router settings", "Hold the button.")],
        )]);
        let result = match_query("reset router settings remotely", &kb, &MatchingConfig::default())
            .unwrap();
        assert_eq!(result.relevance, Relevance::Medium);
    }

    #[test]
    fn empty_query_is_an_error_not_no_answer() {
        let err = match_query("", &kb(), &MatchingConfig::default()).unwrap_err();
        assert!(matches!(err, FaqError::EmptyQuery));
        let err = match_query(" \t\n", &kb(), &MatchingConfig::default()).unwrap_err();
        assert!(matches!(err, FaqError::EmptyQuery));
    }

    #[test]
    fn empty_knowledge_base_is_no_answer() {
        let result =
            match_query("anything", &KnowledgeBase::empty(), &MatchingConfig::default()).unwrap();
        assert_eq!(result.decision, Decision::NoAnswer);
        assert_eq!(result.score, 0.0);
        assert!(result.rationale.contains("no files"));
    }

    #[test]
    fn winning_file_without_entries_is_no_answer() {
        // An entry-less file scores 0, so it can only win under a negative
        // threshold, which bypasses config validation.
        let kb = KnowledgeBase::new(vec![KnowledgeFile::new("empty.txt", Vec::new())]);
        let config = MatchingConfig {
            answer_threshold: -0.1,
            ..MatchingConfig::default()
        };
        let result = match_query("x", &kb, &config).unwrap();
        assert_eq!(result.decision, Decision::NoAnswer);
        assert!(result.file.is_none());
        assert!(result.rationale.contains("empty.txt has no entries"));
    }

    #[test]
    fn relevance_label_bands() {
        let config = MatchingConfig::default();
        assert_eq!(relevance_label(1.0, &config), Relevance::High);
        assert_eq!(relevance_label(0.7, &config), Relevance::Medium);
        assert_eq!(relevance_label(0.55, &config), Relevance::Low);
    }
}
