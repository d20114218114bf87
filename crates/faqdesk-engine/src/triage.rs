//! Keyword-rule priority and category assignment.
//!
//! Rules are checked in order with case-insensitive substring containment
//! against the raw question; the first rule with any hit wins.

use faqdesk_core::Priority;

/// Priority rules, most severe first. Anything unmatched is [`Priority::Low`].
pub const PRIORITY_RULES: [(Priority, &[&str]); 3] = [
    (
        Priority::Urgent,
        &[
            "urgent",
            "emergency",
            "critical",
            "broken",
            "down",
            "error",
            "failed",
            "crash",
        ],
    ),
    (
        Priority::High,
        &[
            "billing",
            "payment",
            "subscription",
            "account",
            "login",
            "access",
            "security",
        ],
    ),
    (
        Priority::Medium,
        &["device", "sync", "connection", "setup", "install", "update"],
    ),
];

/// Category rules in evaluation order.
pub const CATEGORY_RULES: [(&str, &[&str]); 6] = [
    (
        "account_management",
        &["account", "profile", "login", "password", "signup", "register"],
    ),
    (
        "billing_payments",
        &["billing", "payment", "subscription", "plan", "charge", "invoice"],
    ),
    (
        "technical_issues",
        &["error", "bug", "broken", "fix", "issue", "problem", "crash"],
    ),
    (
        "device_setup",
        &["device", "setup", "install", "connect", "sync", "pair"],
    ),
    ("mobile_app", &["app", "mobile", "android", "ios", "phone"]),
    (
        "privacy_security",
        &["privacy", "security", "data", "encryption", "safe"],
    ),
];

/// Category used when no rule matches.
pub const DEFAULT_CATEGORY: &str = "general";

/// Priority for a question.
///
/// # Examples
///
/// ```
/// use faqdesk_core::Priority;
/// use faqdesk_engine::triage::classify_priority;
///
/// assert_eq!(classify_priority("urgent: app is broken"), Priority::Urgent);
/// assert_eq!(classify_priority("Update my BILLING address"), Priority::High);
/// assert_eq!(classify_priority("What are your office hours?"), Priority::Low);
/// ```
pub fn classify_priority(question: &str) -> Priority {
    let lower = question.to_lowercase();
    PRIORITY_RULES
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(priority, _)| *priority)
        .unwrap_or(Priority::Low)
}

/// Category for a question.
///
/// # Examples
///
/// ```
/// use faqdesk_engine::triage::classify_category;
///
/// assert_eq!(classify_category("I forgot my password"), "account_management");
/// assert_eq!(classify_category("What are your office hours?"), "general");
/// ```
pub fn classify_category(question: &str) -> &'static str {
    let lower = question.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}
