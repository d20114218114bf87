use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FaqError;

/// Top-level configuration loaded from `.faqdesk.toml`.
///
/// Every field has a serde default, so an empty file is a valid config.
///
/// # Examples
///
/// ```
/// use faqdesk_core::FaqConfig;
///
/// let config = FaqConfig::default();
/// assert_eq!(config.matching.answer_threshold, 0.5);
/// assert_eq!(config.backlog.similarity_threshold, 0.7);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqConfig {
    /// Where the knowledge-base files live.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Scoring thresholds for the file matcher.
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Backlog deduplication and storage settings.
    #[serde(default)]
    pub backlog: BacklogConfig,
}

impl FaqConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::FileNotFound`] if `path` does not exist,
    /// [`FaqError::Io`] if it cannot be read, [`FaqError::Toml`] if the
    /// content is not valid TOML, or [`FaqError::Config`] if a value fails
    /// validation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use faqdesk_core::FaqConfig;
    /// use std::path::Path;
    ///
    /// let config = FaqConfig::from_file(Path::new(".faqdesk.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, FaqError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FaqError::FileNotFound(path.to_path_buf()),
            _ => FaqError::Io(e),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Toml`] if parsing fails or [`FaqError::Config`]
    /// if a threshold is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use faqdesk_core::FaqConfig;
    ///
    /// let toml = r#"
    /// [matching]
    /// answer_threshold = 0.4
    /// "#;
    /// let config = FaqConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.matching.answer_threshold, 0.4);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, FaqError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold lies in `[0, 1]` and that the relevance
    /// bands are ordered.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::Config`] naming the offending key.
    pub fn validate(&self) -> Result<(), FaqError> {
        let unit = [
            ("matching.answer_threshold", self.matching.answer_threshold),
            ("matching.high_relevance", self.matching.high_relevance),
            ("matching.medium_relevance", self.matching.medium_relevance),
            ("matching.phrase_bonus", self.matching.phrase_bonus),
            (
                "backlog.similarity_threshold",
                self.backlog.similarity_threshold,
            ),
        ];
        for (key, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(FaqError::Config(format!(
                    "{key} must be between 0 and 1, got {value}"
                )));
            }
        }
        if self.matching.medium_relevance > self.matching.high_relevance {
            return Err(FaqError::Config(format!(
                "matching.medium_relevance ({}) must not exceed matching.high_relevance ({})",
                self.matching.medium_relevance, self.matching.high_relevance
            )));
        }
        if self.knowledge.extension.trim().is_empty() {
            return Err(FaqError::Config(
                "knowledge.extension must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Knowledge-base location.
///
/// # Examples
///
/// ```
/// use faqdesk_core::KnowledgeConfig;
///
/// let config = KnowledgeConfig::default();
/// assert_eq!(config.extension, "txt");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory scanned (non-recursively) for knowledge files (default: `faq`).
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// File extension of knowledge files, without the dot (default: `txt`).
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_directory() -> PathBuf {
    PathBuf::from("faq")
}

fn default_extension() -> String {
    "txt".into()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            extension: default_extension(),
        }
    }
}

/// Thresholds used by the file matcher and relevance scorer.
///
/// The defaults are inherited tuning values with no recorded derivation;
/// treat them as starting points rather than validated constants.
///
/// # Examples
///
/// ```
/// use faqdesk_core::MatchingConfig;
///
/// let config = MatchingConfig::default();
/// assert_eq!(config.high_relevance, 0.8);
/// assert_eq!(config.medium_relevance, 0.6);
/// assert_eq!(config.phrase_bonus, 0.3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// A file must score strictly above this to be answered (default: 0.5).
    #[serde(default = "default_answer_threshold")]
    pub answer_threshold: f64,
    /// Scores strictly above this are labelled `high` (default: 0.8).
    #[serde(default = "default_high_relevance")]
    pub high_relevance: f64,
    /// Scores strictly above this are labelled `medium` (default: 0.6).
    #[serde(default = "default_medium_relevance")]
    pub medium_relevance: f64,
    /// Bonus added when the whole query appears verbatim in the content (default: 0.3).
    #[serde(default = "default_phrase_bonus")]
    pub phrase_bonus: f64,
}

fn default_answer_threshold() -> f64 {
    0.5
}

fn default_high_relevance() -> f64 {
    0.8
}

fn default_medium_relevance() -> f64 {
    0.6
}

fn default_phrase_bonus() -> f64 {
    0.3
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            answer_threshold: default_answer_threshold(),
            high_relevance: default_high_relevance(),
            medium_relevance: default_medium_relevance(),
            phrase_bonus: default_phrase_bonus(),
        }
    }
}

/// Backlog deduplication and storage settings.
///
/// # Examples
///
/// ```
/// use faqdesk_core::BacklogConfig;
///
/// let config = BacklogConfig::default();
/// assert_eq!(config.similarity_threshold, 0.7);
/// assert!(config.database.ends_with("desk.db"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogConfig {
    /// Jaccard similarity strictly above which a question merges into an
    /// open backlog item (default: 0.7).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// SQLite database holding backlog and interaction records.
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_database() -> PathBuf {
    PathBuf::from(".faqdesk/desk.db")
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            database: default_database(),
        }
    }
}
