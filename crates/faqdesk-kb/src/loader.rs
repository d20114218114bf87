//! Parse `Q:`/`A:` knowledge files and load a directory of them.

use std::path::Path;

use faqdesk_core::{Entry, FaqError, KnowledgeBase, KnowledgeConfig, KnowledgeFile};

/// Extract question/answer entries from knowledge-file text.
///
/// A block starts at a `Q:` marker and runs to the next `Q:` or the end of
/// input; its first `A:` splits question from answer. Markers are matched
/// case-insensitively and blocks may span lines. Whitespace runs inside both
/// parts collapse to single spaces, and blocks with an empty question or
/// answer (or no `A:` at all) are dropped.
///
/// # Examples
///
/// ```
/// use faqdesk_kb::parse_entries;
///
/// let text = "Q: How do I reset my password?\nA: Use the reset link\non the login page.\n\nq: Where are you?\na: Lisbon.";
/// let entries = parse_entries(text);
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].answer, "Use the reset link on the login page.");
/// assert_eq!(entries[1].question, "Where are you?");
/// ```
pub fn parse_entries(content: &str) -> Vec<Entry> {
    let starts = marker_positions(content, b'q');
    let mut entries = Vec::new();

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(content.len());
        let block = &content[start + 2..end];

        let Some(&split) = marker_positions(block, b'a').first() else {
            continue;
        };
        let question = clean(&block[..split]);
        let answer = clean(&block[split + 2..]);
        if question.is_empty() || answer.is_empty() {
            continue;
        }
        entries.push(Entry::new(question, answer));
    }

    entries
}

/// Byte offsets of `<letter>:` in either case.
fn marker_positions(text: &str, letter: u8) -> Vec<usize> {
    text.as_bytes()
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0].to_ascii_lowercase() == letter && w[1] == b':')
        .map(|(i, _)| i)
        .collect()
}

fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Load a single knowledge file; `None` when it holds no entries.
///
/// # Errors
///
/// Returns [`FaqError::Parse`] if the file is not UTF-8 text, or
/// [`FaqError::Io`] if it cannot be read.
pub fn load_file(path: &Path) -> Result<Option<KnowledgeFile>, FaqError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            FaqError::Parse(format!("{} is not valid UTF-8 text", path.display()))
        }
        _ => FaqError::Io(e),
    })?;
    let entries = parse_entries(&content);
    if entries.is_empty() {
        return Ok(None);
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Some(KnowledgeFile::new(name, entries)))
}

/// Load every knowledge file directly inside `config.directory`.
///
/// Only files whose extension equals `config.extension` are read;
/// subdirectories are not descended into. Files are ordered by name, which
/// fixes the iteration order the matcher uses for tie-breaking. Hidden files
/// and files excluded by `.gitignore` or `.ignore` are still loaded. Unreadable
/// files and files without entries are skipped with a warning.
///
/// # Errors
///
/// Returns [`FaqError::FileNotFound`] if the directory does not exist.
///
/// # Examples
///
/// ```no_run
/// use faqdesk_core::KnowledgeConfig;
/// use faqdesk_kb::load_directory;
///
/// let kb = load_directory(&KnowledgeConfig::default()).unwrap();
/// println!("{} files, {} entries", kb.len(), kb.total_entries());
/// ```
pub fn load_directory(config: &KnowledgeConfig) -> Result<KnowledgeBase, FaqError> {
    let root = config.directory.as_path();
    if !root.is_dir() {
        return Err(FaqError::FileNotFound(root.to_path_buf()));
    }

    let walker = ignore::WalkBuilder::new(root)
        .max_depth(Some(1))
        .standard_filters(false)
        .build();

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let matches_ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&config.extension));
        if matches_ext {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    if paths.is_empty() {
        tracing::warn!(directory = %root.display(), extension = %config.extension, "no knowledge files found");
    }

    let mut files = Vec::new();
    for path in paths {
        match load_file(&path) {
            Ok(Some(file)) => {
                tracing::info!(file = %file.name, entries = file.entries.len(), "loaded knowledge file");
                files.push(file);
            }
            Ok(None) => {
                tracing::warn!(path = %path.display(), "knowledge file has no Q/A entries, skipping");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read knowledge file, skipping");
            }
        }
    }

    let kb = KnowledgeBase::new(files);
    tracing::info!(
        files = kb.len(),
        entries = kb.total_entries(),
        "knowledge base loaded"
    );
    Ok(kb)
}
