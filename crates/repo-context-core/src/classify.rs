//! Important-file classification and character-bounded truncation.
//!
//! A file is *important* when its lowercased name ends with one of
//! [`IMPORTANT_EXTENSIONS`] or equals one of [`IMPORTANT_NAMES`].
//! Matching is case-insensitive on both lists, so `README.MD` and
//! `Makefile` qualify.

/// Extensions that mark a file as important.
pub const IMPORTANT_EXTENSIONS: &[&str] = &[
    ".js", ".ts", ".jsx", ".tsx", ".json", ".md", ".yml", ".yaml", ".env", ".py", ".go", ".java",
];

/// Literal file names that mark a file as important.
pub const IMPORTANT_NAMES: &[&str] = &[
    ".env.example",
    "readme.md",
    "package.json",
    "dockerfile",
    "docker-compose.yml",
    "Makefile",
];

/// Returns `true` if a file with this name should be crawled.
///
/// Only the final path component is considered, so callers may pass
/// either a bare name or a repository path.
///
/// ```rust
/// use repo_context_core::classify::is_important;
///
/// assert!(is_important("README.MD"));
/// assert!(is_important("src/app.py"));
/// assert!(!is_important("src/app.rb"));
/// ```
pub fn is_important(name: &str) -> bool {
    let base = name.rsplit('/').next().unwrap_or(name);
    let lower = base.to_lowercase();
    IMPORTANT_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(&lower))
        || IMPORTANT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Truncate `text` to at most `max_chars` characters.
///
/// Counts Unicode scalar values, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Owned variant of [`truncate_chars`] that reuses the buffer.
pub fn truncate_owned(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}
