//! Output filenames for saved artifacts.

use std::sync::LazyLock;

use regex::Regex;

/// Longest base name kept, in characters.
const MAX_BASE_LEN: usize = 50;

/// Shortest base name used as is.
const MIN_BASE_LEN: usize = 3;

/// Attempts that use a numeric suffix before falling back to a timestamp.
const NUMBERED_ATTEMPTS: usize = 5;

/// Total attempts before a save gives up.
pub const MAX_ATTEMPTS: usize = 10;

#[allow(clippy::expect_used)]
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid regex"));

#[allow(clippy::expect_used)]
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").expect("valid regex"));

#[allow(clippy::expect_used)]
static GENERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:text|document|artifact|code)_+").expect("valid regex"));

// Millisecond timestamps appended by older clients.
#[allow(clippy::expect_used)]
static MILLIS_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+\d{13}_*$").expect("valid regex"));

/// Reduce `title` to a base filename, falling back to `{language}_document`.
///
/// # Example
///
/// ```rust
/// use artifact_sync::server::naming::base_name;
///
/// assert_eq!(base_name("code_my script.py", "python"), "my_script_py");
/// assert_eq!(base_name("??", "rust"), "rust_document");
/// ```
#[must_use]
pub fn base_name(title: &str, language: &str) -> String {
    let name = UNSAFE_CHARS.replace_all(title, "_");
    let name = UNDERSCORES.replace_all(&name, "_");
    let name = GENERIC_PREFIX.replace(&name, "");
    let name = MILLIS_SUFFIX.replace(&name, "");
    let name: String = name.trim_matches('_').chars().take(MAX_BASE_LEN).collect();

    if name.chars().count() < MIN_BASE_LEN {
        let language = UNSAFE_CHARS.replace_all(language, "_");
        format!("{language}_document")
    } else {
        name
    }
}

/// Filename tried on the given attempt, counting from zero.
///
/// `base.ext` first, then `base_1.ext` through `base_5.ext`, then
/// `base_{millis}.ext`.
#[must_use]
pub fn candidate(base: &str, extension: &str, attempt: usize, millis: i64) -> String {
    match attempt {
        0 => format!("{base}{extension}"),
        n if n <= NUMBERED_ATTEMPTS => format!("{base}_{n}{extension}"),
        _ => format!("{base}_{millis}{extension}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_sanitizes() {
        assert_eq!(base_name("hello world!", "text"), "hello_world");
        assert_eq!(base_name("a//b\\\\c", "text"), "a_b_c");
        assert_eq!(base_name("Document__parser_impl", "rust"), "parser_impl");
    }

    #[test]
    fn test_base_name_strips_millis_suffix() {
        assert_eq!(base_name("python_document_1714560000000", "python"), "python_document");
        assert_eq!(base_name("report_1714560000000_", "text"), "report");
    }

    #[test]
    fn test_base_name_caps_length() {
        let long = "x".repeat(120);
        assert_eq!(base_name(&long, "text").len(), MAX_BASE_LEN);
    }

    #[test]
    fn test_base_name_falls_back() {
        assert_eq!(base_name("", "javascript"), "javascript_document");
        assert_eq!(base_name("code_", "sql"), "sql_document");
    }

    #[test]
    fn test_candidate_sequence() {
        let names: Vec<String> = (0..MAX_ATTEMPTS).map(|i| candidate("app", ".js", i, 42)).collect();
        assert_eq!(names[0], "app.js");
        assert_eq!(names[1], "app_1.js");
        assert_eq!(names[5], "app_5.js");
        assert_eq!(names[6], "app_42.js");
    }
}
