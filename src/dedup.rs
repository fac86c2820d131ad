//! Duplicate detection.
//!
//! Three tiers, any one is enough: identical normalized content, high
//! positional similarity between two long contents, or the same title and
//! language with nearly the same length.

use serde::Serialize;

use crate::artifact::Artifact;
use crate::options::Options;
use crate::patterns::WHITESPACE_NORMALIZE;

/// Why a candidate was folded into an accepted artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Duplicate {
    /// Normalized contents are identical.
    ExactContent,
    /// Contents are near-identical.
    Similar {
        /// Similarity score in `0.0..=1.0`.
        score: f64,
    },
    /// Same title and language, comparable length.
    SameTitle,
}

/// Whitespace collapsed to single spaces and trimmed.
#[must_use]
pub fn normalize(text: &str) -> String {
    WHITESPACE_NORMALIZE.replace_all(text.trim(), " ").into_owned()
}

/// Proportional positional match of two texts.
///
/// Both texts are whitespace-normalized and lowercased; the score is the
/// number of positions holding the same character divided by the length
/// of the longer text.
///
/// # Example
///
/// ```rust
/// use artifact_sync::dedup::similarity;
///
/// assert!((similarity("let  x = 1;", "LET x = 1;") - 1.0).abs() < f64::EPSILON);
/// assert!(similarity("abcd", "abxy") < 0.9);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).to_lowercase().chars().collect();
    let b: Vec<char> = normalize(b).to_lowercase().chars().collect();
    let longer = a.len().max(b.len());
    if longer == 0 {
        return 1.0;
    }
    let matching = a.iter().zip(&b).filter(|(x, y)| x == y).count();
    matching as f64 / longer as f64
}

/// First accepted artifact `candidate` duplicates, with the reason.
#[must_use]
pub fn find_duplicate(candidate: &Artifact, accepted: &[Artifact], options: &Options) -> Option<Duplicate> {
    let normalized = normalize(&candidate.content);
    accepted
        .iter()
        .find_map(|existing| compare(candidate, &normalized, existing, options))
}

/// Whether `candidate` duplicates any accepted artifact.
#[must_use]
pub fn is_duplicate(candidate: &Artifact, accepted: &[Artifact], options: &Options) -> bool {
    find_duplicate(candidate, accepted, options).is_some()
}

#[allow(clippy::cast_precision_loss)]
fn compare(candidate: &Artifact, normalized: &str, existing: &Artifact, options: &Options) -> Option<Duplicate> {
    if normalize(&existing.content) == normalized {
        return Some(Duplicate::ExactContent);
    }

    if candidate.content_length > options.similarity_min_len
        && existing.content_length > options.similarity_min_len
    {
        let score = similarity(&candidate.content, &existing.content);
        if score > options.similarity_threshold {
            return Some(Duplicate::Similar { score });
        }
    }

    if candidate.title.eq_ignore_ascii_case(&existing.title) && candidate.language == existing.language {
        let longer = candidate.content_length.max(existing.content_length);
        let diff = candidate.content_length.abs_diff(existing.content_length);
        if diff as f64 <= longer as f64 * options.title_length_tolerance {
            return Some(Duplicate::SameTitle);
        }
    }
    None
}

/// Fold a list down to its unique artifacts, keeping the first of each
/// duplicate group.
#[must_use]
pub fn dedup_all(artifacts: Vec<Artifact>, options: &Options) -> Vec<Artifact> {
    let mut unique: Vec<Artifact> = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        if !is_duplicate(&artifact, &unique, options) {
            unique.push(artifact);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn artifact(content: &str, title: &str, language: &str) -> Artifact {
        Artifact::new(content, title, language, Utc::now())
    }

    #[test]
    fn whitespace_rerender_is_exact_duplicate() {
        let a = artifact("fn main() {\n    run();\n}", "main_rust", "rust");
        let b = artifact("fn main() {   run(); }", "other", "rust");

        assert_eq!(find_duplicate(&b, &[a], &Options::default()), Some(Duplicate::ExactContent));
    }

    #[test]
    fn similarity_requires_long_contents() {
        let a = artifact("abcdefghij".repeat(5).as_str(), "a", "text");
        let b = artifact(&format!("{}X", "abcdefghij".repeat(5)), "b", "text");

        assert!(similarity(&a.content, &b.content) > 0.9);
        assert!(!is_duplicate(&b, &[a], &Options::default()));
    }

    #[test]
    fn long_near_identical_contents_are_similar() {
        let base = "const value = compute(input);\n".repeat(8);
        let a = artifact(&base, "a", "javascript");
        let b = artifact(&format!("{base}// done"), "b", "javascript");

        assert!(matches!(
            find_duplicate(&b, &[a], &Options::default()),
            Some(Duplicate::Similar { .. })
        ));
    }

    #[test]
    fn same_title_needs_same_language_and_length() {
        let a = artifact(&"x".repeat(100), "Parser", "rust");
        let same = artifact(&"y".repeat(95), "parser", "rust");
        let other_lang = artifact(&"y".repeat(95), "parser", "go");
        let much_longer = artifact(&"y".repeat(150), "parser", "rust");
        let opts = Options::default();

        assert_eq!(find_duplicate(&same, &[a.clone()], &opts), Some(Duplicate::SameTitle));
        assert!(!is_duplicate(&other_lang, &[a.clone()], &opts));
        assert!(!is_duplicate(&much_longer, &[a], &opts));
    }

    #[test]
    fn dedup_all_keeps_first() {
        let list = vec![
            artifact("print('a')\n", "first", "python"),
            artifact("print('a')", "second", "python"),
            artifact("print('b')", "third", "python"),
        ];

        let titles: Vec<String> = dedup_all(list, &Options::default()).into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["first", "third"]);
    }
}
