//! Artifact validation.
//!
//! Ordered rejection rules, first match wins. Cheap structural rejects run
//! before the pattern-heavy acceptance checks.

use std::fmt;

use serde::Serialize;

use crate::options::Options;
use crate::patterns::{
    CODE_INDICATOR, CSS_AT_RULE, CSS_CLOSE_LINE, CSS_PROPERTY_LINE, CSS_RULE_LINE,
    CSS_SELECTOR_OPEN, FILENAME_EXTENSIONS, MARKDOWN_SIGNATURES, UI_SIGNATURES,
};

/// Fraction of indented lines that marks text as code.
const INDENTED_RATIO: f64 = 0.3;

/// Non-blank lines needed before indentation counts.
const MIN_INDENTED_LINES: usize = 4;

/// Why a text was not accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "camelCase")]
pub enum Rejection {
    /// Below the length floor.
    TooShort,
    /// Matches a UI-chrome signature.
    UiChrome(&'static str),
    /// CSS-shaped lines dominate.
    CssDominant(f64),
    /// A lone filename label.
    BareFilename,
    /// Neither code, markdown nor long multi-line prose.
    NoStructure,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooShort => f.write_str("too short"),
            Rejection::UiChrome(label) => write!(f, "ui chrome ({label})"),
            Rejection::CssDominant(ratio) => write!(f, "css dominant ({ratio:.2})"),
            Rejection::BareFilename => f.write_str("bare filename"),
            Rejection::NoStructure => f.write_str("no structure"),
        }
    }
}

/// Outcome of validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The text is an artifact.
    Accept,
    /// The text is not an artifact.
    Reject(Rejection),
}

impl Verdict {
    /// Whether the verdict accepts the text.
    #[must_use]
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Validate text with default thresholds.
///
/// # Example
///
/// ```rust
/// use artifact_sync::validator::is_valid;
///
/// assert!(!is_valid("Copy"));
/// assert!(is_valid("function greet(name) {\n  return `Hello, ${name}`;\n}\n\nmodule.exports = greet;"));
/// ```
#[must_use]
pub fn is_valid(text: &str) -> bool {
    validate(text, &Options::default()).is_accept()
}

/// Run the ordered rules against `text`.
#[must_use]
pub fn validate(text: &str, options: &Options) -> Verdict {
    let text = text.trim();
    let len = text.chars().count();

    if len < options.min_content_len {
        return Verdict::Reject(Rejection::TooShort);
    }

    if let Some(signature) = UI_SIGNATURES.iter().find(|s| s.pattern.is_match(text)) {
        return Verdict::Reject(Rejection::UiChrome(signature.label));
    }

    let ratio = css_ratio(text);
    if ratio > options.max_css_ratio {
        return Verdict::Reject(Rejection::CssDominant(ratio));
    }

    if is_bare_filename(text, options) {
        return Verdict::Reject(Rejection::BareFilename);
    }

    if looks_like_code(text) || looks_like_markdown(text) {
        return Verdict::Accept;
    }
    if len > options.long_text_min_len && text.lines().count() > options.long_text_min_lines {
        return Verdict::Accept;
    }
    Verdict::Reject(Rejection::NoStructure)
}

/// Fraction of non-blank lines shaped like CSS.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn css_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut css = 0usize;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        total += 1;
        if is_css_line(line) {
            css += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    css as f64 / total as f64
}

fn is_css_line(line: &str) -> bool {
    CSS_RULE_LINE.is_match(line)
        || CSS_SELECTOR_OPEN.is_match(line)
        || CSS_PROPERTY_LINE.is_match(line)
        || CSS_CLOSE_LINE.is_match(line)
        || CSS_AT_RULE.is_match(line)
}

fn is_bare_filename(text: &str, options: &Options) -> bool {
    if text.contains('\n') || text.chars().count() >= options.bare_filename_max_len {
        return false;
    }
    let lower = text.to_lowercase();
    FILENAME_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Keyword/symbol indicators, brace and semicolon density, or indentation.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn looks_like_code(text: &str) -> bool {
    if CODE_INDICATOR.is_match(text) {
        return true;
    }
    if text.contains('{') && text.contains('}') && text.contains(';') {
        return true;
    }

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < MIN_INDENTED_LINES {
        return false;
    }
    let indented = lines
        .iter()
        .filter(|l| l.starts_with("  ") || l.starts_with('\t'))
        .count();
    indented as f64 / lines.len() as f64 >= INDENTED_RATIO
}

/// Names of the markdown constructs present in `text`, in table order.
#[must_use]
pub fn markdown_constructs(text: &str) -> Vec<&'static str> {
    MARKDOWN_SIGNATURES
        .iter()
        .filter(|s| s.pattern.is_match(text))
        .map(|s| s.name)
        .collect()
}

/// At least two distinct markdown constructs.
#[must_use]
pub fn looks_like_markdown(text: &str) -> bool {
    let constructs = markdown_constructs(text);
    tracing::trace!(?constructs, "markdown constructs");
    constructs.len() >= 2
}
