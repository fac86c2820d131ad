//! Title derivation.
//!
//! Four tiers, first hit wins: markup metadata, the conversation text just
//! before the block, the content itself, and a synthesized placeholder.
//! Every candidate goes through [`sanitize_title`]; a candidate that
//! sanitizes to nothing falls through to the next source.

use chrono::{DateTime, Utc};
use dom_query::NodeRef;

use crate::dom::{self, Selection};
use crate::options::Options;
use crate::patterns::{
    DEFINITION_NAME, FILENAME_IN_TEXT, FORBIDDEN_FILENAME_CHARS, LEADING_COMMENTS,
    MESSAGE_CONTAINER, SENTENCE_BREAK, TITLE_CLASS, UNDERSCORE_RUN, WHITESPACE_NORMALIZE,
};
use crate::validator::looks_like_code;

/// Attributes that name an element.
const TITLE_ATTRIBUTES: &[&str] = &["title", "data-title", "data-name", "data-filename", "aria-label"];

/// Descendants that carry a title or filename.
const TITLE_DESCENDANTS: &str =
    r#"[class*="title"], [class*="filename"], [class*="file-name"], h1, h2, h3, h4, h5, h6"#;

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Ancestors whose attributes may name the block.
const METADATA_ANCESTOR_DEPTH: usize = 3;

/// Longest metadata label accepted.
const MAX_METADATA_LEN: usize = 150;

/// Conversational sentences must be this long...
const MIN_SENTENCE_LEN: usize = 10;

/// ...and at most this long.
const MAX_SENTENCE_LEN: usize = 80;

/// Lines of content inspected for a comment or short title line.
const CONTENT_TITLE_LINES: usize = 5;

/// Comments and lines at least this long are not titles.
const MAX_LINE_TITLE_LEN: usize = 80;

/// Derive a title for a block, trying each tier in order.
#[must_use]
pub fn derive_title(
    node: &Selection,
    text: &str,
    language: &str,
    now: DateTime<Utc>,
    options: &Options,
) -> String {
    let max_len = options.max_title_len;
    title_from_metadata(node, max_len)
        .or_else(|| title_from_conversation(node, max_len))
        .or_else(|| title_from_content(text, language, max_len))
        .unwrap_or_else(|| fallback_title(language, now))
}

/// Title from attributes, title-classed elements or headings near the node.
#[must_use]
pub fn title_from_metadata(node: &Selection, max_len: usize) -> Option<String> {
    let mut scopes = vec![node.clone()];
    scopes.extend(dom::ancestors(node).into_iter().take(METADATA_ANCESTOR_DEPTH));
    for scope in &scopes {
        for attr in TITLE_ATTRIBUTES {
            if let Some(title) = dom::get_attribute(scope, attr).and_then(|v| metadata_label(&v, max_len)) {
                return Some(title);
            }
        }
    }

    if let Some(title) = node
        .select(TITLE_DESCENDANTS)
        .iter()
        .find_map(|el| metadata_label(&dom::text_content(&el), max_len))
    {
        return Some(title);
    }

    let parent = dom::parent(node);
    [dom::previous_element_sibling(node), dom::previous_element_sibling(&parent)]
        .into_iter()
        .flatten()
        .filter(is_title_element)
        .find_map(|el| metadata_label(&dom::text_content(&el), max_len))
}

fn is_title_element(sel: &Selection) -> bool {
    dom::tag_name(sel).is_some_and(|t| HEADINGS.contains(&t.as_str()))
        || dom::class_name(sel).is_some_and(|c| TITLE_CLASS.is_match(&c))
}

fn metadata_label(raw: &str, max_len: usize) -> Option<String> {
    let raw = raw.trim();
    let len = raw.chars().count();
    if len == 0 || len > MAX_METADATA_LEN || looks_like_code(raw) {
        return None;
    }
    sanitize_title(raw, max_len)
}

fn is_message_container(sel: &Selection) -> bool {
    dom::has_attribute(sel, "data-message-author-role")
        || dom::class_name(sel).is_some_and(|c| MESSAGE_CONTAINER.is_match(&c))
        || dom::get_attribute(sel, "data-testid").is_some_and(|t| MESSAGE_CONTAINER.is_match(&t))
}

/// Title from the last plausible sentence written before the block inside
/// its message container.
#[must_use]
pub fn title_from_conversation(node: &Selection, max_len: usize) -> Option<String> {
    let container = dom::ancestors(node).into_iter().find(is_message_container)?;
    let target = dom::node_id(node)?;
    let root = container.nodes().first()?;

    let mut preceding = String::new();
    collect_preceding_text(root, target, &mut preceding);

    SENTENCE_BREAK
        .split(&preceding)
        .map(str::trim)
        .filter(|s| (MIN_SENTENCE_LEN..=MAX_SENTENCE_LEN).contains(&s.chars().count()))
        .filter(|s| !looks_like_code(s))
        .last()
        .and_then(|s| sanitize_title(s, max_len))
}

/// Append rendered prose before `target` in document order. Returns `true`
/// once `target` is reached.
fn collect_preceding_text(node: &NodeRef, target: dom_query::NodeId, out: &mut String) -> bool {
    let mut child = node.first_child();
    while let Some(current) = child {
        if current.id == target {
            return true;
        }
        if current.is_text() {
            out.push_str(&current.text());
        } else if current.is_element() {
            let sel = Selection::from(current);
            let tag = dom::tag_name(&sel).unwrap_or_default();
            // other code blocks are not conversation
            let skip = dom::is_hidden(&sel) || tag == "pre" || tag == "code";
            if !skip {
                if collect_preceding_text(&current, target, out) {
                    return true;
                }
                out.push('\n');
            } else if sel.select("*").nodes().iter().any(|n| n.id == target) {
                return true;
            }
        }
        child = current.next_sibling();
    }
    false
}

/// Title from the content: an embedded filename, a defined identifier
/// suffixed with the language, a leading comment, or a short first line.
#[must_use]
pub fn title_from_content(text: &str, language: &str, max_len: usize) -> Option<String> {
    if let Some(name) = FILENAME_IN_TEXT.captures(text).and_then(|c| sanitize_title(&c[1], max_len)) {
        return Some(name);
    }
    if let Some(name) = DEFINITION_NAME.captures(text).map(|c| c[1].to_string()) {
        if let Some(title) = sanitize_title(&format!("{name}_{language}"), max_len) {
            return Some(title);
        }
    }

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()).take(CONTENT_TITLE_LINES) {
        if line.starts_with("#!") {
            continue;
        }
        let comment = LEADING_COMMENTS
            .iter()
            .find_map(|p| p.captures(line).map(|c| c[1].trim().to_string()));
        let candidate = match comment {
            Some(comment) if comment.chars().count() < MAX_LINE_TITLE_LEN => Some(comment),
            Some(_) => None,
            None if line.chars().count() < MAX_LINE_TITLE_LEN
                && !line.contains('{')
                && !line.contains(';') =>
            {
                Some(line.to_string())
            }
            None => None,
        };
        if let Some(title) = candidate.and_then(|c| sanitize_title(&c, max_len)) {
            return Some(title);
        }
    }
    None
}

/// Placeholder title: `{language}_document_{YYYYmmdd_HHMMSS}`.
#[must_use]
pub fn fallback_title(language: &str, now: DateTime<Utc>) -> String {
    format!("{language}_document_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Make a title filesystem-safe.
///
/// Forbidden characters and whitespace become `_`, runs of `_` collapse,
/// leading and trailing `_` are trimmed and the result is capped at
/// `max_len` characters. Returns `None` when nothing is left.
///
/// # Example
///
/// ```rust
/// use artifact_sync::titler::sanitize_title;
///
/// assert_eq!(sanitize_title("  src/app: main?.rs ", 80).as_deref(), Some("src_app_main_.rs"));
/// assert_eq!(sanitize_title("???", 80), None);
/// ```
#[must_use]
pub fn sanitize_title(raw: &str, max_len: usize) -> Option<String> {
    let replaced = FORBIDDEN_FILENAME_CHARS.replace_all(raw.trim(), "_");
    let spaced = WHITESPACE_NORMALIZE.replace_all(&replaced, "_");
    let collapsed = UNDERSCORE_RUN.replace_all(&spaced, "_");
    let capped: String = collapsed.trim_matches('_').chars().take(max_len).collect();
    let title = capped.trim_matches('_');
    (!title.is_empty()).then(|| title.to_string())
}
