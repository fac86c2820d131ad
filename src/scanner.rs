//! Candidate collection.
//!
//! Walks a page and every readable frame with a prioritized table of
//! structural selectors. Every match from every selector is a candidate;
//! the table order only decides which selector a node is reported under.

use std::collections::HashSet;

use dom_query::NodeId;
use serde::Serialize;

use crate::dom::{self, Selection};
use crate::error::{Error, Result};
use crate::page::Page;

/// Structural category of a candidate selector, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    /// Explicit artifact containers.
    ArtifactContainer,
    /// `<pre>` and `<pre><code>` blocks.
    CodeBlock,
    /// Code blocks inside rendered markdown/prose.
    ProseCode,
    /// Monospace, code-styled or truncated containers.
    Monospace,
    /// Read-only form controls holding text.
    ReadonlyInput,
}

/// One entry of the selector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSelector {
    /// CSS selector.
    pub selector: &'static str,
    /// Category reported for matches.
    pub tier: Tier,
}

const fn entry(selector: &'static str, tier: Tier) -> CandidateSelector {
    CandidateSelector { selector, tier }
}

/// Candidate selectors in priority order.
pub const CANDIDATE_SELECTORS: &[CandidateSelector] = &[
    entry(r#"[data-testid*="artifact"]"#, Tier::ArtifactContainer),
    entry(r#"[class*="artifact"]"#, Tier::ArtifactContainer),
    entry("[data-artifact-id]", Tier::ArtifactContainer),
    entry("pre code", Tier::CodeBlock),
    entry("pre", Tier::CodeBlock),
    entry(r#"[class*="markdown"] pre"#, Tier::ProseCode),
    entry(r#"[class*="prose"] pre"#, Tier::ProseCode),
    entry(".whitespace-pre-wrap", Tier::Monospace),
    entry(".font-mono", Tier::Monospace),
    entry(r#"[class*="code-block"]"#, Tier::Monospace),
    entry(r#"[class*="code_block"]"#, Tier::Monospace),
    entry(r#"[class*="truncate"]"#, Tier::Monospace),
    entry(r#"[class*="line-clamp"]"#, Tier::Monospace),
    entry("textarea[readonly]", Tier::ReadonlyInput),
    entry(r#"textarea[class*="code"]"#, Tier::ReadonlyInput),
    entry("input[readonly]", Tier::ReadonlyInput),
];

/// An element suspected of holding artifact content, valid for one scan.
#[derive(Clone)]
pub struct Candidate<'a> {
    /// The element.
    pub node: Selection<'a>,
    /// Selector that first matched it.
    pub selector: &'static str,
    /// Category of that selector.
    pub tier: Tier,
    /// Lowercase tag name.
    pub tag: String,
    /// `class` attribute, empty when absent.
    pub class: String,
    /// Index of the frame document the element lives in (`0` = top level).
    pub frame: usize,
}

/// All elements of `root` matching `selector`.
///
/// # Errors
///
/// Returns `Error::SelectorError` if the selector does not compile.
pub fn select_all<'a>(root: &Selection<'a>, selector: &str) -> Result<Selection<'a>> {
    dom::try_query_selector_all(root, selector).ok_or_else(|| Error::SelectorError(selector.to_string()))
}

/// Collect candidates from `page` and its frames using the default table.
///
/// # Example
///
/// ```rust
/// use artifact_sync::{scanner, Page};
///
/// let page = Page::parse("<body><pre><code>fn main() {}</code></pre></body>");
/// let candidates = scanner::collect_candidates(&page);
/// assert_eq!(candidates.len(), 2); // <code> via "pre code", <pre> via "pre"
/// ```
#[must_use]
pub fn collect_candidates(page: &Page) -> Vec<Candidate<'_>> {
    collect_with(page, CANDIDATE_SELECTORS)
}

/// Collect candidates with a custom selector table.
///
/// Each element is reported once per frame, under the first selector that
/// matched it. Selectors that fail to compile are logged and skipped.
#[must_use]
pub fn collect_with<'a>(page: &'a Page, selectors: &[CandidateSelector]) -> Vec<Candidate<'a>> {
    let mut seen: HashSet<(usize, NodeId)> = HashSet::new();
    let mut candidates = Vec::new();

    for frame in page.frames() {
        let root = frame.page.root();
        for entry in selectors {
            let matches = match select_all(&root, entry.selector) {
                Ok(matches) => matches,
                Err(err) => {
                    tracing::warn!(selector = entry.selector, frame = frame.index, error = %err, "skipping selector");
                    continue;
                }
            };
            for node in matches.nodes() {
                if !seen.insert((frame.index, node.id)) {
                    continue;
                }
                let sel = Selection::from(*node);
                candidates.push(Candidate {
                    tag: dom::tag_name(&sel).unwrap_or_default(),
                    class: dom::class_name(&sel).unwrap_or_default(),
                    node: sel,
                    selector: entry.selector,
                    tier: entry.tier,
                    frame: frame.index,
                });
            }
        }
    }

    tracing::debug!(count = candidates.len(), "collected candidates");
    candidates
}
