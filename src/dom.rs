//! DOM Operations Adapter
//!
//! Provides browser-DOM-style operations over the `dom_query` crate so the
//! detection stages read like the page scripts they replace: `getAttribute`,
//! `textContent`, `innerText`, `closest`, element siblings.
//!
//! The `rendered_*` readers treat the snapshot as the user sees it: subtrees
//! that are `hidden`, `display:none`, `visibility:hidden`, or non-rendering
//! (`template`, `script`, `style`, `noscript`) contribute no text.

use dom_query::{NodeId, NodeRef};

use crate::patterns::{BLANK_LINES, HIDDEN_STYLE, LINE_BREAK_TAG, MARKUP_TAG};

// Re-export core types for external use
pub use dom_query::{Document, Selection};

// Re-export StrTendril for external use
pub use tendril::StrTendril;

/// Elements whose content is never rendered.
const NON_RENDERED_TAGS: &[&str] = &["template", "script", "style", "noscript", "head"];

/// Elements that start and end a rendered line.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote",
    "section", "article", "header", "footer", "table", "ul", "ol", "details", "summary",
    "figure", "figcaption", "main", "aside", "nav", "dl", "dt", "dd",
];

// === Attribute Operations ===

/// Get element ID attribute
///
/// DOM equivalent: `el.id`
#[inline]
#[must_use]
pub fn id(sel: &Selection) -> Option<String> {
    sel.attr("id").map(|s| s.to_string())
}

/// Get element class attribute
///
/// DOM equivalent: `el.className`
#[inline]
#[must_use]
pub fn class_name(sel: &Selection) -> Option<String> {
    sel.attr("class").map(|s| s.to_string())
}

/// Get any attribute value
///
/// DOM equivalent: `el.getAttribute(name)`
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Set an attribute value
#[inline]
pub fn set_attribute(sel: &Selection, name: &str, value: &str) {
    sel.set_attr(name, value);
}

/// Check if attribute exists
#[inline]
#[must_use]
pub fn has_attribute(sel: &Selection, name: &str) -> bool {
    sel.has_attr(name)
}

/// Remove an attribute
#[inline]
pub fn remove_attribute(sel: &Selection, name: &str) {
    sel.remove_attr(name);
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
///
/// DOM equivalent: `el.tagName.toLowerCase()`
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(NodeRef::node_name)
        .map(|t| t.to_string())
}

/// Identity of the first node in the selection, stable for the lifetime of
/// the document.
#[must_use]
pub fn node_id(sel: &Selection) -> Option<NodeId> {
    sel.nodes().first().map(|node| node.id)
}

/// Whether two selections start at the same node.
#[must_use]
pub fn same_node(a: &Selection, b: &Selection) -> bool {
    matches!((node_id(a), node_id(b)), (Some(x), Some(y)) if x == y)
}

// === Text Content ===

/// Get all text content of node and descendants, hidden or not.
///
/// DOM equivalent: `el.textContent`
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> StrTendril {
    sel.text()
}

/// Whether this element is excluded from rendering.
#[must_use]
pub fn is_hidden(sel: &Selection) -> bool {
    let tag = tag_name(sel).unwrap_or_default();
    if NON_RENDERED_TAGS.contains(&tag.as_str()) {
        return true;
    }
    if has_attribute(sel, "hidden") {
        return true;
    }
    // closed <details> only render their summary
    let container = parent(sel);
    if tag != "summary"
        && tag_name(&container).as_deref() == Some("details")
        && !has_attribute(&container, "open")
    {
        return true;
    }
    get_attribute(sel, "style").is_some_and(|style| HIDDEN_STYLE.is_match(&style))
}

/// One step of a rendered-tree walk.
enum Visit<'a> {
    Text(&'a str),
    Open(&'a str),
    Close(&'a str),
}

/// Walk the rendered subtree below `node` in document order.
fn visit_rendered(node: &NodeRef, visitor: &mut dyn FnMut(Visit)) {
    let mut child = node.first_child();
    while let Some(current) = child {
        if current.is_text() {
            let text = current.text();
            visitor(Visit::Text(&text));
        } else if current.is_element() {
            let sel = Selection::from(current);
            if !is_hidden(&sel) {
                let name = current.node_name().map(|n| n.to_string()).unwrap_or_default();
                visitor(Visit::Open(&name));
                visit_rendered(&current, visitor);
                visitor(Visit::Close(&name));
            }
        }
        child = current.next_sibling();
    }
}

/// Concatenated text of the rendered subtree, without inserted line breaks.
///
/// DOM equivalent: the text a user could select in the element
#[must_use]
pub fn rendered_text(sel: &Selection) -> String {
    let mut out = String::new();
    if let Some(node) = sel.nodes().first() {
        visit_rendered(node, &mut |visit| {
            if let Visit::Text(text) = visit {
                out.push_str(text);
            }
        });
    }
    out
}

/// Rendered text with line breaks at block boundaries and `<br>`.
///
/// DOM equivalent: `el.innerText`
#[must_use]
pub fn inner_text(sel: &Selection) -> String {
    let mut out = String::new();
    if let Some(node) = sel.nodes().first() {
        visit_rendered(node, &mut |visit| match visit {
            Visit::Text(text) => out.push_str(text),
            Visit::Open("br") => out.push('\n'),
            Visit::Open(tag) if BLOCK_TAGS.contains(&tag) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Visit::Close(tag) if BLOCK_TAGS.contains(&tag) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        });
    }
    BLANK_LINES.replace_all(&out, "\n\n").into_owned()
}

/// Serialized markup of the rendered subtree with tags stripped and
/// entities decoded.
#[must_use]
pub fn stripped_markup(sel: &Selection) -> String {
    let mut markup = String::new();
    if let Some(node) = sel.nodes().first() {
        visit_rendered(node, &mut |visit| match visit {
            Visit::Text(text) => markup.push_str(&escape_text(text)),
            Visit::Open(tag) => {
                markup.push('<');
                markup.push_str(tag);
                markup.push('>');
            }
            Visit::Close(tag) => {
                markup.push_str("</");
                markup.push_str(tag);
                markup.push('>');
            }
        });
    }
    let broken = LINE_BREAK_TAG.replace_all(&markup, "\n");
    let stripped = MARKUP_TAG.replace_all(&broken, "");
    let decoded = decode_entities(&stripped);
    BLANK_LINES.replace_all(&decoded, "\n\n").into_owned()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Decode the handful of entities that survive serialization.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

// === Tree Navigation ===

/// Get parent element
///
/// DOM equivalent: `el.parentElement`
#[inline]
#[must_use]
pub fn parent<'a>(sel: &Selection<'a>) -> Selection<'a> {
    sel.parent()
}

/// Get next element sibling (skipping text nodes)
///
/// DOM equivalent: `el.nextElementSibling`
#[must_use]
pub fn next_element_sibling<'a>(sel: &Selection<'a>) -> Option<Selection<'a>> {
    sel.nodes().first().and_then(|node| {
        let mut sibling = node.next_sibling();
        while let Some(s) = sibling {
            if s.is_element() {
                return Some(Selection::from(s));
            }
            sibling = s.next_sibling();
        }
        None
    })
}

/// Get previous element sibling (skipping text nodes)
///
/// DOM equivalent: `el.previousElementSibling`
#[must_use]
pub fn previous_element_sibling<'a>(sel: &Selection<'a>) -> Option<Selection<'a>> {
    sel.nodes().first().and_then(|node| {
        let mut sibling = node.prev_sibling();
        while let Some(s) = sibling {
            if s.is_element() {
                return Some(Selection::from(s));
            }
            sibling = s.prev_sibling();
        }
        None
    })
}

/// Element ancestors, nearest first.
#[must_use]
pub fn ancestors<'a>(sel: &Selection<'a>) -> Vec<Selection<'a>> {
    let mut found = Vec::new();
    let mut current = parent(sel);
    while current.exists() {
        if tag_name(&current).is_none() {
            break;
        }
        found.push(current.clone());
        current = parent(&current);
    }
    found
}

/// Nearest element (self included) satisfying `predicate`.
///
/// DOM equivalent: `el.closest(selector)` with an arbitrary predicate
#[must_use]
pub fn closest<'a>(sel: &Selection<'a>, predicate: impl Fn(&Selection) -> bool) -> Option<Selection<'a>> {
    if predicate(sel) {
        return Some(sel.clone());
    }
    ancestors(sel).into_iter().find(|a| predicate(a))
}

// === Querying ===

/// Query single element by CSS selector
///
/// DOM equivalent: `el.querySelector(selector)`
#[inline]
#[must_use]
pub fn query_selector<'a>(sel: &Selection<'a>, selector: &str) -> Selection<'a> {
    sel.select_single(selector)
}

/// Query all elements by CSS selector, `None` if the selector is invalid
///
/// DOM equivalent: `el.querySelectorAll(selector)`
#[inline]
#[must_use]
pub fn try_query_selector_all<'a>(sel: &Selection<'a>, selector: &str) -> Option<Selection<'a>> {
    sel.try_select(selector)
}

// === Parsing ===

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_select() {
        let doc = parse(r#"<div id="main" class="container">content</div>"#);
        let div = doc.select("div");

        assert_eq!(id(&div), Some("main".to_string()));
        assert_eq!(class_name(&div), Some("container".to_string()));
        assert_eq!(tag_name(&div), Some("div".to_string()));
    }

    #[test]
    fn test_rendered_text_skips_hidden_subtrees() {
        let doc = parse(
            r#"<pre>visible <span hidden>secret</span><span style="display: none">gone</span>tail</pre>"#,
        );
        let pre = doc.select("pre");

        assert_eq!(rendered_text(&pre), "visible tail");
        assert!(text_content(&pre).contains("secret"));
    }

    #[test]
    fn test_inner_text_breaks_blocks() {
        let doc = parse("<div id='x'><p>one</p><p>two<br>three</p></div>");
        let div = doc.select("#x");

        let text = inner_text(&div);
        assert_eq!(text.trim(), "one\ntwo\nthree");
    }

    #[test]
    fn test_stripped_markup_decodes_entities() {
        let doc = parse("<pre>if (a &lt; b &amp;&amp; c) {}</pre>");
        let pre = doc.select("pre");

        assert_eq!(stripped_markup(&pre).trim(), "if (a < b && c) {}");
    }

    #[test]
    fn test_ancestors_and_closest() {
        let doc = parse(r#"<section class="msg"><div><pre id="t">x</pre></div></section>"#);
        let pre = doc.select("#t");

        let chain: Vec<String> = ancestors(&pre).iter().filter_map(tag_name).collect();
        assert_eq!(&chain[..2], &["div".to_string(), "section".to_string()]);

        let found = closest(&pre, |s| class_name(s).is_some_and(|c| c == "msg"));
        assert!(found.is_some());
    }

    #[test]
    fn test_element_siblings() {
        let doc = parse("<div><h3>Title</h3> text <pre>code</pre></div>");
        let pre = doc.select("pre");

        let prev = previous_element_sibling(&pre).expect("previous sibling");
        assert_eq!(tag_name(&prev), Some("h3".to_string()));
        assert!(next_element_sibling(&pre).is_none());
    }

    #[test]
    fn test_try_query_selector_all_rejects_invalid() {
        let doc = parse("<div></div>");
        let root = doc.select("html");
        assert!(try_query_selector_all(&root, "div[").is_none());
    }
}
