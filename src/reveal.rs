//! Full-text extraction from candidate nodes.
//!
//! Chat UIs collapse long blocks behind "show more" controls, clip them with
//! inline styles, or render rows lazily inside scroll containers. Reading a
//! candidate tries every extraction strategy and keeps the longest result;
//! when the node looks clipped or the text is short, a bounded escalation of
//! recovery actions mutates the snapshot and re-reads after each one.
//!
//! Revealing never fails. When nothing helps the caller simply gets the
//! longest text seen.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, sleep_until, timeout, Instant};

use crate::dom::{self, Selection};
use crate::patterns::{
    CLIPPING_DECLARATION, CLIPPING_STYLE, HIDDEN_STYLE, SCROLLABLE, SHOW_MORE_TEXT,
    TOGGLE_CLASS, TRUNCATION_HINT,
};

/// Controls searched for a "show more" caption.
const CONTROL_SELECTOR: &str = "button, [role='button'], summary, a";

/// Captions longer than this are content, not controls.
const MAX_CONTROL_CAPTION: usize = 40;

/// Ways of reading text from a node, in preference order for ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// `value` of a form control (`<textarea>` content, `<input value>`).
    FormValue,
    /// Concatenated rendered text.
    RenderedText,
    /// Rendered text with block line breaks (`innerText`).
    InnerText,
    /// Rendered markup with tags stripped and entities decoded.
    StrippedMarkup,
}

impl Strategy {
    /// All strategies in tie-break order.
    pub const ALL: [Strategy; 4] = [
        Strategy::FormValue,
        Strategy::RenderedText,
        Strategy::InnerText,
        Strategy::StrippedMarkup,
    ];

    /// Read the node with this strategy. `None` when it does not apply.
    #[must_use]
    pub fn read(self, node: &Selection) -> Option<String> {
        match self {
            Strategy::FormValue => match dom::tag_name(node).as_deref() {
                Some("textarea") => Some(dom::text_content(node).to_string()),
                Some("input") => dom::get_attribute(node, "value"),
                _ => None,
            },
            Strategy::RenderedText => Some(dom::rendered_text(node)),
            Strategy::InnerText => Some(dom::inner_text(node)),
            Strategy::StrippedMarkup => Some(dom::stripped_markup(node)),
        }
    }
}

/// Recovery actions tried when a node looks truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RevealAction {
    /// Activate the node or a nearby "show more" control.
    Toggle,
    /// Drop clipping declarations from inline styles, restored afterwards.
    RelaxClipping,
    /// Scroll the nearest scrollable ancestor to its full extent.
    ScrollAncestor,
}

/// One escalation step: an action and how long to let the page settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealStep {
    /// Action to apply.
    pub action: RevealAction,
    /// Wait after applying the action before re-reading.
    pub settle: Duration,
}

/// Bounded escalation policy for revealing truncated content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPolicy {
    /// Whether escalation runs at all. Strategies are always tried.
    ///
    /// Default: `true`
    pub enabled: bool,

    /// Readings shorter than this (characters) trigger escalation.
    ///
    /// Default: `500`
    pub min_len: usize,

    /// Actions tried in order.
    ///
    /// Default: toggle (150ms), relax clipping (100ms), scroll ancestor (200ms)
    pub steps: Vec<RevealStep>,

    /// Upper bound for the whole escalation.
    ///
    /// Default: `2s`
    pub budget: Duration,

    /// Relaxed styles are restored once this long has passed since relaxing.
    ///
    /// Default: `300ms`
    pub restore_grace: Duration,

    /// How many ancestors are considered for relaxing and scrolling.
    ///
    /// Default: `4`
    pub max_ancestor_depth: usize,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_len: 500,
            steps: vec![
                RevealStep {
                    action: RevealAction::Toggle,
                    settle: Duration::from_millis(150),
                },
                RevealStep {
                    action: RevealAction::RelaxClipping,
                    settle: Duration::from_millis(100),
                },
                RevealStep {
                    action: RevealAction::ScrollAncestor,
                    settle: Duration::from_millis(200),
                },
            ],
            budget: Duration::from_secs(2),
            restore_grace: Duration::from_millis(300),
            max_ancestor_depth: 4,
        }
    }
}

impl RevealPolicy {
    /// The default escalation with every wait removed.
    #[must_use]
    pub fn immediate() -> Self {
        let mut policy = Self::default();
        for step in &mut policy.steps {
            step.settle = Duration::ZERO;
        }
        policy.restore_grace = Duration::ZERO;
        policy
    }
}

/// Best reading obtained from a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revealed {
    /// Longest trimmed text seen.
    pub text: String,
    /// Strategy that produced it.
    pub strategy: Strategy,
    /// Actions that were applied, in order.
    pub actions_applied: Vec<RevealAction>,
}

impl Revealed {
    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Read a node with every strategy and keep the longest trimmed text.
///
/// Ties go to the earlier strategy.
#[must_use]
pub fn read_best(node: &Selection) -> Revealed {
    let mut best = Revealed {
        text: String::new(),
        strategy: Strategy::RenderedText,
        actions_applied: Vec::new(),
    };
    let mut best_len = 0;
    for strategy in Strategy::ALL {
        let Some(text) = strategy.read(node) else {
            continue;
        };
        let text = text.trim();
        let len = text.chars().count();
        if len > best_len {
            best_len = len;
            best.text = text.to_string();
            best.strategy = strategy;
        }
    }
    best
}

/// Whether the node shows signs of clipped or collapsed content.
#[must_use]
pub fn looks_clipped(node: &Selection) -> bool {
    if dom::get_attribute(node, "style").is_some_and(|s| CLIPPING_STYLE.is_match(&s)) {
        return true;
    }
    let metric = |name: &str| dom::get_attribute(node, name).and_then(|v| v.trim().parse::<f64>().ok());
    if let (Some(scroll), Some(client)) = (metric("data-scroll-height"), metric("data-client-height")) {
        if scroll > client {
            return true;
        }
    }
    if dom::class_name(node).is_some_and(|c| TRUNCATION_HINT.is_match(&c)) {
        return true;
    }
    if dom::has_attribute(node, "data-truncated")
        || dom::get_attribute(node, "aria-expanded").as_deref() == Some("false")
    {
        return true;
    }
    node.select("[hidden]").exists()
}

/// Read a candidate, escalating through `policy` when it looks truncated.
///
/// The returned text is never shorter than a plain [`read_best`]. Styles
/// relaxed during escalation are restored before returning.
pub async fn reveal<'a>(node: &Selection<'a>, policy: &RevealPolicy) -> Revealed {
    let mut best = read_best(node);
    if !policy.enabled || !needs_reveal(node, &best, policy) {
        return best;
    }

    let mut guard = ClipGuard::default();
    if timeout(policy.budget, escalate(node, policy, &mut best, &mut guard))
        .await
        .is_err()
    {
        tracing::debug!(
            budget_ms = u64::try_from(policy.budget.as_millis()).unwrap_or(u64::MAX),
            len = best.len(),
            "reveal budget exhausted"
        );
    }
    guard.restore_after(policy.restore_grace).await;
    best
}

fn needs_reveal(node: &Selection, best: &Revealed, policy: &RevealPolicy) -> bool {
    best.len() < policy.min_len || looks_clipped(node)
}

async fn escalate<'a>(
    node: &Selection<'a>,
    policy: &RevealPolicy,
    best: &mut Revealed,
    guard: &mut ClipGuard<'a>,
) {
    for step in &policy.steps {
        let applied = match step.action {
            RevealAction::Toggle => toggle(node),
            RevealAction::RelaxClipping => relax_clipping(node, policy.max_ancestor_depth, guard),
            RevealAction::ScrollAncestor => scroll_ancestor(node, policy.max_ancestor_depth),
        };
        if !applied {
            continue;
        }
        best.actions_applied.push(step.action);
        if !step.settle.is_zero() {
            sleep(step.settle).await;
        }

        let reading = read_best(node);
        if reading.len() > best.len() {
            best.text = reading.text;
            best.strategy = reading.strategy;
        }
        tracing::trace!(action = ?step.action, len = best.len(), "reveal step applied");

        if !needs_reveal(node, best, policy) {
            break;
        }
    }
}

// === Toggle ===

fn behaves_like_toggle(sel: &Selection) -> bool {
    matches!(dom::tag_name(sel).as_deref(), Some("details" | "summary" | "button"))
        || dom::has_attribute(sel, "aria-expanded")
        || dom::get_attribute(sel, "role").as_deref() == Some("button")
        || dom::class_name(sel).is_some_and(|c| TOGGLE_CLASS.is_match(&c))
}

fn is_show_more(sel: &Selection) -> bool {
    let caption = dom::rendered_text(sel);
    let caption = caption.trim();
    if !caption.is_empty() && caption.chars().count() <= MAX_CONTROL_CAPTION {
        return SHOW_MORE_TEXT.is_match(caption);
    }
    dom::get_attribute(sel, "aria-label").is_some_and(|label| SHOW_MORE_TEXT.is_match(&label))
}

/// A "show more" control inside `scope` or `scope` itself.
fn show_more_in<'a>(scope: &Selection<'a>) -> Option<Selection<'a>> {
    if is_show_more(scope) {
        return Some(scope.clone());
    }
    scope.select(CONTROL_SELECTOR).iter().find(is_show_more)
}

fn find_toggle<'a>(node: &Selection<'a>) -> Option<Selection<'a>> {
    if behaves_like_toggle(node) {
        return Some(node.clone());
    }
    let closed_details = |s: &Selection| {
        dom::tag_name(s).as_deref() == Some("details") && !dom::has_attribute(s, "open")
    };
    if let Some(details) = dom::closest(node, closed_details) {
        return Some(details);
    }
    if let Some(control) = node.select(CONTROL_SELECTOR).iter().find(is_show_more) {
        return Some(control);
    }
    if let Some(control) = dom::next_element_sibling(node).and_then(|s| show_more_in(&s)) {
        return Some(control);
    }
    let parent = dom::parent(node);
    dom::next_element_sibling(&parent).and_then(|s| show_more_in(&s))
}

fn toggle(node: &Selection) -> bool {
    let Some(control) = find_toggle(node) else {
        return false;
    };

    dom::set_attribute(&control, "aria-expanded", "true");
    let is_details = |s: &Selection| dom::tag_name(s).as_deref() == Some("details");
    if let Some(details) = dom::closest(&control, is_details).or_else(|| dom::closest(node, is_details)) {
        dom::set_attribute(&details, "open", "");
    }

    if let Some(controls) = dom::get_attribute(&control, "aria-controls") {
        let root = dom::ancestors(node).pop().unwrap_or_else(|| node.clone());
        for target_id in controls.split_whitespace() {
            for target in root.select("[id]").iter() {
                if dom::id(&target).as_deref() == Some(target_id) {
                    dom::remove_attribute(&target, "hidden");
                    dom::remove_attribute(&target, "aria-hidden");
                }
            }
        }
    }

    dom::remove_attribute(node, "hidden");
    for hidden in node.select("[hidden]").iter() {
        dom::remove_attribute(&hidden, "hidden");
    }
    if dom::get_attribute(node, "aria-expanded").is_some() {
        dom::set_attribute(node, "aria-expanded", "true");
    }
    true
}

// === Relax clipping ===

/// Number of reveals currently holding an element relaxed.
const HOLDS_ATTR: &str = "data-reveal-holds";

/// Inline style the element had before the first hold.
const SAVED_STYLE_ATTR: &str = "data-reveal-style";

/// `hidden` value the element had before the first hold.
const SAVED_HIDDEN_ATTR: &str = "data-reveal-hidden";

/// Elements relaxed by one reveal.
///
/// The pre-reveal `style`/`hidden` values live on the element itself, so
/// overlapping reveals of the same document share them: only the first hold
/// records them and only the last release writes them back.
#[derive(Default)]
struct ClipGuard<'a> {
    held: Vec<Selection<'a>>,
    relaxed_at: Option<Instant>,
}

impl<'a> ClipGuard<'a> {
    fn relax(&mut self, sel: &Selection<'a>) {
        if !self.held.iter().any(|s| dom::same_node(s, sel)) {
            hold(sel);
            self.held.push(sel.clone());
        }

        let style = dom::get_attribute(sel, "style");
        let kept: Vec<&str> = style
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .filter(|decl| !decl.trim().is_empty() && !CLIPPING_DECLARATION.is_match(decl))
            .collect();
        let mut relaxed = kept.join(";");
        if !relaxed.is_empty() {
            relaxed.push(';');
        }
        relaxed.push_str("overflow: visible; max-height: none;");
        dom::set_attribute(sel, "style", &relaxed);
        dom::remove_attribute(sel, "hidden");
        self.relaxed_at.get_or_insert_with(Instant::now);
    }

    async fn restore_after(self, grace: Duration) {
        let Some(relaxed_at) = self.relaxed_at else {
            return;
        };
        if !grace.is_zero() {
            sleep_until(relaxed_at + grace).await;
        }
        for sel in &self.held {
            release(sel);
        }
    }
}

fn holds(sel: &Selection) -> Option<u32> {
    dom::get_attribute(sel, HOLDS_ATTR).and_then(|h| h.trim().parse().ok())
}

fn hold(sel: &Selection) {
    if let Some(count) = holds(sel) {
        dom::set_attribute(sel, HOLDS_ATTR, &(count + 1).to_string());
        return;
    }
    if let Some(style) = dom::get_attribute(sel, "style") {
        dom::set_attribute(sel, SAVED_STYLE_ATTR, &style);
    }
    if let Some(hidden) = dom::get_attribute(sel, "hidden") {
        dom::set_attribute(sel, SAVED_HIDDEN_ATTR, &hidden);
    }
    dom::set_attribute(sel, HOLDS_ATTR, "1");
}

fn release(sel: &Selection) {
    let count = holds(sel).unwrap_or(1);
    if count > 1 {
        dom::set_attribute(sel, HOLDS_ATTR, &(count - 1).to_string());
        return;
    }
    match dom::get_attribute(sel, SAVED_STYLE_ATTR) {
        Some(style) => dom::set_attribute(sel, "style", &style),
        None => dom::remove_attribute(sel, "style"),
    }
    if let Some(hidden) = dom::get_attribute(sel, SAVED_HIDDEN_ATTR) {
        dom::set_attribute(sel, "hidden", &hidden);
    }
    dom::remove_attribute(sel, SAVED_STYLE_ATTR);
    dom::remove_attribute(sel, SAVED_HIDDEN_ATTR);
    dom::remove_attribute(sel, HOLDS_ATTR);
}

fn is_clipping(sel: &Selection) -> bool {
    dom::has_attribute(sel, "hidden")
        || dom::get_attribute(sel, "style")
            .is_some_and(|s| CLIPPING_STYLE.is_match(&s) || HIDDEN_STYLE.is_match(&s))
}

fn relax_clipping<'a>(node: &Selection<'a>, max_depth: usize, guard: &mut ClipGuard<'a>) -> bool {
    let mut targets: Vec<Selection<'a>> = Vec::new();
    if is_clipping(node) {
        targets.push(node.clone());
    }
    targets.extend(
        dom::ancestors(node)
            .into_iter()
            .take(max_depth)
            .filter(|a| is_clipping(a)),
    );
    targets.extend(node.select("[hidden], [style]").iter().filter(|d| is_clipping(d)));

    for target in &targets {
        guard.relax(target);
    }
    !targets.is_empty()
}

// === Scroll ===

fn is_scrollable(sel: &Selection) -> bool {
    dom::get_attribute(sel, "style").is_some_and(|s| SCROLLABLE.is_match(&s))
        || dom::class_name(sel).is_some_and(|c| SCROLLABLE.is_match(&c))
}

fn scroll_ancestor(node: &Selection, max_depth: usize) -> bool {
    let scroller = if is_scrollable(node) {
        Some(node.clone())
    } else {
        dom::ancestors(node).into_iter().take(max_depth).find(is_scrollable)
    };
    let Some(scroller) = scroller else {
        return false;
    };

    let extent = dom::get_attribute(&scroller, "data-scroll-height").unwrap_or_else(|| "max".to_string());
    dom::set_attribute(&scroller, "data-scroll-top", &extent);
    for row in scroller.select("[data-lazy]").iter() {
        dom::remove_attribute(&row, "hidden");
        if dom::get_attribute(&row, "style").is_some_and(|s| HIDDEN_STYLE.is_match(&s)) {
            dom::remove_attribute(&row, "style");
        }
    }
    true
}
