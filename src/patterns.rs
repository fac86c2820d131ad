//! Compiled regex patterns for artifact detection.
//!
//! All patterns are compiled once at first use using `LazyLock`.
//! Patterns are organized by the pipeline stage that consumes them. Tables
//! that carry a label (UI chrome, markdown signatures) are plain data so the
//! validator and classifier stay simple table-driven evaluators.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Validation Patterns
// =============================================================================

/// A labelled pattern recognising page furniture rather than content.
pub struct UiSignature {
    /// Short name reported in rejection reasons and logs.
    pub label: &'static str,
    /// Pattern tested against the whole trimmed text.
    pub pattern: Regex,
}

/// Known UI-chrome signatures, checked in order.
///
/// Navigation and auth prompts match anywhere in the text (sidebars are often
/// captured together with a little real content). Product names, relative
/// times and presence labels must make up the entire text.
pub static UI_SIGNATURES: LazyLock<Vec<UiSignature>> = LazyLock::new(|| {
    let table: [(&str, &str); 7] = [
        ("navigation", r"(?i)\Anew\s*chat\s*chats\s*projects\s*recents"),
        ("navigation", r"(?i)\A(?:start new chat|new chat|recents|starred|all chats)(?:\s+(?:start new chat|new chat|recents|starred|all chats|projects|chats))+\s*\z"),
        ("auth-prompt", r"(?i)sign up to claude|continue with (?:google|apple|email)|log in to continue|sign in with (?:google|apple)"),
        ("product-name", r"(?i)\A\s*(?:claude|chatgpt|gemini|copilot)(?:\s+(?:pro|max|team|enterprise|opus|sonnet|haiku|\d[\d.]*))*\s*\z"),
        ("relative-time", r"(?i)\A\s*(?:edited\s+|updated\s+|last\s+edited\s+)?(?:just now|\d+\s+(?:seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)\s+ago)\s*\z"),
        ("presence", r"(?i)\A\s*(?:online|offline|away|active now|typing(?:\.\.\.|…)?|last seen [^\n]{0,40})\s*\z"),
        ("toolbar", r"(?i)\A\s*(?:copy|copied!?|share|retry|edit|download|publish)(?:\s+(?:copy|copied!?|share|retry|edit|download|publish|code))*\s*\z"),
    ];
    table
        .into_iter()
        .map(|(label, pattern)| UiSignature {
            label,
            pattern: Regex::new(pattern).expect("UI_SIGNATURES regex"),
        })
        .collect()
});

/// A full CSS rule on one line: `selector { prop: value; ... }`.
pub static CSS_RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A\s*[^{};()]+\{\s*(?:-{0,2}[a-zA-Z][-a-zA-Z]*\s*:\s*[^;{}]+;?\s*)+\}")
        .expect("CSS_RULE_LINE regex")
});

/// A line opening a CSS block: every token must look like a selector
/// (lowercase tag, `.class`, `#id`, `[attr]`, `:pseudo`, combinators).
pub static CSS_SELECTOR_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\A\s*(?:(?:[a-z][a-z0-9-]*|\*|[.#][\w-]+|\[[^\]]+\]|::?[\w-]+(?:\([^)]*\))?)+(?:\s*[>+~,]\s*|\s+)?)+\{\s*\z"#,
    )
    .expect("CSS_SELECTOR_OPEN regex")
});

/// A CSS declaration line for a well-known property (or a custom property).
pub static CSS_PROPERTY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\A\s*(?:--[\w-]+|-(?:webkit|moz|ms)-[\w-]+|(?:color|background|margin|padding|border|display|position|top|left|right|bottom|width|height|min-|max-|font|text-|line-|letter-|word-|white-space|overflow|opacity|z-index|flex|grid|align-|justify-|gap|transition|transform|animation|cursor|content|box-|outline|visibility|float|clear|list-style|vertical-align|fill|stroke|inset|place-)[\w-]*)\s*:\s*[^;{}]+;\s*\z",
    )
    .expect("CSS_PROPERTY_LINE regex")
});

/// A line holding only a closing brace.
pub static CSS_CLOSE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*\}\s*\z").expect("CSS_CLOSE_LINE regex"));

/// A CSS at-rule.
pub static CSS_AT_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A\s*@(?:media|import|font-face|keyframes|-webkit-keyframes|supports|charset|layer|tailwind|apply|page|namespace)\b")
        .expect("CSS_AT_RULE regex")
});

/// Known file extensions; text consisting only of a name ending in one of
/// these is a filename label, not content.
pub const FILENAME_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".jsx", ".ts", ".tsx", ".html", ".css", ".scss", ".md", ".json", ".yaml",
    ".yml", ".txt", ".rs", ".go", ".java", ".rb", ".php", ".sh", ".sql", ".xml", ".toml",
];

/// Keywords and symbols that indicate source code.
pub static CODE_INDICATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:def|class|import|const|let|var|function|async\s+function|export|return|package|using|#include|fn|pub\s+fn|func)\s|^\s*from\s+\S+\s+import\s|\)\s*\{|\}\s*else|\bif\s*\(|\bfor\s*\(|\bwhile\s*\(|module\.exports|^#!/|=>|```|^#{1,2}\s",
    )
    .expect("CODE_INDICATOR regex")
});

// =============================================================================
// Markdown Signatures
// =============================================================================

/// A labelled markdown construct.
pub struct MarkdownSignature {
    /// Construct name.
    pub name: &'static str,
    /// Pattern detecting the construct.
    pub pattern: Regex,
    /// Whether the classifier counts this signature (italic and links are
    /// too ambiguous in source code to vote for the `markdown` label).
    pub counts_for_classifier: bool,
}

/// Markdown constructs, shared by the validator and the classifier.
pub static MARKDOWN_SIGNATURES: LazyLock<Vec<MarkdownSignature>> = LazyLock::new(|| {
    let table: [(&str, &str, bool); 11] = [
        ("header", r"(?m)^#{1,6}\s+\S", true),
        ("bullet-list", r"(?m)^\s*[-*+]\s+\S", true),
        ("ordered-list", r"(?m)^\s*\d+\.\s+\S", true),
        ("bold", r"\*\*[^*\s](?:[^*\n]*[^*\s])?\*\*", true),
        ("italic", r"(?:^|[^*\w])\*[^*\s](?:[^*\n]*[^*\s])?\*(?:[^*\w]|$)", false),
        ("link", r"\[[^\]\n]+\]\([^)\s]+\)", false),
        ("code-fence", r"(?m)^\s*```", true),
        ("inline-code", r"`[^`\n]+`", true),
        ("blockquote", r"(?m)^>\s?\S", true),
        ("table", r"(?m)^\|.*\|\s*$", true),
        ("rule", r"(?m)^(?:-{3,}|\*{3,}|_{3,})\s*$", true),
    ];
    table
        .into_iter()
        .map(|(name, pattern, counts_for_classifier)| MarkdownSignature {
            name,
            pattern: Regex::new(pattern).expect("MARKDOWN_SIGNATURES regex"),
            counts_for_classifier,
        })
        .collect()
});

// =============================================================================
// Reveal Patterns
// =============================================================================

/// Class or attribute names indicating truncated or collapsed content.
pub static TRUNCATION_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)truncat|clamp|collapsed|ellipsis|max-h-|overflow-hidden|expandable")
        .expect("TRUNCATION_HINT regex")
});

/// Inline style declarations that clip content.
pub static CLIPPING_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)overflow(?:-[xy])?\s*:\s*(?:hidden|clip)|text-overflow\s*:\s*ellipsis|line-clamp\s*:\s*\d|max-height\s*:\s*(?:[\d.]|calc\()",
    )
    .expect("CLIPPING_STYLE regex")
});

/// A single clipping declaration, used when relaxing an inline style.
pub static CLIPPING_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:overflow(?:-[xy])?|text-overflow|(?:-webkit-)?line-clamp|max-height|display|visibility)\s*:")
        .expect("CLIPPING_DECLARATION regex")
});

/// Inline style declarations that hide an element from rendering.
pub static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden").expect("HIDDEN_STYLE regex")
});

/// Inline style or class of a scrollable container.
pub static SCROLLABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)overflow(?:-[xy])?\s*:\s*(?:auto|scroll)|\boverflow(?:-[xy])?-(?:auto|scroll)\b")
        .expect("SCROLLABLE regex")
});

/// Caption of a control that expands collapsed content.
pub static SHOW_MORE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A\s*(?:(?:show|see|view|read|load)\s+(?:more|all|full|everything)|expand\b|more\s*\z|\+\s*\d+\s+(?:more\s+)?lines)")
        .expect("SHOW_MORE_TEXT regex")
});

/// Class names of elements that behave like toggles.
pub static TOGGLE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:toggle|expand(?:er|able)?|collapsible|collapsed|show-more|disclosure)\b")
        .expect("TOGGLE_CLASS regex")
});

// =============================================================================
// Classification Patterns
// =============================================================================

/// `language-xxx` / `lang-xxx` class tokens.
pub static LANGUAGE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(?:language|lang)-([\w+#-]+)").expect("LANGUAGE_CLASS regex")
});

// =============================================================================
// Title Patterns
// =============================================================================

/// Class names of elements carrying a title or filename.
pub static TITLE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)title|filename|file-name|header-name").expect("TITLE_CLASS regex")
});

/// Class or test-id of a conversation message container.
pub static MESSAGE_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)message|conversation|chat-turn|\bturn\b|response|\bprose\b|assistant")
        .expect("MESSAGE_CONTAINER regex")
});

/// Sentence boundaries for conversational titles.
pub static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?:\n]+").expect("SENTENCE_BREAK regex"));

/// A filename mentioned in content.
pub static FILENAME_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b([\w-]+\.(?:jsx?|tsx?|py|html?|css|scss|java|cpp|hpp|php|rb|go|rs|swift|kt|scala|md|txt|json|ya?ml|toml|sh|sql|xml))(?:[\s,;:)"'\]]|\z)"#,
    )
    .expect("FILENAME_IN_TEXT regex")
});

/// An identifier introduced by a definition keyword.
pub static DEFINITION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:export\s+(?:default\s+)?)?(?:async\s+)?(?:pub\s+)?(?:function\*?|def|class|fn|func)\s+([A-Za-z_$][\w$]*)",
    )
    .expect("DEFINITION_NAME regex")
});

/// Single-line comment syntaxes; group 1 holds the comment text.
pub static LEADING_COMMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\A//\s*(.+)\z",
        r"\A/\*+\s*(.+?)\s*\*/\z",
        r"\A#\s*([^!].*)\z",
        r"\A--\s*(.+)\z",
        r"\A;+\s*(.+)\z",
        r"\A<!--\s*(.+?)\s*-->\z",
        r"\A%\s*(.+)\z",
        r#"\A(?:"""|''')\s*(.+?)\s*(?:"""|''')?\z"#,
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("LEADING_COMMENTS regex"))
    .collect()
});

/// Characters that may not appear in filenames.
pub static FORBIDDEN_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("FORBIDDEN_FILENAME_CHARS regex"));

// =============================================================================
// Text Cleaning Patterns
// =============================================================================

/// Matches multiple whitespace characters for normalization.
pub static WHITESPACE_NORMALIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_NORMALIZE regex"));

/// Matches runs of underscores.
pub static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("UNDERSCORE_RUN regex"));

/// Markup tags, for the stripped-markup extraction strategy.
pub static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("MARKUP_TAG regex"));

/// Tags that end a rendered line.
pub static LINE_BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr|h[1-6]|pre|blockquote|section|article|header|footer|table|ul|ol)>")
        .expect("LINE_BREAK_TAG regex")
});

/// Runs of three or more newlines.
pub static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("BLANK_LINES regex"));
