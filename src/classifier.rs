//! Language classification.
//!
//! Table-driven: markdown is checked first, then every language pattern is
//! scored by its number of non-overlapping matches. The highest score wins,
//! ties keep the earlier table entry, and no match at all yields `"text"`.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{self, Selection};
use crate::patterns::{LANGUAGE_CLASS, MARKDOWN_SIGNATURES};

/// Label for content that matched no language.
pub const TEXT: &str = "text";

/// Label returned by the markdown check.
pub const MARKDOWN: &str = "markdown";

/// Markdown signatures needed for the `markdown` label.
const MARKDOWN_MIN_SIGNATURES: usize = 2;

/// Ancestors inspected for a language hint.
const HINT_ANCESTOR_DEPTH: usize = 3;

/// One entry of the language table.
pub struct LanguagePattern {
    /// Language label.
    pub label: &'static str,
    /// Structural signature; every non-overlapping match scores one point.
    pub pattern: Regex,
}

/// Language signatures in tie-break order.
#[allow(clippy::expect_used)]
pub static LANGUAGE_TABLE: LazyLock<Vec<LanguagePattern>> = LazyLock::new(|| {
    let table: [(&str, &str); 26] = [
        ("javascript", r#"\b(?:const|let|var)\s+\w+\s*=|\bfunction\s*\w*\s*\(|=>|\bconsole\.\w+\(|\b(?:document|window)\.\w+|\brequire\(['"]|module\.exports|\bexport\s+(?:default|const|function|class)\b|\bimport\s+[\w{}\s,*]+\s+from\s+['"]"#),
        ("typescript", r"\binterface\s+\w+(?:<[^>]*>)?\s*\{|\btype\s+\w+(?:<[^>]*>)?\s*=|:\s*(?:string|number|boolean|void|any|unknown|never)\b|\b(?:public|private|protected|readonly)\s+\w+\s*[:?]|\bas\s+(?:string|number|const|any)\b|\benum\s+\w+\s*\{"),
        ("jsx", r"<[A-Z]\w*[\s/>]|\bclassName=|\buse(?:State|Effect|Ref|Memo|Callback|Context|Reducer)\(|\breturn\s*\(\s*<|\bReact\.\w+"),
        ("html", r"(?i)<!DOCTYPE\s+html|<(?:html|head|body|div|span|p|a|ul|ol|li|table|form|input|button|meta|link|script|section|header|footer|nav|main|h[1-6])\b[^>]*>|</(?:html|head|body|div|span|p|a|ul|ol|li|table|form|button|script|section|header|footer|nav|main|h[1-6])>"),
        ("css", r"(?m)^\s*[.#][\w-]+[^{\n;]*\{|^\s*(?:color|background(?:-color)?|margin(?:-\w+)?|padding(?:-\w+)?|border(?:-\w+)?|display|font-(?:size|weight|family)|width|height|position|flex(?:-\w+)?|grid-template-\w+|text-align|z-index)\s*:\s*[^;{}\n]+;|@media\b|@keyframes\b|@font-face\b"),
        ("scss", r#"\$[\w-]+\s*:|@mixin\b|@include\b|@extend\b|&:[\w-]+|&\.[\w-]+|@use\s+['"]"#),
        ("python", r"(?m)^\s*def\s+\w+\s*\(|^\s*class\s+\w+(?:\([^)]*\))?\s*:|^\s*(?:from\s+[\w.]+\s+)?import\s+\w+|\bprint\(|\bself\.|^\s*(?:if|elif|for|while|with|try|except)\b[^\n{;]*:\s*$|__\w+__|\bNone\b|\b(?:True|False)\b"),
        ("java", r"\bpublic\s+(?:static\s+)?(?:final\s+)?(?:class|interface|void|int|String|boolean)\b|\bSystem\.out\.print|\bprivate\s+(?:final\s+)?\w+(?:<[^>]*>)?\s+\w+\s*[;=]|@Override\b|\bimport\s+java\.|String\[\]\s+args"),
        ("cpp", r"#include\s*<(?:iostream|vector|string|map|memory|algorithm)>|\bstd::|\bcout\s*<<|\bcin\s*>>|\btemplate\s*<|\busing\s+namespace\b|\bnullptr\b|\w+::\w+\("),
        ("c", r"#include\s*<(?:stdio|stdlib|string|math|unistd|stdint)\.h>|\bprintf\s*\(|\bscanf\s*\(|\bmalloc\s*\(|\bfree\s*\(|\bint\s+main\s*\(|\bstruct\s+\w+\s*\{|\w+->\w+"),
        ("php", r"<\?php|\$\w+\s*=[^=>]|\$this->|\becho\s+[$'\x22]|\bfunction\s+\w+\s*\(\s*\$|\bnamespace\s+[\w\\]+;|\buse\s+[A-Z][\w\\]+;"),
        ("ruby", r#"(?m)^\s*def\s+\w+[?!]?\s*$|^\s*end\s*$|\bputs\s|\brequire\s+['"]|\battr_(?:accessor|reader|writer)\b|\.each\s+do\b|\bdo\s*\|\w+(?:,\s*\w+)*\||:\w+\s*=>|^\s*module\s+[A-Z]"#),
        ("go", r"\bpackage\s+\w+|\bfunc\s+(?:\([^)]*\)\s*)?\w+\s*\(|:=|\bfmt\.\w+|\bgo\s+func\b|\bchan\s+\w+|\bdefer\s+\w+|\bimport\s+\("),
        ("rust", r"\bfn\s+\w+|\blet\s+mut\s+|\bimpl(?:<[^>]*>)?\s+\w+|\bpub(?:\(crate\))?\s+(?:fn|struct|enum|mod|trait|use)\b|\buse\s+\w+::|\bmatch\s+\w+\s*\{|\b\w+!\(|&mut\s|\b(?:Some|Ok|Err)\(|::new\(|->\s*(?:Self|Result|Option|bool|String|usize|i32|u8|&)"),
        ("swift", r"\bfunc\s+\w+\s*\([^)]*\)\s*->|\b(?:var|let)\s+\w+\s*:\s*[A-Z]\w*[?!]?\s*[=\n]|\bguard\s+let\b|\bif\s+let\b|\bimport\s+(?:UIKit|SwiftUI|Foundation)\b|@(?:State|Published|Binding)\b|\bstruct\s+\w+\s*:\s*View\b"),
        ("kotlin", r"\bfun\s+\w+\s*\(|\bval\s+\w+\s*[:=]|\bdata\s+class\b|\bprintln\(|\bcompanion\s+object\b|\bwhen\s*\([^)]*\)\s*\{|\?:\s"),
        ("scala", r"\bobject\s+\w+|\bcase\s+class\b|\bdef\s+\w+\s*(?:\[[^\]]*\])?\s*\([^)]*\)\s*:\s*\w+|\bimplicit\s|\btrait\s+\w+|\bextends\s+App\b"),
        ("sql", r"(?i)\bSELECT\s+[\w*,\s.()]+?\s+FROM\b|\bINSERT\s+INTO\b|\bUPDATE\s+\w+\s+SET\b|\bDELETE\s+FROM\b|\bCREATE\s+(?:TABLE|INDEX|VIEW|DATABASE)\b|\bALTER\s+TABLE\b|\bDROP\s+TABLE\b|\b(?:INNER|LEFT|RIGHT|OUTER)\s+JOIN\b|\bGROUP\s+BY\b|\bORDER\s+BY\b"),
        ("json", r#"(?s)\A\s*\{\s*"[^"]+"\s*:.*\}\s*\z|\A\s*\[\s*[\[{"\d].*\]\s*\z|"[\w$@.-]+"\s*:\s*(?:"|-?\d|true\b|false\b|null\b|\{|\[)"#),
        ("xml", r"\A\s*<\?xml\b|\bxmlns(?::\w+)?\s*=|<!\[CDATA\[|</\w+:[\w-]+>|</[\w:-]+>\s*\z"),
        ("yaml", r"(?m)^---\s*$|^\s*[\w-]+:\s+[^\s{\[#;(][^\n;,{]*$|^\s*[\w-]+:\s*$|^\s*-\s+[\w-]+:\s"),
        ("bash", r#"(?m)\A#!/(?:usr/)?bin/(?:env\s+)?(?:ba|z)?sh\b|^\s*(?:sudo\s+)?(?:apt(?:-get)?|brew|yum|pip3?|npm|cargo|chmod|chown|mkdir|export|source)\s+\S|"\$\{?\w+\}?"|\$\(|\$\{\w+[:#%/]|;\s*then\b|^\s*(?:fi|done|esac)\s*$|\|\s*(?:grep|awk|sed|xargs)\b"#),
        ("powershell", r"\b(?:Get|Set|New|Remove|Write|Invoke|Start|Stop|Import|Export|Out|Select|Where|ForEach)-[A-Z][a-zA-Z]+|\$PSVersionTable|\[CmdletBinding\(|\bparam\s*\(|\s-(?:eq|ne|gt|lt|ge|le|like|match)\s|\$_\."),
        ("dockerfile", r"(?m)^\s*(?:FROM\s+[\w./:@-]+(?:\s+AS\s+\w+)?\s*$|RUN\s|CMD\s|ENTRYPOINT\s|COPY\s|ADD\s|WORKDIR\s|EXPOSE\s+\d|ENV\s+\w|ARG\s+\w|LABEL\s|USER\s+\w|VOLUME\s)"),
        ("nginx", r"\bserver\s*\{|\blocation\s+[~=^*]*\s*\S+\s*\{|\bproxy_pass\s+|\blisten\s+\d+|\bserver_name\s+|\broot\s+/\S*;|\bupstream\s+\w+\s*\{|\bworker_processes\b|\bhttp\s*\{|\badd_header\s+|\btry_files\s+"),
        ("apache", r"(?i)</?VirtualHost\b|</?Directory\b|<IfModule\b|\bDocumentRoot\s|\bServerName\s|\bServerAlias\s|\bRewriteEngine\s+On\b|\bRewrite(?:Rule|Cond)\s|\bAllowOverride\s|\bRequire\s+all\s"),
    ];
    table
        .into_iter()
        .map(|(label, pattern)| LanguagePattern {
            label,
            pattern: Regex::new(pattern).expect("LANGUAGE_TABLE regex"),
        })
        .collect()
});

/// Label of the text, by markdown check then language scoring.
///
/// # Example
///
/// ```rust
/// use artifact_sync::classifier::classify;
///
/// assert_eq!(classify("def main():\n    print('hi')\n"), "python");
/// assert_eq!(classify("# Title\n- item\nfunction foo() {}"), "markdown");
/// assert_eq!(classify("just some words"), "text");
/// ```
#[must_use]
pub fn classify(text: &str) -> &'static str {
    let text = text.trim();
    if markdown_signature_count(text) >= MARKDOWN_MIN_SIGNATURES {
        return MARKDOWN;
    }

    let mut best = TEXT;
    let mut best_score = 0;
    for (label, score) in score(text) {
        // strictly greater keeps the earlier entry on ties
        if score > best_score {
            best = label;
            best_score = score;
        }
    }
    best
}

/// Every table entry with its match count, in table order.
#[must_use]
pub fn score(text: &str) -> Vec<(&'static str, usize)> {
    LANGUAGE_TABLE
        .iter()
        .map(|entry| (entry.label, entry.pattern.find_iter(text).count()))
        .collect()
}

/// Number of distinct markdown signatures the classifier counts.
#[must_use]
pub fn markdown_signature_count(text: &str) -> usize {
    MARKDOWN_SIGNATURES
        .iter()
        .filter(|s| s.counts_for_classifier && s.pattern.is_match(text))
        .count()
}

/// Whether `label` is a classifier label other than `text`.
#[must_use]
pub fn is_known_label(label: &str) -> bool {
    label == MARKDOWN || LANGUAGE_TABLE.iter().any(|entry| entry.label == label)
}

/// Map common aliases onto classifier labels.
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let label = match lower.as_str() {
        "js" | "mjs" | "cjs" | "node" | "nodejs" | "ecmascript" => "javascript",
        "ts" | "mts" => "typescript",
        "tsx" | "react" => "jsx",
        "py" | "py3" | "python3" => "python",
        "sh" | "shell" | "zsh" | "console" | "shellscript" => "bash",
        "yml" => "yaml",
        "rs" => "rust",
        "c++" | "cc" | "cxx" | "hpp" => "cpp",
        "h" => "c",
        "md" | "mdx" => "markdown",
        "golang" => "go",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "ps" | "ps1" | "pwsh" => "powershell",
        "docker" => "dockerfile",
        "htm" | "xhtml" => "html",
        "sass" => "scss",
        "apacheconf" | "htaccess" => "apache",
        "postgresql" | "postgres" | "mysql" | "sqlite" | "plsql" => "sql",
        other => other,
    };
    label.to_string()
}

/// Language declared by markup on the node, a `<code>` child, or a close
/// ancestor: `language-*`/`lang-*` classes or `data-language`, `data-lang`,
/// `data-mode` attributes. Only known labels are returned.
#[must_use]
pub fn language_hint(node: &Selection) -> Option<String> {
    let mut scopes = vec![node.clone()];
    let code = dom::query_selector(node, "code");
    if code.exists() {
        scopes.push(code);
    }
    scopes.extend(dom::ancestors(node).into_iter().take(HINT_ANCESTOR_DEPTH));

    scopes.iter().find_map(|scope| {
        let from_class = dom::class_name(scope)
            .and_then(|c| LANGUAGE_CLASS.captures(&c).map(|caps| caps[1].to_string()));
        let raw = from_class.or_else(|| {
            ["data-language", "data-lang", "data-mode"]
                .iter()
                .find_map(|attr| dom::get_attribute(scope, attr))
        })?;
        let label = normalize_label(&raw);
        is_known_label(&label).then_some(label)
    })
}

/// Label for a candidate: a markup hint when present, else the text's.
#[must_use]
pub fn classify_node(node: &Selection, text: &str) -> String {
    language_hint(node).unwrap_or_else(|| classify(text).to_string())
}

/// File extension used when persisting an artifact of `label`.
#[must_use]
pub fn file_extension(label: &str) -> &'static str {
    match label {
        "javascript" => ".js",
        "typescript" => ".ts",
        "python" => ".py",
        "html" => ".html",
        "css" => ".css",
        "jsx" => ".jsx",
        "java" => ".java",
        "sql" => ".sql",
        "json" => ".json",
        "xml" => ".xml",
        "yaml" => ".yml",
        "markdown" => ".md",
        "bash" => ".sh",
        "powershell" => ".ps1",
        "php" => ".php",
        "ruby" => ".rb",
        "go" => ".go",
        "rust" => ".rs",
        "cpp" => ".cpp",
        "c" => ".c",
        "scss" => ".scss",
        "swift" => ".swift",
        "kotlin" => ".kt",
        "scala" => ".scala",
        "dockerfile" => ".dockerfile",
        "nginx" | "apache" => ".conf",
        _ => ".txt",
    }
}
