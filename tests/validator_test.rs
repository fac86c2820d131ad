use artifact_sync::validator::{css_ratio, validate, Rejection, Verdict};
use artifact_sync::Options;

#[test]
fn short_text_is_rejected_whatever_its_shape() {
    let options = Options::default();
    for text in [
        "fn main() {}",
        "# Title\n- a\n- b",
        "SELECT * FROM users WHERE id = 1;",
        "x".repeat(49).as_str(),
    ] {
        assert_eq!(validate(text, &options), Verdict::Reject(Rejection::TooShort), "{text:?}");
    }
}

#[test]
fn css_dominated_text_is_rejected_despite_code_shape() {
    let text = ".card { padding: 4px; }\n.card:hover { color: red; }\n.title {\n  font-size: 12px;\n}\nconst x = 1;";
    assert!(css_ratio(text) > 0.7);
    assert!(matches!(
        validate(text, &Options::default()),
        Verdict::Reject(Rejection::CssDominant(_))
    ));
}

#[test]
fn repeated_page_styles_are_rejected() {
    let text = vec!["html[lang] body.dark { color: red; } .x{display:none}"; 12].join("\n");
    assert!(matches!(
        validate(&text, &Options::default()),
        Verdict::Reject(Rejection::CssDominant(_))
    ));
}

#[test]
fn navigation_chrome_is_rejected() {
    let text = "New chat Chats Projects Recents Starred conversations and everything else in the sidebar";
    assert!(matches!(
        validate(text, &Options::default()),
        Verdict::Reject(Rejection::UiChrome("navigation"))
    ));
}

#[test]
fn code_and_markdown_are_accepted() {
    let options = Options::default();
    let code = "import os\n\ndef list_files(root):\n    return sorted(os.listdir(root))\n";
    let markdown = "# Release notes\n\n- Faster scans of long pages\n- **Breaking:** settings moved\n";

    assert!(validate(code, &options).is_accept());
    assert!(validate(markdown, &options).is_accept());
}

#[test]
fn long_plain_prose_needs_several_lines() {
    let options = Options::default();
    let sentence = "The quick brown fox jumps over the lazy dog and keeps running. ";
    let one_line = sentence.repeat(5);
    let many_lines = vec![sentence.repeat(2); 4].join("\n");

    assert_eq!(validate(&one_line, &options), Verdict::Reject(Rejection::NoStructure));
    assert!(validate(&many_lines, &options).is_accept());
}

#[test]
fn thresholds_follow_options() {
    let strict = Options {
        min_content_len: 500,
        ..Options::default()
    };
    let code = "fn main() {\n    println!(\"a block that is long enough by default\");\n}";

    assert!(validate(code, &Options::default()).is_accept());
    assert_eq!(validate(code, &strict), Verdict::Reject(Rejection::TooShort));
}
