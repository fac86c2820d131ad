use artifact_sync::pipeline::{scan, Outcome};
use artifact_sync::reveal::RevealAction;
use artifact_sync::validator::Rejection;
use artifact_sync::{detect_artifacts, ArtifactStore, Detector, Options, Page, Request};

const PYTHON_BLOCK: &str = r#"<html><body>
<pre><code class="language-python">def foo():
    """Placeholder hook, replaced by the real handler later."""
    pass</code></pre>
</body></html>"#;

#[tokio::test]
async fn python_block_becomes_titled_artifact() {
    let artifacts = detect_artifacts(PYTHON_BLOCK, &Options::immediate()).await;

    assert_eq!(artifacts.len(), 1);
    let artifact = &artifacts[0];
    assert_eq!(artifact.language, "python");
    assert!(artifact.content.contains("def foo():"));
    assert_eq!(artifact.title, "foo_python");
    assert_eq!(artifact.content_length, artifact.content.chars().count());
}

const TWO_LINE_PYTHON_BLOCK: &str = r#"<pre><code class="language-python">def foo():
    pass</code></pre>"#;

#[tokio::test]
async fn two_line_block_is_below_length_floor() {
    let page = Page::parse(TWO_LINE_PYTHON_BLOCK);
    let report = scan(&page, &ArtifactStore::new(), &Options::immediate()).await;

    assert!(report.artifacts.is_empty());
    assert!(!report.outcomes.is_empty());
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.outcome == Outcome::Rejected(Rejection::TooShort)));
}

#[tokio::test]
async fn lower_length_floor_accepts_two_line_block() {
    let options = Options {
        min_content_len: 10,
        ..Options::immediate()
    };
    let artifacts = detect_artifacts(TWO_LINE_PYTHON_BLOCK, &options).await;

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].content, "def foo():\n    pass");
    assert_eq!(artifacts[0].title, "foo_python");
}

#[tokio::test]
async fn page_styles_are_rejected_as_css() {
    let styles = vec!["html[lang] body.dark { color: red; } .x{display:none}"; 20].join("\n");
    let page = Page::parse(&format!("<html><body><pre>{styles}</pre></body></html>"));

    let report = scan(&page, &ArtifactStore::new(), &Options::immediate()).await;

    assert!(report.artifacts.is_empty());
    assert_eq!(report.outcomes.len(), 1);
    assert!(matches!(
        report.outcomes[0].outcome,
        Outcome::Rejected(Rejection::CssDominant(_))
    ));
}

#[tokio::test]
async fn nested_matches_fold_into_one_artifact() {
    let page = Page::parse(PYTHON_BLOCK);
    let report = scan(&page, &ArtifactStore::new(), &Options::immediate()).await;

    let outcomes: Vec<&Outcome> = report.outcomes.iter().map(|r| &r.outcome).collect();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0], &Outcome::Accepted);
    assert!(matches!(outcomes[1], Outcome::Duplicate(_)));
}

#[tokio::test]
async fn repeated_detection_is_idempotent() {
    let html = r#"<html><body>
<pre><code class="language-rust">pub fn parse(input: &amp;str) -&gt; Option&lt;u32&gt; {
    input.trim().parse().ok()
}</code></pre>
<pre><code class="language-sql">SELECT id, email
  FROM accounts
  WHERE disabled = 0
  ORDER BY id;</code></pre>
</body></html>"#;
    let page = Page::parse(html);
    let detector = Detector::new(Options::immediate());

    let first = detector.detect(&page).await;
    let second = detector.detect(&page).await;
    detector.handle(Request::DetectArtifacts, &page).await;

    let ids = |store: &ArtifactStore| store.ids().cloned().collect::<Vec<_>>();
    assert_eq!(first.artifacts.len(), 2);
    assert_eq!(ids(&first.store), ids(&second.store));
    assert_eq!(ids(&first.store), ids(&detector.store()));
    assert_eq!(first.artifacts, second.artifacts);
}

#[tokio::test]
async fn ui_chrome_never_becomes_an_artifact() {
    let html = r#"<html><body>
<div class="font-mono">Copy</div>
<div class="truncate">New chat Chats Projects Recents Starred All chats and more sidebar entries</div>
<div class="whitespace-pre-wrap">Edited 3 minutes ago</div>
</body></html>"#;

    assert!(detect_artifacts(html, &Options::immediate()).await.is_empty());
}

#[tokio::test]
async fn frame_documents_are_scanned() {
    let html = r#"<html><body>
<iframe srcdoc="&lt;pre&gt;&lt;code class='language-javascript'&gt;export function sum(values) {
  return values.reduce((a, b) =&gt; a + b, 0);
}&lt;/code&gt;&lt;/pre&gt;"></iframe>
<iframe src="https://elsewhere.example/embed"></iframe>
</body></html>"#;
    let page = Page::with_url(html, "https://chat.example/c/42");

    let report = scan(&page, &ArtifactStore::new(), &Options::immediate()).await;

    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].language, "javascript");
    assert_eq!(report.artifacts[0].title, "sum_javascript");
    assert!(report.outcomes.iter().all(|o| o.frame == 1));
}

#[tokio::test]
async fn attached_frames_are_scanned() {
    let mut page = Page::with_url(
        r#"<html><body><iframe src="/artifact/7"></iframe></body></html>"#,
        "https://chat.example/c/42",
    );
    let frame = Page::parse(
        "<pre>SELECT name, COUNT(*)\n  FROM orders\n  GROUP BY name\n  ORDER BY 2 DESC;</pre>",
    );
    page.attach_frame("/artifact/7", frame).unwrap();

    let report = scan(&page, &ArtifactStore::new(), &Options::immediate()).await;

    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].language, "sql");
}

#[tokio::test]
async fn collapsed_blocks_are_expanded_before_reading() {
    let html = r#"<html><body>
<div class="code-block-collapsed" aria-expanded="false">
  <pre>import json</pre>
  <pre hidden>def load(path):
    with open(path) as f:
        return json.load(f)</pre>
</div>
</body></html>"#;
    let page = Page::parse(html);

    let report = scan(&page, &ArtifactStore::new(), &Options::immediate()).await;

    let container = report
        .outcomes
        .iter()
        .find(|o| o.selector == r#"[class*="code-block"]"#)
        .unwrap();
    assert_eq!(container.actions.first(), Some(&RevealAction::Toggle));
    assert_eq!(container.outcome, Outcome::Accepted);
    assert!(report.artifacts[0].content.contains("json.load(f)"));
}

#[tokio::test]
async fn previous_store_keeps_titles_stable() {
    let page = Page::parse(PYTHON_BLOCK);
    let options = Options::immediate();

    let first = scan(&page, &ArtifactStore::new(), &options).await;
    let second = scan(&page, &first.store, &options).await;

    assert_eq!(first.artifacts[0].timestamp, second.artifacts[0].timestamp);
    assert_eq!(first.artifacts[0].title, second.artifacts[0].title);
}
