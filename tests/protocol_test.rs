use artifact_sync::protocol::DebugReport;
use artifact_sync::{Detector, Event, Options, Page, Request, Response};
use serde_json::json;

const PAGE: &str = r#"<html><head><title>Refactor chat</title></head><body>
<div data-message-author-role="assistant">
  <p>Here is the updated handler for the upload route.</p>
  <pre><code class="language-typescript">export async function handleUpload(req: Request): Promise&lt;Response&gt; {
  const body = await req.formData();
  return new Response(String(body.get("name")));
}</code></pre>
</div>
<div class="font-mono">Copy</div>
</body></html>"#;

fn roundtrip_request(json: serde_json::Value) -> Request {
    Request::from_json(&json.to_string()).unwrap()
}

#[tokio::test]
async fn ping_is_side_effect_free() {
    let detector = Detector::new(Options::immediate());
    let page = Page::parse(PAGE);
    detector.detect(&page).await;
    let before = detector.store();
    let settings = detector.settings();

    for _ in 0..3 {
        let reply = detector.handle(roundtrip_request(json!({"action": "ping"})), &page).await;
        assert_eq!(serde_json::to_value(&reply.response).unwrap(), json!({"success": true}));
        assert!(reply.events.is_empty());
    }

    assert_eq!(detector.store().to_vec(), before.to_vec());
    assert_eq!(detector.settings(), settings);
    assert_eq!(detector.scan_count(), 1);
}

#[tokio::test]
async fn detect_artifacts_reply_has_wire_shape() {
    let detector = Detector::new(Options::immediate());
    let reply = detector
        .handle(roundtrip_request(json!({"action": "detectArtifacts"})), &Page::parse(PAGE))
        .await;

    let value = serde_json::to_value(&reply.response).unwrap();
    let artifacts = value["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0]["language"], "typescript");
    assert_eq!(artifacts[0]["title"], "Here_is_the_updated_handler_for_the_upload_route");
    assert!(artifacts[0]["contentLength"].as_u64().unwrap() > 50);
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn debug_detection_reports_counts_and_samples() {
    let detector = Detector::new(Options::immediate());
    let page = Page::with_url(PAGE, "https://chat.example/c/9");

    let reply = detector.handle(Request::DebugDetection, &page).await;
    let Response::Debug { debug_info } = &reply.response else {
        panic!("expected debug response");
    };
    let report: &DebugReport = debug_info;

    assert_eq!(report.url, "https://chat.example/c/9");
    assert_eq!(report.title, "Refactor chat");
    assert_eq!(report.pre_tags, 1);
    assert_eq!(report.font_mono, 1);
    assert_eq!(report.artifacts_found, 1);
    assert!(report.total_elements > report.code_elements);

    let mono = report.elements_found.iter().find(|s| s.selector == ".font-mono").unwrap();
    assert_eq!(mono.elements[0].tag_name, "DIV");
    assert_eq!(mono.elements[0].text_preview, "Copy");
    assert!(!mono.elements[0].is_valid);

    let value = serde_json::to_value(&reply.response).unwrap();
    assert!(value["debugInfo"]["elementsFound"].is_array());
    assert!(value["debugInfo"]["totalElements"].is_u64());
    assert!(detector.store().is_empty());
}

#[tokio::test]
async fn settings_updates_merge() {
    let detector = Detector::new(Options::immediate());
    let page = Page::parse("");

    detector
        .handle(roundtrip_request(json!({"action": "updateProjectPath", "path": "/srv/project"})), &page)
        .await;
    detector
        .handle(
            roundtrip_request(json!({"action": "updateSettings", "settings": {"isEnabled": true}})),
            &page,
        )
        .await;

    let settings = detector.settings();
    assert!(settings.is_enabled);
    assert_eq!(settings.project_path, "/srv/project");
    assert_eq!(settings.server_url, "http://localhost:8765");
}

#[tokio::test]
async fn save_all_without_project_path_reports_each_failure() {
    let detector = Detector::new(Options::immediate());
    let reply = detector.handle(Request::SaveAll, &Page::parse(PAGE)).await;

    assert_eq!(reply.response, Response::ok());
    assert_eq!(
        reply.events,
        vec![
            Event::SyncError {
                error: "No project path set".to_string()
            },
            Event::SyncComplete { count: 1 },
        ]
    );
}

#[test]
fn malformed_requests_are_errors() {
    assert!(Request::from_json("not json").is_err());
    assert!(Request::from_json(r#"{"action":"toggleMonitoring"}"#).is_err());
    assert!(Request::from_json(r#"{"enabled":true}"#).is_err());
}
