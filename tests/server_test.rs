#![cfg(feature = "server")]

use artifact_sync::server::{router, ServerConfig};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    router(&ServerConfig::default())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn save_body(dir: &std::path::Path, title: &str, language: &str, content: &str) -> Value {
    json!({
        "content": content,
        "title": title,
        "language": language,
        "projectPath": dir.to_string_lossy(),
        "timestamp": "2024-05-01T12:00:00.000Z",
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = call(&app(), "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn colliding_titles_get_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let app = app();

    let (status, first) = call(&app, "POST", "/api/artifact", Some(save_body(dir.path(), "utils", "python", "x = 1"))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = call(&app, "POST", "/api/artifact", Some(save_body(dir.path(), "utils", "python", "x = 2"))).await;

    assert_eq!(first["filename"], "utils.py");
    assert_eq!(second["filename"], "utils_1.py");
    assert_eq!(first["success"], true);
    assert_eq!(second["size"], 5);
    assert_eq!(std::fs::read_to_string(dir.path().join("utils.py")).unwrap(), "x = 1");
    assert_eq!(std::fs::read_to_string(dir.path().join("utils_1.py")).unwrap(), "x = 2");
}

#[tokio::test]
async fn numbered_suffixes_fall_back_to_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.md"), "taken").unwrap();
    for n in 1..=5 {
        std::fs::write(dir.path().join(format!("notes_{n}.md")), "taken").unwrap();
    }

    let (status, body) = call(
        &app(),
        "POST",
        "/api/artifact",
        Some(save_body(dir.path(), "notes", "markdown", "# Notes")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let filename = body["filename"].as_str().unwrap();
    let stamp = filename.strip_prefix("notes_").and_then(|s| s.strip_suffix(".md")).unwrap();
    assert_eq!(stamp.len(), 13);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn titles_are_sanitized_into_filenames() {
    let dir = tempfile::tempdir().unwrap();
    let app = app();

    let (_, generic) = call(
        &app,
        "POST",
        "/api/artifact",
        Some(save_body(dir.path(), "code_my parser!_1714560000000", "rust", "fn main() {}")),
    )
    .await;
    let (_, empty) = call(&app, "POST", "/api/artifact", Some(save_body(dir.path(), "", "sql", "SELECT 1;"))).await;

    assert_eq!(generic["filename"], "my_parser.rs");
    assert_eq!(empty["filename"], "sql_document.sql");
}

#[tokio::test]
async fn missing_project_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");

    let (status, body) = call(&app(), "POST", "/api/artifact", Some(save_body(&nested, "deep", "json", "{}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(nested.join("deep.json").exists());
    assert_eq!(body["path"], &*nested.join("deep.json").to_string_lossy());
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app();

    let (status, body) = call(&app, "POST", "/api/artifact", Some(json!({"title": "x", "content": "y"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, _) = call(&app, "POST", "/api/artifact", Some(save_body(dir.path(), "x", "text", ""))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_path_reports_existence() {
    let dir = tempfile::tempdir().unwrap();
    let app = app();

    let (status, body) = call(&app, "POST", "/api/test-path", Some(json!({"path": dir.path().to_string_lossy()}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"valid": true}));

    let missing = dir.path().join("nope");
    let (status, body) = call(&app, "POST", "/api/test-path", Some(json!({"path": missing.to_string_lossy()}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"valid": false}));
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/artifact")
        .header("origin", "chrome-extension://abc")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("access-control-allow-origin"));
}
