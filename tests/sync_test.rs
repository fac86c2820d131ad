#![cfg(feature = "server")]

use artifact_sync::server::{router, ServerConfig};
use artifact_sync::sync::SyncClient;
use artifact_sync::{Artifact, Detector, Error, Event, Options, Page, Request, Response, Settings};
use chrono::Utc;
use std::time::{Duration, Instant};

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(&ServerConfig::default())).await.unwrap();
    });
    format!("http://{addr}")
}

fn artifact(content: &str, title: &str, language: &str) -> Artifact {
    Artifact::new(content, title, language, Utc::now())
}

#[tokio::test]
async fn health_and_path_checks() {
    let url = spawn_server().await;
    let client = SyncClient::new(&url, &Options::immediate()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");

    assert!(client.test_path(&dir.path().to_string_lossy()).await.unwrap());
    assert!(!client.test_path("/definitely/not/here").await.unwrap());
}

#[tokio::test]
async fn save_writes_into_project() {
    let url = spawn_server().await;
    let client = SyncClient::new(&url, &Options::immediate()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().to_string_lossy().into_owned();

    let saved = client
        .save(&artifact("SELECT 1;", "ping_query", "sql"), &project)
        .await
        .unwrap();

    assert!(saved.success);
    assert_eq!(saved.filename, "ping_query.sql");
    assert_eq!(saved.size, 9);
    assert_eq!(std::fs::read_to_string(dir.path().join("ping_query.sql")).unwrap(), "SELECT 1;");
}

#[tokio::test]
async fn server_rejections_surface_as_errors() {
    let url = spawn_server().await;
    let client = SyncClient::new(&url, &Options::immediate()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = client
        .save(&artifact("", "empty", "text"), &dir.path().to_string_lossy())
        .await
        .unwrap_err();

    match err {
        Error::ServerError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Missing required fields");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let client = SyncClient::new("http://127.0.0.1:1", &Options::immediate()).unwrap();
    assert!(matches!(client.health().await, Err(Error::NetworkError(_))));
}

#[tokio::test]
async fn batch_save_reports_each_artifact() {
    let url = spawn_server().await;
    let client = SyncClient::new(&url, &Options::immediate()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().to_string_lossy().into_owned();

    let events = client
        .save_all(
            &[
                artifact("a = 1", "config", "python"),
                artifact("", "broken", "python"),
                artifact("a = 2", "config", "python"),
            ],
            &project,
        )
        .await;

    assert_eq!(events.len(), 4);
    assert_eq!(
        events[0],
        Event::ArtifactSynced {
            data: artifact_sync::protocol::SyncedFile {
                filename: "config.py".into()
            }
        }
    );
    assert!(matches!(&events[1], Event::SyncError { error } if error.contains("400")));
    assert!(matches!(&events[2], Event::ArtifactSynced { data } if data.filename == "config_1.py"));
    assert_eq!(events[3], Event::SyncComplete { count: 3 });
}

#[tokio::test]
async fn batch_save_is_paced() {
    let url = spawn_server().await;
    let options = Options {
        save_pacing: Duration::from_millis(40),
        ..Options::immediate()
    };
    let client = SyncClient::new(&url, &options).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().to_string_lossy().into_owned();
    let batch: Vec<Artifact> = (0..3).map(|i| artifact(&format!("v = {i}"), "v", "python")).collect();

    let started = Instant::now();
    let events = client.save_all(&batch, &project).await;

    assert_eq!(events.last(), Some(&Event::SyncComplete { count: 3 }));
    assert!(started.elapsed() >= options.save_pacing * 2);
}

#[tokio::test]
async fn detector_syncs_whole_page() {
    let url = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        is_enabled: true,
        project_path: dir.path().to_string_lossy().into_owned(),
        server_url: url,
    };
    let detector = Detector::with_settings(Options::immediate(), settings);
    let page = Page::parse(
        r#"<pre><code class="language-bash">#!/usr/bin/env bash
set -euo pipefail
mkdir -p build
cargo build --release</code></pre>"#,
    );

    let reply = detector.handle(Request::SyncAll, &page).await;

    assert_eq!(reply.response, Response::ok());
    assert_eq!(reply.events.len(), 2);
    let Event::ArtifactSynced { data } = &reply.events[0] else {
        panic!("expected artifactSynced, got {:?}", reply.events[0]);
    };
    assert!(data.filename.ends_with(".sh"));
    assert!(dir.path().join(&data.filename).exists());
    assert_eq!(reply.events[1], Event::SyncComplete { count: 1 });
}
