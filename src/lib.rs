//! # artifact-sync
//!
//! Detects generated code and markdown blocks ("artifacts") in snapshots of
//! chat pages, classifies their language, gives them filesystem-safe titles,
//! removes duplicates, and saves them into a project directory through a
//! small HTTP persistence service.
//!
//! ## Quick Start
//!
//! ```rust
//! use artifact_sync::{detect_artifacts, Options};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let html = r#"<pre><code class="language-python">def greet(name):
//!     return f"hello {name}, this block came from a chat"</code></pre>"#;
//!
//! let artifacts = detect_artifacts(html, &Options::immediate()).await;
//! assert_eq!(artifacts.len(), 1);
//! assert_eq!(artifacts[0].language, "python");
//! assert_eq!(artifacts[0].title, "greet_python");
//! # });
//! ```
//!
//! ## Pipeline
//!
//! - **Scanner**: prioritized structural selectors over the page and its frames
//! - **Revealer**: reads truncated or collapsed content, expanding it if needed
//! - **Validator**: rejects UI chrome, stylesheets, bare filenames and short text
//! - **Classifier**: table-driven language scoring with DOM hints
//! - **Titler**: metadata, conversation, content and fallback titles
//! - **Deduplicator**: exact, similar and same-title duplicates
//!
//! A [`Detector`] wraps the pipeline behind the host command envelope
//! ([`Request`] in, [`Reply`] out), and [`sync::SyncClient`] talks to the
//! persistence service in [`server`].

mod error;
mod options;
mod patterns;

/// DOM helpers over `dom_query`.
pub mod dom;

/// Character encoding detection and transcoding.
pub mod encoding;

/// Document snapshots and their frames.
pub mod page;

/// Candidate collection.
pub mod scanner;

/// Reading and revealing candidate content.
pub mod reveal;

/// Content validation rules.
pub mod validator;

/// Language classification.
pub mod classifier;

/// Title derivation and sanitizing.
pub mod titler;

/// Duplicate detection.
pub mod dedup;

/// Artifact records and identities.
pub mod artifact;

/// Artifact store snapshots.
pub mod store;

/// Full scans.
pub mod pipeline;

/// Host command envelope and events.
pub mod protocol;

/// Host-facing detection engine.
pub mod detector;

/// Scan triggers.
pub mod monitor;

/// Persistence service client.
pub mod sync;

/// Persistence service.
#[cfg(feature = "server")]
pub mod server;

// Public API - re-exports
pub use artifact::{Artifact, ArtifactId};
pub use detector::Detector;
pub use error::{Error, Result};
pub use options::{Options, Settings, SettingsPatch, DEFAULT_SERVER_URL};
pub use page::Page;
pub use protocol::{Event, Reply, Request, Response};
pub use store::ArtifactStore;

/// Detect the artifacts in an HTML snapshot.
///
/// Equivalent to parsing the snapshot into a [`Page`] and running
/// [`pipeline::scan`] against an empty store.
pub async fn detect_artifacts(html: &str, options: &Options) -> Vec<Artifact> {
    let page = Page::parse(html);
    pipeline::scan(&page, &ArtifactStore::new(), options).await.artifacts
}

/// Detect the artifacts in raw snapshot bytes, honouring a declared charset.
///
/// # Example
///
/// ```rust
/// use artifact_sync::{detect_bytes, Options};
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let html = b"<html><head><meta charset=\"ISO-8859-1\"></head><body><pre>def caf\xE9():\n    return {'menu': 'espresso', 'open': True, 'seats': 12}</pre></body></html>";
/// let artifacts = detect_bytes(html, None, &Options::immediate()).await;
/// assert!(artifacts[0].content.contains("café"));
/// # });
/// ```
pub async fn detect_bytes(bytes: &[u8], url: Option<&str>, options: &Options) -> Vec<Artifact> {
    let page = Page::from_bytes(bytes, url);
    pipeline::scan(&page, &ArtifactStore::new(), options).await.artifacts
}
