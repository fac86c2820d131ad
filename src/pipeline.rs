//! One full scan of a page.
//!
//! Scanner → Revealer → Validator → Classifier → Titler → Deduplicator →
//! Artifact Store. Every candidate ends with an [`Outcome`]; nothing in a
//! scan fails, the worst case is an empty artifact list.

use chrono::Utc;
use serde::Serialize;

use crate::artifact::Artifact;
use crate::classifier::classify_node;
use crate::dedup::{find_duplicate, Duplicate};
use crate::options::Options;
use crate::page::Page;
use crate::reveal::{reveal, RevealAction, Strategy};
use crate::scanner::{collect_candidates, Tier};
use crate::store::ArtifactStore;
use crate::titler::derive_title;
use crate::validator::{validate, Rejection, Verdict};

/// What happened to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum Outcome {
    /// Became an artifact.
    Accepted,
    /// Failed validation.
    Rejected(Rejection),
    /// Folded into an artifact accepted earlier in the scan.
    Duplicate(Duplicate),
    /// No text could be read.
    Empty,
}

/// Per-candidate trace of a scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateReport {
    /// Selector that matched the candidate.
    pub selector: &'static str,
    /// Selector category.
    pub tier: Tier,
    /// Tag name.
    pub tag: String,
    /// Frame index, `0` for the top-level document.
    pub frame: usize,
    /// Characters read.
    pub length: usize,
    /// Strategy that produced the reading.
    pub strategy: Strategy,
    /// Reveal actions applied.
    pub actions: Vec<RevealAction>,
    /// Final outcome.
    pub outcome: Outcome,
}

/// Result of a scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Unique artifacts in detection order (the new store's contents).
    pub artifacts: Vec<Artifact>,
    /// The new store snapshot.
    pub store: ArtifactStore,
    /// One entry per candidate, in scan order.
    pub outcomes: Vec<CandidateReport>,
}

/// Scan `page` and build the next store snapshot from `previous`.
///
/// # Example
///
/// ```rust
/// use artifact_sync::{pipeline, ArtifactStore, Options, Page};
///
/// # tokio_test_block_on(async {
/// let page = Page::parse(r#"<pre><code class="language-rust">fn main() {
///     println!("hello from a generated snippet");
/// }</code></pre>"#);
/// let report = pipeline::scan(&page, &ArtifactStore::new(), &Options::immediate()).await;
/// assert_eq!(report.artifacts.len(), 1);
/// assert_eq!(report.artifacts[0].language, "rust");
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn scan(page: &Page, previous: &ArtifactStore, options: &Options) -> ScanReport {
    let candidates = collect_candidates(page);
    let mut accepted: Vec<Artifact> = Vec::new();
    let mut outcomes = Vec::with_capacity(candidates.len());

    for candidate in &candidates {
        let revealed = reveal(&candidate.node, &options.reveal).await;
        let text = revealed.text.as_str();

        let outcome = if text.is_empty() {
            Outcome::Empty
        } else {
            match validate(text, options) {
                Verdict::Reject(reason) => Outcome::Rejected(reason),
                Verdict::Accept => {
                    let now = Utc::now();
                    let language = classify_node(&candidate.node, text);
                    let title = derive_title(&candidate.node, text, &language, now, options);
                    let artifact = Artifact::new(text, &title, &language, now);
                    match find_duplicate(&artifact, &accepted, options) {
                        Some(duplicate) => Outcome::Duplicate(duplicate),
                        None => {
                            tracing::debug!(title = %artifact.title, language = %artifact.language, length = artifact.content_length, "accepted artifact");
                            accepted.push(artifact);
                            Outcome::Accepted
                        }
                    }
                }
            }
        };

        tracing::trace!(selector = candidate.selector, frame = candidate.frame, outcome = ?outcome, "candidate processed");
        outcomes.push(CandidateReport {
            selector: candidate.selector,
            tier: candidate.tier,
            tag: candidate.tag.clone(),
            frame: candidate.frame,
            length: revealed.text.chars().count(),
            strategy: revealed.strategy,
            actions: revealed.actions_applied,
            outcome,
        });
    }

    let store = ArtifactStore::rebuild(previous, accepted, Utc::now());
    tracing::info!(candidates = candidates.len(), artifacts = store.len(), "scan complete");

    ScanReport {
        artifacts: store.to_vec(),
        store,
        outcomes,
    }
}
