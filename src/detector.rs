//! Host-facing detection engine.
//!
//! A [`Detector`] owns the host settings and the latest artifact store
//! snapshot, and answers [`Request`]s against a [`Page`] supplied by the
//! host. It runs on one thread; state lives in `RefCell`s and no borrow is
//! held across an await, so overlapping requests interleave safely and the
//! store is replaced in a single assignment when a scan finishes.

use std::cell::{Cell, RefCell};

use chrono::{SecondsFormat, Utc};

use crate::artifact::Artifact;
use crate::dom::{self, Selection};
use crate::monitor::Trigger;
use crate::options::{Options, Settings};
use crate::page::Page;
use crate::pipeline::{self, ScanReport};
use crate::protocol::{DebugReport, ElementSample, Event, Reply, Request, Response, SelectorSample};
use crate::scanner::{select_all, CANDIDATE_SELECTORS};
use crate::store::ArtifactStore;
use crate::sync::SyncClient;
use crate::validator::{looks_like_code, validate};

/// Elements sampled per selector in a debug report.
const DEBUG_SAMPLES: usize = 3;

/// Characters of text kept in a debug sample.
const PREVIEW_LEN: usize = 100;

const CODE_ELEMENTS: &str = r#"code, pre, .font-mono, [class*="code"]"#;

/// Detection engine bound to one host.
#[derive(Debug, Default)]
pub struct Detector {
    options: Options,
    settings: RefCell<Settings>,
    store: RefCell<ArtifactStore>,
    scans: Cell<u64>,
}

impl Detector {
    /// Create a detector with default settings.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self::with_settings(options, Settings::default())
    }

    /// Create a detector with `settings` loaded by the host.
    #[must_use]
    pub fn with_settings(options: Options, settings: Settings) -> Self {
        Self {
            options,
            settings: RefCell::new(settings),
            store: RefCell::new(ArtifactStore::new()),
            scans: Cell::new(0),
        }
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    /// Latest store snapshot.
    #[must_use]
    pub fn store(&self) -> ArtifactStore {
        self.store.borrow().clone()
    }

    /// Whether monitoring triggers should start scans.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.settings.borrow().is_enabled
    }

    /// Number of scans whose result replaced the store.
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.scans.get()
    }

    /// Answer one host request.
    pub async fn handle(&self, request: Request, page: &Page) -> Reply {
        match request {
            Request::Ping => Reply::new(Response::ok()),
            Request::ToggleMonitoring { enabled } => {
                self.settings.borrow_mut().is_enabled = enabled;
                tracing::info!(enabled, "monitoring toggled");
                Reply::new(Response::ok())
            }
            Request::UpdateProjectPath { path } => {
                tracing::info!(%path, "project path updated");
                self.settings.borrow_mut().project_path = path;
                Reply::new(Response::ok())
            }
            Request::UpdateSettings { settings } => {
                self.settings.borrow_mut().apply(settings);
                Reply::new(Response::ok())
            }
            Request::DetectArtifacts => {
                let report = self.detect(page).await;
                Reply::new(Response::Artifacts {
                    artifacts: report.artifacts,
                    error: None,
                })
            }
            Request::DebugDetection => Reply::new(Response::Debug {
                debug_info: Box::new(self.debug_report(page).await),
            }),
            Request::SaveArtifact { artifact } => {
                let event = self.save_one(&artifact).await;
                Reply::with_events(Response::ok(), vec![event])
            }
            Request::SyncAll | Request::SaveAll => {
                let report = self.detect(page).await;
                let events = self.save_batch(&report.artifacts).await;
                Reply::with_events(Response::ok(), events)
            }
        }
    }

    /// Scan `page` and replace the store with the result.
    pub async fn detect(&self, page: &Page) -> ScanReport {
        let previous = self.store.borrow().clone();
        let report = pipeline::scan(page, &previous, &self.options).await;
        *self.store.borrow_mut() = report.store.clone();
        self.scans.set(self.scans.get() + 1);
        report
    }

    /// React to a monitor trigger. Scans only while monitoring is enabled.
    pub async fn on_trigger(&self, trigger: Trigger, page: &Page) -> Option<ScanReport> {
        if !self.is_monitoring() {
            tracing::debug!(?trigger, "monitoring disabled, trigger ignored");
            return None;
        }
        tracing::debug!(?trigger, "monitor triggered scan");
        Some(self.detect(page).await)
    }

    async fn save_one(&self, artifact: &Artifact) -> Event {
        let settings = self.settings();
        match SyncClient::new(&settings.server_url, &self.options) {
            Ok(client) => client.save_event(artifact, &settings.project_path).await,
            Err(e) => Event::SyncError { error: e.to_string() },
        }
    }

    async fn save_batch(&self, artifacts: &[Artifact]) -> Vec<Event> {
        let settings = self.settings();
        match SyncClient::new(&settings.server_url, &self.options) {
            Ok(client) => client.save_all(artifacts, &settings.project_path).await,
            Err(e) => {
                let mut events: Vec<Event> = artifacts
                    .iter()
                    .map(|_| Event::SyncError { error: e.to_string() })
                    .collect();
                events.push(Event::SyncComplete { count: artifacts.len() });
                events
            }
        }
    }

    /// Diagnostic snapshot of `page`. The scan it runs does not replace the
    /// store.
    pub async fn debug_report(&self, page: &Page) -> DebugReport {
        let root = page.root();
        let count = |selector: &str| select_all(&root, selector).map_or(0, |s| s.length());

        let elements_found = CANDIDATE_SELECTORS
            .iter()
            .filter_map(|entry| match select_all(&root, entry.selector) {
                Ok(matches) if matches.exists() => Some(SelectorSample {
                    selector: entry.selector.to_string(),
                    count: matches.length(),
                    elements: matches.iter().take(DEBUG_SAMPLES).map(|el| self.sample(&el)).collect(),
                }),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(selector = entry.selector, error = %e, "debug selector failed");
                    None
                }
            })
            .collect();

        let previous = self.store.borrow().clone();
        let scanned = pipeline::scan(page, &previous, &self.options).await;

        DebugReport {
            url: page.url().map(ToString::to_string).unwrap_or_default(),
            title: page.title().unwrap_or_default(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            total_elements: count("*"),
            code_elements: count(CODE_ELEMENTS),
            pre_tags: count("pre"),
            font_mono: count(".font-mono"),
            artifacts_found: scanned.artifacts.len(),
            elements_found,
        }
    }

    fn sample(&self, el: &Selection) -> ElementSample {
        let text = dom::text_content(el);
        ElementSample {
            tag_name: dom::tag_name(el).unwrap_or_default().to_uppercase(),
            class_name: dom::class_name(el).unwrap_or_default(),
            text_preview: text.chars().take(PREVIEW_LEN).collect(),
            has_code: looks_like_code(&text),
            is_valid: validate(&text, &self.options).is_accept(),
        }
    }
}
