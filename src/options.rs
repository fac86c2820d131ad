//! Configuration for artifact detection and synchronization.
//!
//! `Options` holds the engine's tunable thresholds and timings and is owned by
//! the embedding application. `Settings` is the host-owned, persisted user
//! configuration; the detector treats it as read-only input for each scan.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::monitor::MonitorPolicy;
use crate::reveal::RevealPolicy;

/// Default address of the persistence service.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8765";

/// Tunable thresholds and timings for the detection pipeline.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use artifact_sync::Options;
///
/// let options = Options {
///     similarity_threshold: 0.95,
///     ..Options::default()
/// };
/// assert_eq!(options.min_content_len, 50);
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Texts shorter than this (in characters) are never artifacts.
    ///
    /// Default: `50`
    pub min_content_len: usize,

    /// Reject text when more than this fraction of its non-blank lines look
    /// like CSS.
    ///
    /// Default: `0.7`
    pub max_css_ratio: f64,

    /// Single-line text shorter than this that ends in a file extension is a
    /// filename label.
    ///
    /// Default: `100`
    pub bare_filename_max_len: usize,

    /// Unstructured text is still accepted when longer than this...
    ///
    /// Default: `200`
    pub long_text_min_len: usize,

    /// ...and spanning more than this many lines.
    ///
    /// Default: `3`
    pub long_text_min_lines: usize,

    /// Both contents must exceed this length for the similarity check.
    ///
    /// Default: `100`
    pub similarity_min_len: usize,

    /// Similarity above which two artifacts are duplicates.
    ///
    /// Default: `0.9`
    pub similarity_threshold: f64,

    /// Same title and language only count as a duplicate when the contents'
    /// lengths differ by at most this fraction of the longer one.
    ///
    /// Default: `0.1`
    pub title_length_tolerance: f64,

    /// Maximum title length after sanitization (characters).
    ///
    /// Default: `80`
    pub max_title_len: usize,

    /// Escalation policy used to reveal truncated content.
    pub reveal: RevealPolicy,

    /// Startup delay and debounce for monitoring.
    pub monitor: MonitorPolicy,

    /// Pause between consecutive saves of a batch.
    ///
    /// Default: `100ms`
    pub save_pacing: Duration,

    /// Upper bound for a health probe of the persistence service.
    ///
    /// Default: `5s`
    pub health_timeout: Duration,

    /// Upper bound for a single save request.
    ///
    /// Default: `10s`
    pub request_timeout: Duration,
}

impl Options {
    /// Options with every artificial delay removed, for offline scans of
    /// static snapshots and for tests.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            reveal: RevealPolicy::immediate(),
            monitor: MonitorPolicy::immediate(),
            save_pacing: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_content_len: 50,
            max_css_ratio: 0.7,
            bare_filename_max_len: 100,
            long_text_min_len: 200,
            long_text_min_lines: 3,
            similarity_min_len: 100,
            similarity_threshold: 0.9,
            title_length_tolerance: 0.1,
            max_title_len: 80,
            reveal: RevealPolicy::default(),
            monitor: MonitorPolicy::default(),
            save_pacing: Duration::from_millis(100),
            health_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// User settings owned by the host.
///
/// Wire shape: `{ "isEnabled": bool, "projectPath": string, "serverUrl": string }`.
/// Missing fields keep their defaults so partial updates deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Whether monitoring is switched on.
    pub is_enabled: bool,
    /// Directory the persistence service writes into.
    pub project_path: String,
    /// Base URL of the persistence service.
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_enabled: false,
            project_path: String::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

/// A partial settings update as sent by `updateSettings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New monitoring flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    /// New project path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    /// New service URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl Settings {
    /// Merge a partial update, keeping fields the patch leaves out.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(enabled) = patch.is_enabled {
            self.is_enabled = enabled;
        }
        if let Some(path) = patch.project_path {
            self.project_path = path;
        }
        if let Some(url) = patch.server_url {
            self.server_url = url;
        }
    }
}
