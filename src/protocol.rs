//! Host-facing message envelope.
//!
//! Requests arrive as JSON objects tagged by `action`. Replies carry a
//! response for the caller plus any events the host should deliver; events
//! are plain values, the host decides how to send them.

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::error::Result;
use crate::options::SettingsPatch;

/// Inbound command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Switch monitoring on or off.
    ToggleMonitoring {
        /// New state.
        enabled: bool,
    },
    /// Replace the project path.
    UpdateProjectPath {
        /// Directory artifacts are written into.
        path: String,
    },
    /// Merge a partial settings update.
    UpdateSettings {
        /// Fields to replace.
        settings: SettingsPatch,
    },
    /// Scan the page and return the artifacts.
    DetectArtifacts,
    /// Return a diagnostic snapshot of the page.
    DebugDetection,
    /// Persist one artifact.
    SaveArtifact {
        /// The artifact to save.
        artifact: Artifact,
    },
    /// Scan, then persist every artifact.
    SyncAll,
    /// Same as `SyncAll`.
    SaveAll,
    /// Liveness probe.
    Ping,
}

impl Request {
    /// Decode a request from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` for malformed JSON or an unknown action.
    ///
    /// # Example
    ///
    /// ```rust
    /// use artifact_sync::Request;
    ///
    /// let request = Request::from_json(r#"{"action":"toggleMonitoring","enabled":true}"#)?;
    /// assert_eq!(request, Request::ToggleMonitoring { enabled: true });
    /// # Ok::<(), artifact_sync::Error>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Response to a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `{success}` acknowledgement.
    Ack {
        /// Whether the command was accepted.
        success: bool,
    },
    /// `{artifacts, error?}` for `detectArtifacts`.
    Artifacts {
        /// Detected artifacts.
        artifacts: Vec<Artifact>,
        /// Set when detection failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// `{debugInfo}` for `debugDetection`.
    Debug {
        /// The diagnostic snapshot.
        #[serde(rename = "debugInfo")]
        debug_info: Box<DebugReport>,
    },
}

impl Response {
    /// `{success: true}`.
    #[must_use]
    pub fn ok() -> Self {
        Response::Ack { success: true }
    }
}

/// Outbound notification for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Event {
    /// An artifact was written.
    ArtifactSynced {
        /// Where it was written.
        data: SyncedFile,
    },
    /// A save failed.
    SyncError {
        /// Error message.
        error: String,
    },
    /// A batch save finished.
    SyncComplete {
        /// Number of artifacts in the batch.
        count: usize,
    },
}

/// Payload of [`Event::ArtifactSynced`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedFile {
    /// Filename chosen by the persistence service.
    pub filename: String,
}

/// Response plus the events produced while handling a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Response for the caller.
    pub response: Response,
    /// Events for the host, in order.
    pub events: Vec<Event>,
}

impl Reply {
    /// A reply without events.
    #[must_use]
    pub fn new(response: Response) -> Self {
        Self {
            response,
            events: Vec::new(),
        }
    }

    /// A reply with events.
    #[must_use]
    pub fn with_events(response: Response, events: Vec<Event>) -> Self {
        Self { response, events }
    }
}

/// Diagnostic snapshot returned by `debugDetection`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
    /// Page URL, empty when unknown.
    pub url: String,
    /// Page title, empty when absent.
    pub title: String,
    /// When the snapshot was taken, ISO-8601.
    pub timestamp: String,
    /// Elements in the top-level document.
    pub total_elements: usize,
    /// `code`, `pre`, `.font-mono` and code-classed elements.
    pub code_elements: usize,
    /// `<pre>` elements.
    pub pre_tags: usize,
    /// `.font-mono` elements.
    pub font_mono: usize,
    /// Artifacts a scan of the page produced.
    pub artifacts_found: usize,
    /// Per-selector samples, for selectors that matched anything.
    pub elements_found: Vec<SelectorSample>,
}

/// Matches of one candidate selector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSample {
    /// The selector.
    pub selector: String,
    /// Number of matching elements.
    pub count: usize,
    /// Up to three sampled elements.
    pub elements: Vec<ElementSample>,
}

/// One sampled element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSample {
    /// Upper-case tag name, as the DOM reports it.
    pub tag_name: String,
    /// `class` attribute.
    pub class_name: String,
    /// First 100 characters of the text.
    pub text_preview: String,
    /// Whether the text looks like code.
    pub has_code: bool,
    /// Whether the text passes validation.
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_decode_by_action() {
        assert_eq!(Request::from_json(r#"{"action":"ping"}"#).unwrap(), Request::Ping);
        assert_eq!(
            Request::from_json(r#"{"action":"updateProjectPath","path":"/tmp/p"}"#).unwrap(),
            Request::UpdateProjectPath { path: "/tmp/p".to_string() }
        );
        assert_eq!(Request::from_json(r#"{"action":"saveAll"}"#).unwrap(), Request::SaveAll);
    }

    #[test]
    fn save_artifact_accepts_wire_artifact() {
        let request = Request::from_json(
            r#"{"action":"saveArtifact","artifact":{"content":"x","title":"t","language":"text","timestamp":"2024-01-01T00:00:00.000Z","contentLength":1}}"#,
        )
        .unwrap();

        let Request::SaveArtifact { artifact } = request else {
            panic!("expected saveArtifact");
        };
        assert_eq!(artifact.content_length, 1);
    }

    #[test]
    fn unknown_action_is_invalid() {
        let err = Request::from_json(r#"{"action":"selfDestruct"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidRequest(_)));
    }

    #[test]
    fn responses_serialize_to_wire_shapes() {
        assert_eq!(serde_json::to_value(Response::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(Response::Artifacts { artifacts: vec![], error: Some("boom".into()) }).unwrap(),
            json!({"artifacts": [], "error": "boom"})
        );
    }

    #[test]
    fn events_serialize_with_action_tag() {
        let synced = Event::ArtifactSynced {
            data: SyncedFile { filename: "main.rs".into() },
        };
        assert_eq!(
            serde_json::to_value(&synced).unwrap(),
            json!({"action": "artifactSynced", "data": {"filename": "main.rs"}})
        );
        assert_eq!(
            serde_json::to_value(Event::SyncComplete { count: 3 }).unwrap(),
            json!({"action": "syncComplete", "count": 3})
        );
    }
}
