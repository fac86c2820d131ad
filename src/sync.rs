//! HTTP client of the persistence service.
//!
//! Saves are issued one at a time. A batch waits `save_pacing` between
//! requests and reports every artifact as an [`Event`], so one failed save
//! never stops the rest of the batch.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::artifact::Artifact;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::protocol::{Event, SyncedFile};

/// `GET /api/health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// `"ok"` when the service is up.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Service clock, ISO-8601.
    pub timestamp: String,
}

/// `POST /api/artifact` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedArtifact {
    /// Always `true` on a 2xx response.
    pub success: bool,
    /// Name of the file written.
    pub filename: String,
    /// Full path of the file written.
    pub path: String,
    /// Content length in characters.
    pub size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveBody<'a> {
    #[serde(flatten)]
    artifact: &'a Artifact,
    project_path: &'a str,
}

#[derive(Serialize)]
struct PathBody<'a> {
    path: &'a str,
}

#[derive(Deserialize)]
struct PathCheck {
    valid: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client of one persistence service instance.
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
    save_pacing: Duration,
}

impl SyncClient {
    /// Create a client for the service at `server_url`.
    pub fn new(server_url: &str, options: &Options) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            health_timeout: options.health_timeout,
            save_pacing: options.save_pacing,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Probe the service, bounded by the health timeout.
    pub async fn health(&self) -> Result<Health> {
        let resp = self
            .client
            .get(self.endpoint("/api/health"))
            .timeout(self.health_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Ask the service whether `path` exists on its filesystem.
    pub async fn test_path(&self, path: &str) -> Result<bool> {
        let resp = self
            .client
            .post(self.endpoint("/api/test-path"))
            .json(&PathBody { path })
            .send()
            .await?;

        // 404 carries `{valid:false}`
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let check: PathCheck = check_status(resp).await?.json().await?;
        Ok(check.valid)
    }

    /// Write one artifact into `project_path`.
    pub async fn save(&self, artifact: &Artifact, project_path: &str) -> Result<SavedArtifact> {
        if project_path.trim().is_empty() {
            return Err(Error::MissingProjectPath);
        }

        let resp = self
            .client
            .post(self.endpoint("/api/artifact"))
            .json(&SaveBody {
                artifact,
                project_path,
            })
            .send()
            .await?;
        let saved: SavedArtifact = check_status(resp).await?.json().await?;
        tracing::info!(filename = %saved.filename, size = saved.size, "artifact saved");
        Ok(saved)
    }

    /// Save `artifacts` in order, returning one event per artifact followed
    /// by `syncComplete`.
    pub async fn save_all(&self, artifacts: &[Artifact], project_path: &str) -> Vec<Event> {
        let mut events = Vec::with_capacity(artifacts.len() + 1);

        for (i, artifact) in artifacts.iter().enumerate() {
            if i > 0 && !self.save_pacing.is_zero() {
                sleep(self.save_pacing).await;
            }
            events.push(self.save_event(artifact, project_path).await);
        }

        events.push(Event::SyncComplete {
            count: artifacts.len(),
        });
        events
    }

    /// Save one artifact and report the result as an event.
    pub async fn save_event(&self, artifact: &Artifact, project_path: &str) -> Event {
        match self.save(artifact, project_path).await {
            Ok(saved) => Event::ArtifactSynced {
                data: SyncedFile {
                    filename: saved.filename,
                },
            },
            Err(e) => {
                tracing::warn!(title = %artifact.title, error = %e, "save failed");
                Event::SyncError {
                    error: e.to_string(),
                }
            }
        }
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) => body,
    };
    Err(Error::ServerError {
        status: status.as_u16(),
        message,
    })
}
