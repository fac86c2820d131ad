use std::io::{self, ErrorKind};
use std::path::Path;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::naming::{base_name, candidate, MAX_ATTEMPTS};
use super::ApiError;
use crate::classifier::{file_extension, TEXT};

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthBody {
    /// Always `"ok"`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Current time, ISO-8601.
    pub timestamp: String,
}

/// `POST /api/artifact` request. Missing fields are checked by the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveBody {
    /// Text to write.
    pub content: Option<String>,
    /// Title the filename is derived from.
    pub title: Option<String>,
    /// Language label, picks the extension.
    pub language: Option<String>,
    /// Target directory, created if missing.
    pub project_path: Option<String>,
    /// Client-side timestamp.
    pub timestamp: Option<String>,
}

/// `POST /api/artifact` success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedBody {
    /// Always `true`.
    pub success: bool,
    /// Name of the file written.
    pub filename: String,
    /// Full path of the file written.
    pub path: String,
    /// Content length in characters.
    pub size: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct PathQuery {
    #[serde(default)]
    path: Option<String>,
}

pub(super) async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub(super) async fn save_artifact(Json(body): Json<SaveBody>) -> Result<Json<SavedBody>, ApiError> {
    let (Some(content), Some(project_path)) = (
        body.content.filter(|c| !c.is_empty()),
        body.project_path.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::MissingFields);
    };

    let dir = Path::new(&project_path);
    tokio::fs::create_dir_all(dir).await?;

    let language = body.language.as_deref().unwrap_or(TEXT);
    let base = base_name(body.title.as_deref().unwrap_or_default(), language);
    let extension = file_extension(language);

    for attempt in 0..MAX_ATTEMPTS {
        let filename = candidate(&base, extension, attempt, Utc::now().timestamp_millis());
        let path = dir.join(&filename);

        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(%filename, "filename taken");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        write_or_discard(file, &path, content.as_bytes()).await?;

        tracing::info!(%filename, language, "artifact written");
        return Ok(Json(SavedBody {
            success: true,
            filename,
            path: path.to_string_lossy().into_owned(),
            size: content.chars().count(),
        }));
    }

    Err(ApiError::NameExhausted(format!("{base}{extension}")))
}

/// Write `content` into the freshly created file at `path`. On failure the
/// file is removed so a partial write never holds the name.
async fn write_or_discard<W>(mut writer: W, path: &Path, content: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(content).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %cleanup, "partial file left behind");
        }
        return Err(e);
    }
    Ok(())
}

pub(super) async fn test_path(Json(query): Json<PathQuery>) -> impl IntoResponse {
    let exists = match query.path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
        None => false,
    };
    let status = if exists { StatusCode::OK } else { StatusCode::NOT_FOUND };
    (status, Json(serde_json::json!({ "valid": exists })))
}
