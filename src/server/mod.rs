//! The persistence service: writes artifacts into a project directory.
//!
//! Routes:
//!
//! - `GET /api/health` → `{status, version, timestamp}`
//! - `POST /api/artifact` → `{success, filename, path, size}`
//! - `POST /api/test-path` → `{valid}` (404 when the path does not exist)

mod handlers;
pub mod naming;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;

pub use handlers::{HealthBody, SaveBody, SavedBody};

/// Service listen address and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    ///
    /// Default: `127.0.0.1` (`ARTIFACT_SYNC_HOST`)
    pub host: String,

    /// Port to bind.
    ///
    /// Default: `8765` (`ARTIFACT_SYNC_PORT`)
    pub port: u16,

    /// Largest accepted request body in bytes.
    ///
    /// Default: 50 MiB (`ARTIFACT_SYNC_BODY_LIMIT`)
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            body_limit: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read overrides from the environment. Unparsable values keep the
    /// default and log a warning.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("ARTIFACT_SYNC_HOST") {
            config.host = host;
        }
        if let Some(port) = env_number("ARTIFACT_SYNC_PORT") {
            config.port = port;
        }
        if let Some(limit) = env_number("ARTIFACT_SYNC_BODY_LIMIT") {
            config.body_limit = limit;
        }
        config
    }

    /// `host:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

/// Failure of a service request, rendered as `{error}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// `content` or `projectPath` absent or empty.
    #[error("Missing required fields")]
    MissingFields,

    /// Every candidate filename was taken.
    #[error("No free filename for {0}")]
    NameExhausted(String),

    /// Filesystem failure.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields => StatusCode::BAD_REQUEST,
            ApiError::NameExhausted(_) => StatusCode::CONFLICT,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the service router.
pub fn router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/artifact", post(handlers::save_artifact))
        .route("/api/test-path", post(handlers::test_path))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `config.addr()` and serve until the process exits.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "artifact server listening");
    axum::serve(listener, router(&config)).await?;
    Ok(())
}
