//! Error types for artifact-sync.
//!
//! Heuristic outcomes (validation rejections, duplicates) are not errors; they
//! are reported as plain values by the validator and deduplicator. This enum
//! only covers conditions where an operation could not be carried out.

/// Error type for scanning and synchronization operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A candidate selector could not be compiled.
    #[error("Invalid selector: {0}")]
    SelectorError(String),

    /// An embedded frame could not be read (cross-origin or not attached).
    #[error("Frame unavailable ({src}): {reason}")]
    FrameError {
        /// The frame's `src` attribute as found in the document.
        src: String,
        /// Why the frame was skipped.
        reason: String,
    },

    /// A save was requested before a project path was configured.
    #[error("No project path set")]
    MissingProjectPath,

    /// The request to the persistence service failed or timed out.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The persistence service answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, if any.
        message: String,
    },

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A command envelope could not be decoded.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
}

/// Result type alias for artifact-sync operations.
pub type Result<T> = std::result::Result<T, Error>;
