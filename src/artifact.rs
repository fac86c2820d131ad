//! The artifact record and its derived identity.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Hex digits of the content hash kept in an identity.
const ID_HASH_LEN: usize = 12;

/// A detected block of generated content.
///
/// Wire shape: `{ content, title, language, timestamp, contentLength }`,
/// with `timestamp` in ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Full extracted text, trimmed.
    pub content: String,
    /// Filesystem-safe title, never empty.
    pub title: String,
    /// Classifier label or `text`.
    pub language: String,
    /// Creation instant, ISO-8601.
    #[serde(default)]
    pub timestamp: String,
    /// Length of `content` in characters.
    #[serde(default)]
    pub content_length: usize,
}

impl Artifact {
    /// Build an artifact, trimming the content and caching its length.
    #[must_use]
    pub fn new(content: &str, title: &str, language: &str, created: DateTime<Utc>) -> Self {
        let content = content.trim().to_string();
        Self {
            content_length: content.chars().count(),
            content,
            title: title.to_string(),
            language: language.to_string(),
            timestamp: created.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Identity used as the store key.
    #[must_use]
    pub fn id(&self) -> ArtifactId {
        ArtifactId::derive(&self.content, &self.language)
    }
}

/// Content-derived identity: `{language}_{hash prefix}`.
///
/// The title is left out so that a block keeps its identity when a later
/// scan derives a different title for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Derive the identity of `content` labelled `language`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use artifact_sync::ArtifactId;
    ///
    /// let id = ArtifactId::derive("SELECT 1;", "sql");
    /// assert!(id.as_str().starts_with("sql_"));
    /// assert_eq!(id, ArtifactId::derive("SELECT 1;", "sql"));
    /// ```
    #[must_use]
    pub fn derive(content: &str, language: &str) -> Self {
        let hash = blake3::hash(content.trim().as_bytes()).to_hex();
        Self(format!("{language}_{}", &hash[..ID_HASH_LEN]))
    }

    /// The identity as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
