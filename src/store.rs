//! Immutable artifact store snapshots.
//!
//! Each completed scan produces a new `ArtifactStore`; the previous snapshot
//! is only read. Callers hold whichever snapshot is latest, so replacing the
//! store is a single assignment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::artifact::{Artifact, ArtifactId};
use crate::dedup::normalize;

/// Artifacts of one scan keyed by derived identity, in detection order.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    entries: Vec<(ArtifactId, Artifact)>,
    index: HashMap<ArtifactId, usize>,
    scanned_at: Option<DateTime<Utc>>,
}

impl ArtifactStore {
    /// An empty store that has never been scanned into.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the snapshot for a finished scan.
    ///
    /// A fresh artifact whose normalized content matches a stored one keeps
    /// the stored record, so titles and timestamps stay stable across scans
    /// of an unchanged page. Artifacts that map to an identity already taken
    /// in this snapshot are dropped.
    #[must_use]
    pub fn rebuild(previous: &ArtifactStore, fresh: Vec<Artifact>, scanned_at: DateTime<Utc>) -> Self {
        let known: HashMap<String, &Artifact> = previous
            .artifacts()
            .map(|a| (normalize(&a.content), a))
            .collect();

        let mut store = Self {
            entries: Vec::with_capacity(fresh.len()),
            index: HashMap::with_capacity(fresh.len()),
            scanned_at: Some(scanned_at),
        };
        for artifact in fresh {
            let record = match known.get(&normalize(&artifact.content)) {
                Some(stored) => (*stored).clone(),
                None => artifact,
            };
            store.insert(record);
        }
        store
    }

    fn insert(&mut self, artifact: Artifact) {
        let id = artifact.id();
        if self.index.contains_key(&id) {
            return;
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, artifact));
    }

    /// Artifact stored under `id`.
    #[must_use]
    pub fn get(&self, id: &ArtifactId) -> Option<&Artifact> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    /// Whether `id` is stored.
    #[must_use]
    pub fn contains(&self, id: &ArtifactId) -> bool {
        self.index.contains_key(id)
    }

    /// Stored artifacts in detection order.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.iter().map(|(_, a)| a)
    }

    /// Stored identities in detection order.
    pub fn ids(&self) -> impl Iterator<Item = &ArtifactId> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// Owned copy of the stored artifacts.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Artifact> {
        self.artifacts().cloned().collect()
    }

    /// Number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the scan that produced this snapshot finished.
    #[must_use]
    pub fn scanned_at(&self) -> Option<DateTime<Utc>> {
        self.scanned_at
    }
}
