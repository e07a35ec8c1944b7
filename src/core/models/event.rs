//! File change events
//!
//! Raw `ChangeEvent`s come from the watcher. The debouncer collapses
//! bursts per path and hands `DebouncedEvent`s to the orchestrator,
//! which consumes each exactly once.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// File was created
    Created,
    /// File contents were modified
    Modified,
    /// File was removed
    Deleted,
    /// File was renamed (event path is the new name)
    Renamed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
            Self::Renamed => write!(f, "renamed"),
        }
    }
}

/// A single filesystem change as observed by the watcher
///
/// Immutable once constructed. The `fingerprint` is filled in lazily by
/// the orchestrator when it reads the file, so the watcher thread never
/// does content I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Watched path the change applies to
    pub path: PathBuf,
    /// What happened to the path
    pub kind: ChangeKind,
    /// When the watcher observed the change
    pub observed_at: DateTime<Utc>,
    /// Content digest, when known
    pub fingerprint: Option<String>,
}

impl ChangeEvent {
    /// Create an event observed now, without a fingerprint
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            observed_at: Utc::now(),
            fingerprint: None,
        }
    }

    /// File extension with a leading dot (e.g. `".rs"`), if any
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path.extension().map(|e| format!(".{}", e.to_string_lossy()))
    }

    /// File name portion of the path, lossy
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string())
    }
}

/// The last event observed for a path once the quiet period elapsed
///
/// Owned by the debouncer until handed to the orchestrator; ownership
/// transfers on hand-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebouncedEvent {
    /// The surviving (latest) change for the path
    pub event: ChangeEvent,
    /// How many raw events were coalesced into this one
    pub coalesced: usize,
}

impl DebouncedEvent {
    /// Wrap a single event that saw no burst
    #[must_use]
    pub fn single(event: ChangeEvent) -> Self {
        Self { event, coalesced: 1 }
    }

    /// Path the event applies to
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.event.path
    }

    /// Kind of the surviving change
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        self.event.kind
    }
}

/// SHA-256 content fingerprint, hex encoded
#[must_use]
pub fn fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_includes_dot() {
        let event = ChangeEvent::new("src/main.rs", ChangeKind::Modified);
        assert_eq!(event.extension().as_deref(), Some(".rs"));
    }

    #[test]
    fn test_extension_none_for_bare_name() {
        let event = ChangeEvent::new("Makefile", ChangeKind::Created);
        assert_eq!(event.extension(), None);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(b"hello"), fingerprint(b"hello"));
        assert_ne!(fingerprint(b"hello"), fingerprint(b"hello\n"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ChangeKind::Modified.to_string(), "modified");
        assert_eq!(ChangeKind::Renamed.to_string(), "renamed");
    }
}
