//! Error deduplication store
//!
//! Checks that derive many candidate fingerprints from one input (the
//! log investigator parses a log file into individual error entries)
//! use this store to skip entries that were already investigated.
//!
//! The contract is at-least-once investigation, at-most-one durable
//! record: callers check `seen` before expensive work and `record`
//! only after producing an outcome, so a failure in between leaves the
//! fingerprint eligible for retry on the next run.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::StorageError;
use super::keyset::DurableKeySet;

/// Identity of one investigated error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey {
    /// The error message, normalized by the caller
    pub message: String,
    /// Where the error came from (file, logger name, ...)
    pub source: String,
    /// Line in the source, when known
    pub line: Option<u32>,
}

impl DedupKey {
    /// Build a key from its parts
    pub fn new(message: impl Into<String>, source: impl Into<String>, line: Option<u32>) -> Self {
        Self { message: message.into(), source: source.into(), line }
    }

    /// Stable digest used as the stored key
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.message.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(self.source.as_bytes());
        hasher.update(b"\x1f");
        if let Some(line) = self.line {
            hasher.update(line.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Durable set of already-investigated error fingerprints
///
/// When tracking is disabled every key reads as unseen and nothing is
/// recorded, so each presentation is investigated again.
#[derive(Debug)]
pub struct ErrorDedupStore {
    set: DurableKeySet,
    enabled: bool,
}

impl ErrorDedupStore {
    /// Open the store at the given path
    pub fn open(path: impl Into<std::path::PathBuf>, enabled: bool) -> Result<Self, StorageError> {
        Ok(Self { set: DurableKeySet::open(path)?, enabled })
    }

    /// Whether this fingerprint was already investigated
    #[must_use]
    pub fn seen(&self, key: &DedupKey) -> bool {
        self.enabled && self.set.seen(&key.digest())
    }

    /// Record a successfully investigated fingerprint (idempotent)
    pub fn record(&self, key: &DedupKey, at: DateTime<Utc>) -> Result<(), StorageError> {
        if self.enabled {
            self.set.record(&key.digest(), at)?;
        }
        Ok(())
    }

    /// Drop fingerprints first seen before `older_than`
    pub fn prune(&self, older_than: DateTime<Utc>) -> Result<usize, StorageError> {
        self.set.prune(older_than)
    }

    /// Number of recorded fingerprints
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Whether no fingerprints are recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
