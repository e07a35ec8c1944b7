//! Dispatch idempotency ledger
//!
//! A durable marker per (path, check, content fingerprint) tuple keeps
//! re-dispatch of the same unchanged result from creating duplicate
//! remote tickets.

use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::StorageError;
use super::keyset::DurableKeySet;

/// Idempotency key for one external action trigger
#[must_use]
pub fn action_key(path: &Path, check_name: &str, fingerprint: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(check_name.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(fingerprint.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

/// Durable record of external actions already taken
#[derive(Debug)]
pub struct DispatchLedger {
    set: DurableKeySet,
}

impl DispatchLedger {
    /// Open the ledger at the given path
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        Ok(Self { set: DurableKeySet::open(path)? })
    }

    /// Whether an action was already taken for this key
    #[must_use]
    pub fn seen(&self, key: &str) -> bool {
        self.set.seen(key)
    }

    /// Record a completed action (idempotent)
    pub fn record(&self, key: &str, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.set.record(key, at)?;
        Ok(())
    }

    /// Drop records older than `older_than`
    pub fn prune(&self, older_than: DateTime<Utc>) -> Result<usize, StorageError> {
        self.set.prune(older_than)
    }
}
