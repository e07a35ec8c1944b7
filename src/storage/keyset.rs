//! Durable insert-if-absent key set
//!
//! Backs both the error dedup store and the dispatch idempotency
//! ledger. Keys map to the instant they were first recorded; entries
//! are never mutated, only inserted and pruned. Insertion is atomic
//! under an internal lock so two concurrent writers can never both
//! "win" the same key, and the file is rewritten on every successful
//! insert so the set survives restarts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::StorageError;

/// File-backed set of previously-seen keys
#[derive(Debug)]
pub struct DurableKeySet {
    path: PathBuf,
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl DurableKeySet {
    /// Open (or create) a key set at the given path
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    /// Whether a key has already been recorded
    pub fn seen(&self, key: &str) -> bool {
        self.entries.lock().expect("keyset lock poisoned").contains_key(key)
    }

    /// Record a key if absent; returns `true` when this call inserted it
    ///
    /// Recording an already-present key is a no-op (idempotent). The
    /// first-seen timestamp of an existing entry is never overwritten.
    pub fn record(&self, key: &str, at: DateTime<Utc>) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock().expect("keyset lock poisoned");
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), at);
        self.persist(&entries)?;
        Ok(true)
    }

    /// Drop entries first seen before `older_than`; returns the count removed
    pub fn prune(&self, older_than: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut entries = self.entries.lock().expect("keyset lock poisoned");
        let before = entries.len();
        entries.retain(|_, first_seen| *first_seen >= older_than);
        let removed = before - entries.len();
        if removed > 0 {
            self.persist(&entries)?;
        }
        Ok(removed)
    }

    /// Number of recorded keys
    pub fn len(&self) -> usize {
        self.entries.lock().expect("keyset lock poisoned").len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &HashMap<String, DateTime<Utc>>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_set() -> (tempfile::TempDir, DurableKeySet) {
        let dir = tempfile::tempdir().unwrap();
        let set = DurableKeySet::open(dir.path().join("keys.json")).unwrap();
        (dir, set)
    }

    #[test]
    fn test_record_then_seen() {
        let (_dir, set) = temp_set();
        assert!(!set.seen("k1"));
        assert!(set.record("k1", Utc::now()).unwrap());
        assert!(set.seen("k1"));
    }

    #[test]
    fn test_record_is_idempotent() {
        let (_dir, set) = temp_set();
        let first = Utc::now() - Duration::hours(1);
        assert!(set.record("k1", first).unwrap());
        assert!(!set.record("k1", Utc::now()).unwrap());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        {
            let set = DurableKeySet::open(&path).unwrap();
            set.record("k1", Utc::now()).unwrap();
        }
        let reopened = DurableKeySet::open(&path).unwrap();
        assert!(reopened.seen("k1"));
    }

    #[test]
    fn test_prune_removes_old_entries() {
        let (_dir, set) = temp_set();
        let old = Utc::now() - Duration::days(60);
        set.record("old", old).unwrap();
        set.record("new", Utc::now()).unwrap();

        let removed = set.prune(Utc::now() - Duration::days(30)).unwrap();
        assert_eq!(removed, 1);
        assert!(!set.seen("old"));
        assert!(set.seen("new"));
    }

    #[test]
    fn test_concurrent_insert_has_single_winner() {
        let (_dir, set) = temp_set();
        let set = std::sync::Arc::new(set);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let set = set.clone();
            handles.push(std::thread::spawn(move || set.record("contested", Utc::now()).unwrap()));
        }
        let winners: usize = handles.into_iter().map(|h| usize::from(h.join().unwrap())).sum();
        assert_eq!(winners, 1);
    }
}
