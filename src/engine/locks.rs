//! Per-path mutual exclusion
//!
//! One async mutex per watched path, created lazily on first use.
//! `tokio::sync::Mutex` hands the lock out in FIFO order, which is
//! what gives runs for one path their arrival-order guarantee: a new
//! event queues behind the in-flight run and is never dropped.
//!
//! The table is a best-effort cache; entries are kept for the process
//! lifetime (bounded by the watched tree) and never removed while a
//! run holds them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;

/// Lazily-populated table of per-path locks
#[derive(Debug, Default)]
pub struct PathLocks {
    inner: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for a path
    #[must_use]
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut table = self.inner.lock().expect("path lock table poisoned");
        table.entry(path.to_path_buf()).or_default().clone()
    }

    /// Number of paths with a lock entry
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("path lock table poisoned").len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
