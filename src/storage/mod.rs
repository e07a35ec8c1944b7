//! Durable storage for doorman
//!
//! Everything lives in plain files under `.doorman/`:
//! - [`keyset`]: generic insert-if-absent key set (JSON)
//! - [`dedup`]: error fingerprints already investigated
//! - [`ledger`]: external actions already dispatched
//! - [`audit`]: append-only run records (JSONL, daily files)

pub mod audit;
pub mod dedup;
pub mod keyset;
pub mod ledger;

pub use audit::FileAuditSink;
pub use dedup::{DedupKey, ErrorDedupStore};
pub use keyset::DurableKeySet;
pub use ledger::{DispatchLedger, action_key};

use thiserror::Error;

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored file could not be parsed
    #[error("corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),
}
