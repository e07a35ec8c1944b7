//! Centralized path definitions for doorman
//!
//! Single source of truth for the on-disk layout. Everything doorman
//! persists lives under the watched project's `.doorman/` directory:
//!
//! ```text
//! project/
//! ├── doorman.toml                 # Committed configuration
//! └── .doorman/                    # Local state (gitignored)
//!     ├── fixed-errors.json        # Error dedup store
//!     ├── dispatched.json          # Dispatch idempotency ledger
//!     ├── audit/                   # Append-only run records (JSONL)
//!     │   └── 2026-08-06.jsonl
//!     └── logs/                    # File-logger notifier output
//! ```

use std::path::{Path, PathBuf};

/// Directory name for local doorman state
pub const DOORMAN_DIR: &str = ".doorman";

/// Project configuration filename
pub const DOORMAN_TOML: &str = "doorman.toml";

/// Error dedup store filename
const DEDUP_FILE: &str = "fixed-errors.json";

/// Dispatch idempotency ledger filename
const LEDGER_FILE: &str = "dispatched.json";

/// Audit subdirectory
const AUDIT_DIR: &str = "audit";

/// Notifier log subdirectory
const LOGS_DIR: &str = "logs";

/// Get path to `doorman.toml` under a project root
#[must_use]
pub fn config_file(root: &Path) -> PathBuf {
    root.join(DOORMAN_TOML)
}

/// Get path to the `.doorman/` state directory
#[must_use]
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(DOORMAN_DIR)
}

/// Get path to the error dedup store
#[must_use]
pub fn dedup_file(root: &Path) -> PathBuf {
    state_dir(root).join(DEDUP_FILE)
}

/// Get path to the dispatch idempotency ledger
#[must_use]
pub fn ledger_file(root: &Path) -> PathBuf {
    state_dir(root).join(LEDGER_FILE)
}

/// Get path to the audit record directory
#[must_use]
pub fn audit_dir(root: &Path) -> PathBuf {
    state_dir(root).join(AUDIT_DIR)
}

/// Get path to the file-logger notifier directory
#[must_use]
pub fn logs_dir(root: &Path) -> PathBuf {
    state_dir(root).join(LOGS_DIR)
}
