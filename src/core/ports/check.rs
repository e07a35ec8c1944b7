//! Check capability contract
//!
//! A check is one pluggable evaluator applied to a changed file. The
//! orchestrator runs every applicable check's `run` concurrently against
//! one read-only snapshot, then gives side-effecting checks a serial
//! `fix` pass in registration order: each pass receives the content left
//! by the previous one, and the orchestrator writes the final content
//! once. Checks never write the file themselves.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::models::{ChangeEvent, CheckOutcome, Fix};

/// How a check is allowed to interact with the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// May only report findings
    ReportOnly,
    /// May rewrite the file via the orchestrator's fix fold
    SideEffecting,
}

/// Read-only snapshot of the file under check
///
/// One snapshot is taken per run and shared by every check in it.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    /// Path the snapshot was taken from
    pub path: PathBuf,
    /// File contents; `None` for deleted or unreadable files
    pub content: Option<String>,
    /// Why `content` is `None` for a file that still exists
    pub unreadable: Option<String>,
}

impl FileSnapshot {
    /// Snapshot of a file that no longer exists
    #[must_use]
    pub fn absent(path: PathBuf) -> Self {
        Self { path, content: None, unreadable: None }
    }

    /// Snapshot with contents
    #[must_use]
    pub fn with_content(path: PathBuf, content: String) -> Self {
        Self { path, content: Some(content), unreadable: None }
    }

    /// Snapshot of a file that exists but could not be used
    #[must_use]
    pub fn unreadable(path: PathBuf, reason: impl Into<String>) -> Self {
        Self { path, content: None, unreadable: Some(reason.into()) }
    }

    /// Contents for checks that need them
    ///
    /// `Ok(None)` means the file is gone (nothing to analyze);
    /// `Err` means it exists but could not be read, which the
    /// orchestrator records as a warning outcome for that check only.
    pub fn text(&self) -> Result<Option<&str>, CheckError> {
        match (&self.content, &self.unreadable) {
            (Some(content), _) => Ok(Some(content)),
            (None, Some(reason)) => Err(CheckError::UnreadableInput(reason.clone())),
            (None, None) => Ok(None),
        }
    }
}

/// Error from a single check invocation
///
/// Never crosses check boundaries: the orchestrator converts it into a
/// warning outcome with a failure marker.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The input file exists but could not be read or decoded
    #[error("input could not be read: {0}")]
    UnreadableInput(String),
    /// An external service the check depends on failed
    #[error("external service failed: {0}")]
    Service(String),
    /// The check produced output it could not interpret
    #[error("malformed check output: {0}")]
    Malformed(String),
}

/// One pluggable quality evaluator
///
/// Implementations register a stable name, a cheap synchronous
/// applicability predicate, and a mode. The closed trait (rather than
/// any dynamic plugin loading) keeps the set of checks known at startup.
#[async_trait]
pub trait Check: Send + Sync {
    /// Stable identity used in outcomes, configuration and dispatch keys
    fn name(&self) -> &str;

    /// Whether the check participates in the fix fold
    fn mode(&self) -> CheckMode;

    /// Cheap predicate evaluated before any expensive work starts
    fn applicable(&self, event: &ChangeEvent) -> bool;

    /// Analyze the snapshot; runs concurrently with sibling checks
    async fn run(&self, file: &FileSnapshot, event: &ChangeEvent) -> Result<CheckOutcome, CheckError>;

    /// Serial fix pass, invoked only for side-effecting checks
    ///
    /// Receives the current file content (including earlier checks'
    /// fixes) and returns the rewritten content plus fix records, or
    /// `None` when there is nothing to repair. A successful fix pass is
    /// taken to resolve the issues the check reported from `run`.
    async fn fix(&self, content: &str) -> Result<Option<(String, Vec<Fix>)>, CheckError> {
        let _ = content;
        Ok(None)
    }
}
