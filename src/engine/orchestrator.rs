//! Run orchestration
//!
//! One `handle` call per debounced event:
//!
//! 1. take the path's lock (FIFO: later events queue, never drop)
//! 2. snapshot the file once
//! 3. run every applicable check concurrently, each under the global
//!    semaphore and a per-check timeout
//! 4. collect outcomes in registration order (deterministic)
//! 5. fold side-effecting checks' fixes serially, write the file once
//!    via temp-file + atomic rename
//! 6. release the lock, append an audit record, return the result
//!
//! A check failure (timeout, error, panic) becomes a warning outcome
//! with a failure marker and never aborts sibling checks.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::Semaphore;

use crate::checks::CheckRegistry;
use crate::config::DoormanConfig;
use crate::core::models::{
    AggregateResult, ChangeKind, CheckOutcome, CheckStatus, DebouncedEvent, Fix, fingerprint,
};
use crate::core::ports::{AuditSink, CheckMode, FileSnapshot};
use crate::core::services::build_result;

use super::locks::PathLocks;

/// Engine tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Global cap on concurrently running checks
    pub max_concurrent_checks: usize,
    /// Per-check timeout (applies to run and fix passes separately)
    pub check_timeout: Duration,
    /// Files larger than this are treated as unreadable
    pub max_file_size: u64,
}

impl From<&DoormanConfig> for EngineOptions {
    fn from(config: &DoormanConfig) -> Self {
        Self {
            max_concurrent_checks: config.max_concurrent_checks,
            check_timeout: config.check_timeout(),
            max_file_size: config.max_file_size,
        }
    }
}

/// Central coordinator from debounced event to aggregate result
pub struct Orchestrator {
    registry: CheckRegistry,
    locks: PathLocks,
    semaphore: Arc<Semaphore>,
    audit: Arc<dyn AuditSink>,
    options: EngineOptions,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("checks", &self.registry.names())
            .field("options", &self.options)
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator over a registry and audit sink
    #[must_use]
    pub fn new(registry: CheckRegistry, audit: Arc<dyn AuditSink>, options: EngineOptions) -> Self {
        Self {
            registry,
            locks: PathLocks::new(),
            semaphore: Arc::new(Semaphore::new(options.max_concurrent_checks.max(1))),
            audit,
            options,
        }
    }

    /// Process one debounced event end to end
    pub async fn handle(&self, mut debounced: DebouncedEvent) -> AggregateResult {
        let path = debounced.path().to_path_buf();
        let lock = self.locks.lock_for(&path);

        let outcomes = {
            // No two runs for one path ever overlap; a newer event for
            // the same path queues here in arrival order
            let _guard = lock.lock().await;

            let snapshot =
                read_snapshot(&path, debounced.kind(), self.options.max_file_size);
            debounced.event.fingerprint =
                snapshot.content.as_ref().map(|c| fingerprint(c.as_bytes()));

            let applicable = self.registry.applicable(&debounced.event);
            info!(
                "{} ({}): running {} check(s)",
                debounced.event.file_name(),
                debounced.kind(),
                applicable.len()
            );

            let snapshot = Arc::new(snapshot);
            let event = Arc::new(debounced.event.clone());
            let mut handles = Vec::with_capacity(applicable.len());
            for check in &applicable {
                let permit = self
                    .semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("check semaphore closed");
                let check = check.clone();
                let snapshot = snapshot.clone();
                let event = event.clone();
                let timeout = self.options.check_timeout;
                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    let started = std::time::Instant::now();
                    let name = check.name().to_string();
                    let outcome =
                        match tokio::time::timeout(timeout, check.run(&snapshot, &event)).await {
                            Ok(Ok(outcome)) => outcome,
                            Ok(Err(err)) => {
                                warn!("check {name} failed: {err}");
                                CheckOutcome::failed(&name, err.to_string())
                            }
                            Err(_) => {
                                warn!("check {name} timed out after {}s", timeout.as_secs());
                                CheckOutcome::failed(
                                    &name,
                                    format!("timed out after {}s", timeout.as_secs()),
                                )
                            }
                        };
                    outcome.with_duration(started.elapsed())
                }));
            }

            // Collected in registration order regardless of completion order
            let mut outcomes = Vec::with_capacity(handles.len());
            for (check, handle) in applicable.iter().zip(handles) {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!("check {} panicked: {err}", check.name());
                        CheckOutcome::failed(check.name(), format!("check task panicked: {err}"))
                    }
                };
                outcomes.push(outcome);
            }

            // Fix fold: serialized, registration order, each pass sees
            // the content left by the previous one
            if debounced.kind() != ChangeKind::Deleted {
                if let Some(original) = snapshot.content.clone() {
                    let mut current = original;
                    let mut changed = false;
                    let mut applied: Vec<(usize, Vec<Fix>)> = Vec::new();
                    for (idx, (check, outcome)) in
                        applicable.iter().zip(outcomes.iter_mut()).enumerate()
                    {
                        if check.mode() != CheckMode::SideEffecting || outcome.failure.is_some() {
                            continue;
                        }
                        match tokio::time::timeout(self.options.check_timeout, check.fix(&current))
                            .await
                        {
                            Ok(Ok(Some((next, fixes)))) => {
                                if next != current {
                                    current = next;
                                    changed = true;
                                }
                                if !fixes.is_empty() {
                                    applied.push((idx, fixes));
                                }
                            }
                            Ok(Ok(None)) => {}
                            Ok(Err(err)) => {
                                warn!("fix pass of {} failed: {err}", check.name());
                                outcome.failure = Some(format!("fix pass failed: {err}"));
                            }
                            Err(_) => {
                                warn!("fix pass of {} timed out", check.name());
                                outcome.failure = Some(format!(
                                    "fix pass timed out after {}s",
                                    self.options.check_timeout.as_secs()
                                ));
                            }
                        }
                    }

                    if changed {
                        match write_atomic(&path, &current) {
                            Ok(()) => {
                                debounced.event.fingerprint =
                                    Some(fingerprint(current.as_bytes()));
                                for (idx, fixes) in applied {
                                    let outcome = &mut outcomes[idx];
                                    outcome.status = CheckStatus::Fixed;
                                    outcome.fixes_applied = fixes;
                                    // The fix pass resolved what run reported
                                    outcome.issues.clear();
                                }
                            }
                            Err(err) => {
                                warn!("could not write fixed {}: {err}", path.display());
                                for (idx, _) in applied {
                                    outcomes[idx].failure =
                                        Some(format!("could not write fix: {err}"));
                                }
                            }
                        }
                    }
                }
            }

            outcomes
        };

        let result = build_result(debounced, outcomes);
        info!(
            "{}: {} ({} issue(s), {} fix(es))",
            result.event.event.file_name(),
            result.overall,
            result.total_issues(),
            result.total_fixes()
        );
        if let Err(err) = self.audit.append(&result).await {
            warn!("could not append audit record: {err}");
        }
        result
    }
}

/// Read the file once per run
fn read_snapshot(path: &Path, kind: ChangeKind, max_file_size: u64) -> FileSnapshot {
    if kind == ChangeKind::Deleted || !path.exists() {
        return FileSnapshot::absent(path.to_path_buf());
    }
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > max_file_size => FileSnapshot::unreadable(
            path.to_path_buf(),
            format!("file exceeds max_file_size ({} bytes)", meta.len()),
        ),
        Ok(_) => match std::fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => FileSnapshot::with_content(path.to_path_buf(), content),
                Err(_) => FileSnapshot::unreadable(path.to_path_buf(), "not valid UTF-8"),
            },
            Err(err) => FileSnapshot::unreadable(path.to_path_buf(), err.to_string()),
        },
        Err(err) => FileSnapshot::unreadable(path.to_path_buf(), err.to_string()),
    }
}

/// Write via a sibling temp file and atomic rename
///
/// An interrupted write can never leave a half-written file behind;
/// the `.tmp` sibling is covered by the default ignore rules.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().to_string());
    let tmp = path.with_file_name(format!(".{file_name}.doorman.tmp"));
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}
