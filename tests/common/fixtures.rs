//! Stub checks and engine builders for integration tests

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use doorman::checks::CheckRegistry;
use doorman::core::models::{ChangeEvent, ChangeKind, CheckOutcome, DebouncedEvent};
use doorman::core::ports::{Check, CheckError, CheckMode, FileSnapshot};
use doorman::engine::{EngineOptions, Orchestrator};
use doorman::storage::FileAuditSink;

/// Check that sleeps while tracking how many instances run at once
pub struct SlowCheck {
    pub name: &'static str,
    pub delay: Duration,
    pub active: Arc<AtomicUsize>,
    pub max_active: Arc<AtomicUsize>,
}

impl SlowCheck {
    pub fn new(name: &'static str, delay: Duration) -> (Self, Arc<AtomicUsize>) {
        let max_active = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                delay,
                active: Arc::new(AtomicUsize::new(0)),
                max_active: max_active.clone(),
            },
            max_active,
        )
    }
}

#[async_trait]
impl Check for SlowCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn mode(&self) -> CheckMode {
        CheckMode::ReportOnly
    }

    fn applicable(&self, _event: &ChangeEvent) -> bool {
        true
    }

    async fn run(
        &self,
        _file: &FileSnapshot,
        _event: &ChangeEvent,
    ) -> Result<CheckOutcome, CheckError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(CheckOutcome::approved(self.name))
    }
}

/// Check that records every snapshot content it is handed
pub struct CaptureCheck {
    pub seen: Arc<std::sync::Mutex<Vec<String>>>,
}

impl CaptureCheck {
    pub fn new() -> (Self, Arc<std::sync::Mutex<Vec<String>>>) {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        (Self { seen: seen.clone() }, seen)
    }
}

#[async_trait]
impl Check for CaptureCheck {
    fn name(&self) -> &str {
        "capture"
    }

    fn mode(&self) -> CheckMode {
        CheckMode::ReportOnly
    }

    fn applicable(&self, _event: &ChangeEvent) -> bool {
        true
    }

    async fn run(
        &self,
        file: &FileSnapshot,
        _event: &ChangeEvent,
    ) -> Result<CheckOutcome, CheckError> {
        self.seen.lock().unwrap().push(file.content.clone().unwrap_or_default());
        Ok(CheckOutcome::approved("capture"))
    }
}

/// Check that never finishes within any sane timeout
pub struct HangCheck;

#[async_trait]
impl Check for HangCheck {
    fn name(&self) -> &str {
        "hang"
    }

    fn mode(&self) -> CheckMode {
        CheckMode::ReportOnly
    }

    fn applicable(&self, _event: &ChangeEvent) -> bool {
        true
    }

    async fn run(
        &self,
        _file: &FileSnapshot,
        _event: &ChangeEvent,
    ) -> Result<CheckOutcome, CheckError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(CheckOutcome::approved("hang"))
    }
}

/// Orchestrator over a temp state dir with test-friendly options
pub fn orchestrator(registry: CheckRegistry, state_dir: &Path, timeout: Duration) -> Orchestrator {
    let audit = Arc::new(FileAuditSink::new(state_dir.join("audit")).unwrap());
    Orchestrator::new(
        registry,
        audit,
        EngineOptions { max_concurrent_checks: 8, check_timeout: timeout, max_file_size: 1_000_000 },
    )
}

/// A debounced "modified" event for a path
pub fn modified(path: impl Into<std::path::PathBuf>) -> DebouncedEvent {
    DebouncedEvent::single(ChangeEvent::new(path.into(), ChangeKind::Modified))
}
