//! Engine-level guarantees: lock invariant, debouncing, fix fold,
//! fault containment

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::timeout;

use doorman::checks::{CheckRegistry, LicenseHeader, LineHygiene};
use doorman::core::models::{ChangeEvent, ChangeKind, CheckStatus, OverallStatus};
use doorman::core::services::Applicability;
use doorman::core::ports::CheckMode;
use doorman::engine::Debouncer;

use crate::common::fixtures::{CaptureCheck, HangCheck, SlowCheck, modified, orchestrator};

/// No two runs for the same path may ever overlap
#[tokio::test]
async fn test_runs_for_one_path_never_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("hot.rs");
    fs::write(&file, "fn main() {}\n").unwrap();

    let (slow, max_active) = SlowCheck::new("slow", Duration::from_millis(80));
    let mut registry = CheckRegistry::new();
    registry.register(Arc::new(slow));
    let orch = Arc::new(orchestrator(registry, dir.path(), Duration::from_secs(5)));

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let orch = orch.clone();
        let event = modified(&file);
        tasks.push(tokio::spawn(async move { orch.handle(event).await }));
    }
    let results: Vec<_> = futures::future::join_all(tasks).await;

    // Queue, never drop: every event produced a run
    assert_eq!(results.len(), 3);
    for result in results {
        assert_eq!(result.unwrap().overall, OverallStatus::Approved);
    }
    assert_eq!(max_active.load(std::sync::atomic::Ordering::SeqCst), 1);
}

/// Distinct paths are free to run concurrently
#[tokio::test]
async fn test_distinct_paths_may_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let one = dir.path().join("one.rs");
    let two = dir.path().join("two.rs");
    fs::write(&one, "a\n").unwrap();
    fs::write(&two, "b\n").unwrap();

    let (slow, max_active) = SlowCheck::new("slow", Duration::from_millis(200));
    let mut registry = CheckRegistry::new();
    registry.register(Arc::new(slow));
    let orch = Arc::new(orchestrator(registry, dir.path(), Duration::from_secs(5)));

    let a = {
        let orch = orch.clone();
        let event = modified(&one);
        tokio::spawn(async move { orch.handle(event).await })
    };
    let b = {
        let orch = orch.clone();
        let event = modified(&two);
        tokio::spawn(async move { orch.handle(event).await })
    };
    a.await.unwrap();
    b.await.unwrap();

    assert_eq!(max_active.load(std::sync::atomic::Ordering::SeqCst), 2);
}

/// A file edited twice inside the debounce window yields exactly one
/// run, seeing the state after the second edit
#[tokio::test]
async fn test_two_edits_one_run_with_final_content() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    let first: String = (1..=10).map(|i| format!("line {i}\n")).collect();
    fs::write(&file, &first).unwrap();

    let (out_tx, mut out_rx) = mpsc::channel(16);
    let debouncer = Debouncer::spawn(Duration::from_millis(150), 16, 100, out_tx);

    debouncer.observe(ChangeEvent::new(&file, ChangeKind::Modified)).await;
    let second = format!("{first}line 11 (second edit)\n");
    fs::write(&file, &second).unwrap();
    debouncer.observe(ChangeEvent::new(&file, ChangeKind::Modified)).await;

    let debounced = timeout(Duration::from_secs(2), out_rx.recv()).await.unwrap().unwrap();
    assert_eq!(debounced.coalesced, 2);
    // Exactly one emission for the burst
    assert!(timeout(Duration::from_millis(400), out_rx.recv()).await.is_err());

    let (capture, seen) = CaptureCheck::new();
    let mut registry = CheckRegistry::new();
    registry.register(Arc::new(capture));
    let orch = orchestrator(registry, dir.path(), Duration::from_secs(5));
    orch.handle(debounced).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("second edit"));
}

/// A side-effecting fix lands in the file while a report-only sibling's
/// finding still appears in the aggregate
#[tokio::test]
async fn test_fix_and_report_only_combine() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.rs");
    fs::write(&file, "fn main() {}").unwrap(); // no trailing newline, no header

    let mut registry = CheckRegistry::new();
    registry
        .register(Arc::new(LineHygiene::new(Applicability::any(), CheckMode::SideEffecting)));
    registry.register(Arc::new(LicenseHeader::new(Applicability::any())));
    let orch = orchestrator(registry, dir.path(), Duration::from_secs(5));

    let result = orch.handle(modified(&file)).await;

    // The fix was applied to the file
    assert_eq!(fs::read_to_string(&file).unwrap(), "fn main() {}\n");
    let hygiene = &result.outcomes[0];
    assert_eq!(hygiene.status, CheckStatus::Fixed);
    assert_eq!(hygiene.fixes_applied.len(), 1);

    // The report-only finding survived
    let license = &result.outcomes[1];
    assert_eq!(license.status, CheckStatus::Warning);
    assert!(license.issues[0].message.contains("license header"));

    // Warning outranks fixed
    assert_eq!(result.overall, OverallStatus::Warning);
}

/// A hanging check is cut off at the timeout without hurting siblings
/// and without stalling the run
#[tokio::test]
async fn test_timed_out_check_does_not_abort_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("app.rs");
    fs::write(&file, "fn app() {}\n").unwrap();

    let mut registry = CheckRegistry::new();
    registry.register(Arc::new(HangCheck));
    registry.register(Arc::new(LineHygiene::new(Applicability::any(), CheckMode::ReportOnly)));
    let orch = orchestrator(registry, dir.path(), Duration::from_millis(200));

    let started = Instant::now();
    let result = orch.handle(modified(&file)).await;
    assert!(started.elapsed() < Duration::from_secs(3));

    let hang = &result.outcomes[0];
    assert_eq!(hang.status, CheckStatus::Warning);
    assert!(hang.failure.as_deref().unwrap().contains("timed out"));

    let hygiene = &result.outcomes[1];
    assert_eq!(hygiene.status, CheckStatus::Approved);
    assert!(hygiene.failure.is_none());

    assert_eq!(result.overall, OverallStatus::Warning);
}

/// Outcomes come back in registration order even when completion order
/// is reversed
#[tokio::test]
async fn test_outcome_order_is_registration_order() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("x.rs");
    fs::write(&file, "x\n").unwrap();

    let (slowest, _) = SlowCheck::new("slowest", Duration::from_millis(150));
    let (fastest, _) = SlowCheck::new("fastest", Duration::from_millis(1));
    let mut registry = CheckRegistry::new();
    registry.register(Arc::new(slowest));
    registry.register(Arc::new(fastest));
    let orch = orchestrator(registry, dir.path(), Duration::from_secs(5));

    let result = orch.handle(modified(&file)).await;
    let names: Vec<&str> = result.outcomes.iter().map(|o| o.check_name.as_str()).collect();
    assert_eq!(names, vec!["slowest", "fastest"]);
}
