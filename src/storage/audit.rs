//! File-backed audit sink
//!
//! Append-only JSONL, one file per day, one line per run. Appends are
//! flushed immediately so a crash loses at most the record being
//! written; `flush` exists for sinks that buffer.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use log::warn;

use crate::core::models::AggregateResult;
use crate::core::ports::{AuditFilter, AuditSink};

/// Audit sink writing daily JSONL files under `.doorman/audit/`
#[derive(Debug)]
pub struct FileAuditSink {
    dir: PathBuf,
    // Serializes appends from concurrent runs
    write_guard: Mutex<()>,
}

impl FileAuditSink {
    /// Create a sink rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, write_guard: Mutex::new(()) })
    }

    fn current_file(&self) -> PathBuf {
        self.dir.join(format!("{}.jsonl", Utc::now().format("%Y-%m-%d")))
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn append(&self, result: &AggregateResult) -> anyhow::Result<()> {
        let line = serde_json::to_string(result)?;
        let path = self.current_file();
        let _guard = self.write_guard.lock().expect("audit lock poisoned");
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter) -> anyhow::Result<Vec<AggregateResult>> {
        let mut records = Vec::new();
        if !self.dir.exists() {
            return Ok(records);
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == "jsonl"))
            .collect();
        files.sort();

        for path in files {
            let content = fs::read_to_string(&path)?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<AggregateResult>(line) {
                    Ok(record) if filter.matches(&record) => records.push(record),
                    Ok(_) => {}
                    Err(err) => warn!("skipping malformed audit line in {}: {err}", path.display()),
                }
            }
        }
        Ok(records)
    }

    async fn flush(&self) -> anyhow::Result<()> {
        // Appends are flushed as they happen
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{
        ChangeEvent, ChangeKind, CheckOutcome, DebouncedEvent,
    };
    use crate::core::services::build_result;

    fn sample(path: &str) -> AggregateResult {
        let event = DebouncedEvent::single(ChangeEvent::new(path, ChangeKind::Modified));
        build_result(event, vec![CheckOutcome::approved("line_hygiene")])
    }

    #[tokio::test]
    async fn test_append_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileAuditSink::new(dir.path().join("audit")).unwrap();

        sink.append(&sample("src/a.rs")).await.unwrap();
        sink.append(&sample("src/b.rs")).await.unwrap();

        let all = sink.query(&AuditFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_query_filters_by_path_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileAuditSink::new(dir.path().join("audit")).unwrap();

        sink.append(&sample("src/a.rs")).await.unwrap();
        sink.append(&sample("docs/readme.md")).await.unwrap();

        let filter = AuditFilter {
            path_prefix: Some("src".into()),
            ..AuditFilter::default()
        };
        let hits = sink.query(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].event.path().starts_with("src"));
    }

    #[tokio::test]
    async fn test_query_filters_by_time() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileAuditSink::new(dir.path().join("audit")).unwrap();

        sink.append(&sample("src/a.rs")).await.unwrap();

        let future = AuditFilter {
            since: Some(Utc::now() + chrono::Duration::hours(1)),
            ..AuditFilter::default()
        };
        assert!(sink.query(&future).await.unwrap().is_empty());
    }
}
