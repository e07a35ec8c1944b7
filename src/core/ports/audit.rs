//! Audit sink contract

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::models::AggregateResult;

/// Filter for audit queries
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Only records whose path starts with this prefix
    pub path_prefix: Option<PathBuf>,
    /// Only records created at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Only records created before this instant
    pub until: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Whether a record passes the filter
    #[must_use]
    pub fn matches(&self, record: &AggregateResult) -> bool {
        if let Some(prefix) = &self.path_prefix {
            if !record.event.path().starts_with(prefix) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if record.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.created_at >= until {
                return false;
            }
        }
        true
    }
}

/// Append-only durable store of aggregate results
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record
    async fn append(&self, result: &AggregateResult) -> anyhow::Result<()>;

    /// Query records by path and time range
    async fn query(&self, filter: &AuditFilter) -> anyhow::Result<Vec<AggregateResult>>;

    /// Flush buffered records to durable storage (called at shutdown)
    async fn flush(&self) -> anyhow::Result<()>;
}
