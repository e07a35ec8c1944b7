//! Notification sink contract

use async_trait::async_trait;

use crate::core::models::AggregateResult;

/// How much of a result a notification carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    /// Counts plus the few worst issues
    #[default]
    Summary,
    /// Every issue and fix
    Detailed,
    /// Everything, including the investigation transcript when present
    FullTranscript,
}

impl std::str::FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "detailed" => Ok(Self::Detailed),
            "full_transcript" => Ok(Self::FullTranscript),
            _ => Err(format!("Invalid detail level: {s}. Use: summary, detailed, full_transcript")),
        }
    }
}

/// One delivery channel for aggregate results
///
/// Sends are best-effort: the dispatcher logs a failed send and moves
/// on; one sink's failure never blocks another.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs
    fn name(&self) -> &str;

    /// Deliver one result at the given verbosity
    async fn send(&self, result: &AggregateResult, detail: DetailLevel) -> anyhow::Result<()>;
}
