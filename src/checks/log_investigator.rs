//! Log investigator check
//!
//! Parses a log file into individual error entries, fingerprints each
//! one, and triages the ones not seen before - through the reasoning
//! service when one is configured, locally otherwise.
//!
//! Dedup contract: `seen` is consulted before any expensive work and
//! a fingerprint is recorded only after its triage succeeded, so a
//! failed investigation stays eligible for retry on the next run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use regex::Regex;

use crate::core::models::{ChangeEvent, CheckOutcome, CheckStatus, Issue, IssueSeverity};
use crate::core::ports::{AgentService, Check, CheckError, CheckMode, FileSnapshot};
use crate::core::services::Applicability;
use crate::storage::{DedupKey, ErrorDedupStore};

/// Longest error line kept as an issue message
const MESSAGE_LIMIT: usize = 200;

/// Longest triage answer kept as a suggestion
const SUGGESTION_LIMIT: usize = 400;

/// Error triage over log files
pub struct LogInvestigator {
    applicability: Applicability,
    store: Arc<ErrorDedupStore>,
    agent: Option<Arc<dyn AgentService>>,
    entry_pattern: Regex,
}

impl std::fmt::Debug for LogInvestigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogInvestigator")
            .field("agent", &self.agent.is_some())
            .finish()
    }
}

impl LogInvestigator {
    /// Check name used in config and outcomes
    pub const NAME: &'static str = "log_investigator";

    /// Default extensions when none are configured
    pub const DEFAULT_FILE_TYPES: &'static [&'static str] = &[".log"];

    /// Create the check
    pub fn new(
        applicability: Applicability,
        store: Arc<ErrorDedupStore>,
        agent: Option<Arc<dyn AgentService>>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            applicability,
            store,
            agent,
            entry_pattern: Regex::new(r"(?i)\b(error|exception|fatal|panic|traceback)\b")?,
        })
    }

    fn truncate(text: &str, limit: usize) -> String {
        if text.len() <= limit {
            text.to_string()
        } else {
            let mut end = limit;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        }
    }

    async fn triage(&self, entry: &str, source: &str) -> anyhow::Result<Option<String>> {
        let Some(agent) = &self.agent else { return Ok(None) };
        let prompt = format!(
            "A log file ({source}) contains this error entry:\n\n{entry}\n\n\
             In two sentences: what likely caused it and what should be checked first?"
        );
        let answer = agent.query(&prompt).await?;
        Ok(Some(Self::truncate(answer.trim(), SUGGESTION_LIMIT)))
    }
}

#[async_trait]
impl Check for LogInvestigator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn mode(&self) -> CheckMode {
        CheckMode::ReportOnly
    }

    fn applicable(&self, event: &ChangeEvent) -> bool {
        self.applicability.matches(event)
    }

    async fn run(&self, file: &FileSnapshot, event: &ChangeEvent) -> Result<CheckOutcome, CheckError> {
        let Some(content) = file.text()? else {
            return Ok(CheckOutcome::approved(Self::NAME));
        };
        let source = event.file_name();

        let mut issues = Vec::new();
        let mut skipped = 0usize;
        for (idx, line) in content.lines().enumerate() {
            if !self.entry_pattern.is_match(line) {
                continue;
            }
            let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            let message = Self::truncate(line.trim(), MESSAGE_LIMIT);
            let key = DedupKey::new(&message, &source, Some(line_no));

            if self.store.seen(&key) {
                skipped += 1;
                continue;
            }

            match self.triage(&message, &source).await {
                Ok(suggestion) => {
                    let mut issue = Issue::new(message, IssueSeverity::Medium).at_line(line_no);
                    if let Some(suggestion) = suggestion {
                        issue = issue.with_suggestion(suggestion);
                    }
                    issues.push(issue);
                    // Durable record only after a successful triage
                    if let Err(err) = self.store.record(&key, Utc::now()) {
                        warn!("could not record investigated error: {err}");
                    }
                }
                Err(err) => {
                    // Leave the fingerprint unrecorded so it retries
                    warn!("triage failed for {source}:{line_no}: {err}");
                    issues.push(
                        Issue::new(message, IssueSeverity::Medium)
                            .at_line(line_no)
                            .with_suggestion(format!("triage unavailable: {err}")),
                    );
                }
            }
        }

        if skipped > 0 {
            debug!("{source}: skipped {skipped} already-investigated entries");
        }

        let status = if issues.is_empty() { CheckStatus::Approved } else { CheckStatus::Warning };
        Ok(CheckOutcome::new(Self::NAME, status, issues))
    }
}
