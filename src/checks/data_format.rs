//! Data format check
//!
//! Validates the syntax of structured data files (JSON, TOML).
//! Report-only: a malformed data file needs a human, not a rewrite.

use async_trait::async_trait;

use crate::core::models::{ChangeEvent, CheckOutcome, CheckStatus, Issue, IssueSeverity};
use crate::core::ports::{Check, CheckError, CheckMode, FileSnapshot};
use crate::core::services::Applicability;

/// Structured data syntax validation
#[derive(Debug)]
pub struct DataFormat {
    applicability: Applicability,
}

impl DataFormat {
    /// Check name used in config and outcomes
    pub const NAME: &'static str = "data_format";

    /// Default extensions when none are configured
    pub const DEFAULT_FILE_TYPES: &'static [&'static str] = &[".json", ".toml"];

    /// Create the check
    #[must_use]
    pub fn new(applicability: Applicability) -> Self {
        Self { applicability }
    }

    fn validate(extension: &str, content: &str) -> Option<Issue> {
        match extension {
            ".json" => serde_json::from_str::<serde_json::Value>(content).err().map(|err| {
                Issue::new(format!("invalid JSON: {err}"), IssueSeverity::High)
                    .at_line(u32::try_from(err.line()).unwrap_or(u32::MAX))
                    .with_suggestion("fix the syntax error")
            }),
            ".toml" => content.parse::<toml::Value>().err().map(|err| {
                Issue::new(format!("invalid TOML: {err}"), IssueSeverity::High)
                    .with_suggestion("fix the syntax error")
            }),
            _ => None,
        }
    }
}

#[async_trait]
impl Check for DataFormat {
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

        let issues: Vec<Issue> = event
            .extension()
            .and_then(|ext| Self::validate(&ext, content))
            .into_iter()
            .collect();

        let status = if issues.is_empty() { CheckStatus::Approved } else { CheckStatus::Warning };
        Ok(CheckOutcome::new(Self::NAME, status, issues))
    }
}
