//! License header check
//!
//! Flags source files whose opening lines carry no license or
//! copyright marker. Report-only.

use async_trait::async_trait;

use crate::core::models::{ChangeEvent, CheckOutcome, CheckStatus, Issue, IssueSeverity};
use crate::core::ports::{Check, CheckError, CheckMode, FileSnapshot};
use crate::core::services::Applicability;

/// How many opening lines are searched for a marker
const HEADER_WINDOW: usize = 10;

/// License / copyright header presence
#[derive(Debug)]
pub struct LicenseHeader {
    applicability: Applicability,
}

impl LicenseHeader {
    /// Check name used in config and outcomes
    pub const NAME: &'static str = "license_header";

    /// Default extensions when none are configured
    pub const DEFAULT_FILE_TYPES: &'static [&'static str] =
        &[".rs", ".py", ".js", ".ts", ".go", ".java", ".c", ".h"];

    /// Create the check
    #[must_use]
    pub fn new(applicability: Applicability) -> Self {
        Self { applicability }
    }

    fn has_marker(content: &str) -> bool {
        content.lines().take(HEADER_WINDOW).any(|line| {
            let line = line.to_lowercase();
            line.contains("copyright")
                || line.contains("spdx-license-identifier")
                || line.contains("license")
        })
    }
}

#[async_trait]
impl Check for LicenseHeader {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn mode(&self) -> CheckMode {
        CheckMode::ReportOnly
    }

    fn applicable(&self, event: &ChangeEvent) -> bool {
        self.applicability.matches(event)
    }

    async fn run(&self, file: &FileSnapshot, _event: &ChangeEvent) -> Result<CheckOutcome, CheckError> {
        let Some(content) = file.text()? else {
            return Ok(CheckOutcome::approved(Self::NAME));
        };

        if content.trim().is_empty() || Self::has_marker(content) {
            return Ok(CheckOutcome::approved(Self::NAME));
        }

        let issue = Issue::new("missing license header", IssueSeverity::Medium)
            .at_line(1)
            .with_suggestion("add a copyright or SPDX-License-Identifier line at the top");
        Ok(CheckOutcome::new(Self::NAME, CheckStatus::Warning, vec![issue]))
    }
}
