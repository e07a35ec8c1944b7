//! Per-check verdicts
//!
//! A `CheckOutcome` is produced by exactly one check invocation and is
//! immutable once returned, with one exception: the orchestrator's fix
//! fold upgrades a side-effecting check's outcome after its fix pass
//! has been applied to the file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Verdict of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Nothing to report
    Approved,
    /// The change must not stand as-is
    Denied,
    /// Issues were found and repaired in place
    Fixed,
    /// Issues found (or the check itself degraded) but not blocking
    Warning,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
            Self::Fixed => write!(f, "fixed"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// How serious an individual issue is
///
/// Ordering is by increasing severity, so `High < Critical` and the
/// maximum of a list is its worst finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Cosmetic or informational
    Low,
    /// Worth fixing, not urgent
    Medium,
    /// Should block a release
    High,
    /// Must be dealt with immediately
    Critical,
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One finding reported by a check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// What is wrong
    pub message: String,
    /// How serious it is
    pub severity: IssueSeverity,
    /// Line number in the checked file, when known
    pub line: Option<u32>,
    /// Suggested remedy, when the check has one
    pub suggestion: Option<String>,
}

impl Issue {
    /// Create an issue without a line or suggestion
    pub fn new(message: impl Into<String>, severity: IssueSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
            line: None,
            suggestion: None,
        }
    }

    /// Attach a line number
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a suggested remedy
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A repair applied to the file by the orchestrator's fix fold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    /// What was changed
    pub description: String,
}

impl Fix {
    /// Create a fix record
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }
}

/// Result of one check invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Identity of the check that produced this outcome
    pub check_name: String,
    /// The check's verdict
    pub status: CheckStatus,
    /// Unresolved findings, in the order the check reported them
    pub issues: Vec<Issue>,
    /// Repairs applied by the fix fold, in application order
    pub fixes_applied: Vec<Fix>,
    /// Wall-clock duration of the check's `run`, in milliseconds
    pub duration_ms: u64,
    /// Failure marker when the check itself broke (timeout, error)
    pub failure: Option<String>,
}

impl CheckOutcome {
    /// A clean outcome with the given status and findings
    pub fn new(check_name: impl Into<String>, status: CheckStatus, issues: Vec<Issue>) -> Self {
        Self {
            check_name: check_name.into(),
            status,
            issues,
            fixes_applied: Vec::new(),
            duration_ms: 0,
            failure: None,
        }
    }

    /// An outcome with nothing to report
    pub fn approved(check_name: impl Into<String>) -> Self {
        Self::new(check_name, CheckStatus::Approved, Vec::new())
    }

    /// An outcome for a check that itself failed (timeout, error)
    ///
    /// Recorded as a warning with a failure marker so a broken check
    /// degrades the run without aborting sibling checks.
    pub fn failed(check_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            status: CheckStatus::Warning,
            issues: Vec::new(),
            fixes_applied: Vec::new(),
            duration_ms: 0,
            failure: Some(reason.into()),
        }
    }

    /// Record how long the check ran
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Worst severity among unresolved issues, if any
    #[must_use]
    pub fn worst_severity(&self) -> Option<IssueSeverity> {
        self.issues.iter().map(|i| i.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(IssueSeverity::Low < IssueSeverity::Medium);
        assert!(IssueSeverity::High < IssueSeverity::Critical);
    }

    #[test]
    fn test_failed_outcome_is_warning_with_marker() {
        let outcome = CheckOutcome::failed("secret_scan", "timed out after 60s");
        assert_eq!(outcome.status, CheckStatus::Warning);
        assert!(outcome.failure.as_deref().unwrap().contains("timed out"));
    }

    #[test]
    fn test_worst_severity() {
        let outcome = CheckOutcome::new(
            "x",
            CheckStatus::Warning,
            vec![
                Issue::new("a", IssueSeverity::Medium),
                Issue::new("b", IssueSeverity::Critical),
                Issue::new("c", IssueSeverity::Low),
            ],
        );
        assert_eq!(outcome.worst_severity(), Some(IssueSeverity::Critical));
        assert_eq!(CheckOutcome::approved("x").worst_severity(), None);
    }
}
