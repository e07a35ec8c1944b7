//! Aggregated run results
//!
//! One `AggregateResult` per orchestrator run. Owned by the
//! orchestrator until handed to the dispatcher and the audit sink,
//! read-only afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::DebouncedEvent;
use super::outcome::CheckOutcome;

/// Merged verdict across every check that ran for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// Every check approved
    Approved,
    /// At least one fix was applied and nothing else degraded the run
    Fixed,
    /// Findings or degraded checks, not blocking
    Warning,
    /// At least one check denied the change
    Denied,
}

impl OverallStatus {
    /// Rank for threshold comparisons (higher = more severe)
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Approved => 0,
            Self::Fixed => 1,
            Self::Warning => 2,
            Self::Denied => 3,
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Fixed => write!(f, "fixed"),
            Self::Warning => write!(f, "warning"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

impl std::str::FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approved" => Ok(Self::Approved),
            "fixed" => Ok(Self::Fixed),
            "warning" => Ok(Self::Warning),
            "denied" => Ok(Self::Denied),
            _ => Err(format!("Invalid status: {s}. Use: approved, fixed, warning, denied")),
        }
    }
}

/// The full record of one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    /// The debounced event that triggered the run
    pub event: DebouncedEvent,
    /// Per-check outcomes in check-registration order
    pub outcomes: Vec<CheckOutcome>,
    /// Merged verdict (see `core::services::verdict`)
    pub overall: OverallStatus,
    /// When the run completed
    pub created_at: DateTime<Utc>,
}

impl AggregateResult {
    /// Total unresolved issues across all outcomes
    #[must_use]
    pub fn total_issues(&self) -> usize {
        self.outcomes.iter().map(|o| o.issues.len()).sum()
    }

    /// Total fixes applied across all outcomes
    #[must_use]
    pub fn total_fixes(&self) -> usize {
        self.outcomes.iter().map(|o| o.fixes_applied.len()).sum()
    }
}
