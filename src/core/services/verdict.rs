//! Verdict folding - merges per-check outcomes into one decision
//!
//! This is pure business logic with no I/O.

use chrono::Utc;

use crate::core::models::{
    AggregateResult, CheckOutcome, CheckStatus, DebouncedEvent, IssueSeverity, OverallStatus,
};

/// Merge per-check outcomes into an overall status
///
/// Precedence: any denial wins outright; otherwise an unresolved
/// high/critical issue forces at least a warning; `fixed` is reported
/// only when every outcome is fixed or approved and at least one fix
/// was applied; `approved` only when all outcomes approved.
///
/// An empty outcome list (no applicable checks) is `approved`.
#[must_use]
pub fn overall_status(outcomes: &[CheckOutcome]) -> OverallStatus {
    if outcomes.iter().any(|o| o.status == CheckStatus::Denied) {
        return OverallStatus::Denied;
    }

    let severe_issue = outcomes
        .iter()
        .filter_map(CheckOutcome::worst_severity)
        .any(|s| s >= IssueSeverity::High);
    if severe_issue || outcomes.iter().any(|o| o.status == CheckStatus::Warning) {
        return OverallStatus::Warning;
    }

    // Remaining statuses are all approved or fixed
    if outcomes.iter().any(|o| o.status == CheckStatus::Fixed && !o.fixes_applied.is_empty()) {
        return OverallStatus::Fixed;
    }

    OverallStatus::Approved
}

/// Assemble the final run record
#[must_use]
pub fn build_result(event: DebouncedEvent, outcomes: Vec<CheckOutcome>) -> AggregateResult {
    let overall = overall_status(&outcomes);
    AggregateResult {
        event,
        outcomes,
        overall,
        created_at: Utc::now(),
    }
}
