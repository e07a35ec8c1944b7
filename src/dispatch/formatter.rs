//! Notification payload formatting
//!
//! Builds the JSON payload for a result at a given detail level.
//! Detail levels change the payload, never the engine.

use serde_json::{Value, json};

use crate::core::models::{AggregateResult, Issue};
use crate::core::ports::DetailLevel;

/// How many issues a summary payload carries
const TOP_ISSUES: usize = 3;

/// Format a result at the requested verbosity
#[must_use]
pub fn format(result: &AggregateResult, detail: DetailLevel) -> Value {
    match detail {
        DetailLevel::Summary => summary(result),
        DetailLevel::Detailed => detailed(result),
        DetailLevel::FullTranscript => full_transcript(result),
    }
}

fn summary(result: &AggregateResult) -> Value {
    let mut issues: Vec<(&str, &Issue)> = result
        .outcomes
        .iter()
        .flat_map(|o| o.issues.iter().map(move |i| (o.check_name.as_str(), i)))
        .collect();
    // Worst first
    issues.sort_by(|(_, a), (_, b)| b.severity.cmp(&a.severity));

    let top: Vec<Value> = issues
        .iter()
        .take(TOP_ISSUES)
        .map(|(check, issue)| {
            json!({
                "check": check,
                "message": issue.message,
                "severity": issue.severity,
                "line": issue.line,
            })
        })
        .collect();

    json!({
        "format": "summary",
        "file": result.event.path().to_string_lossy(),
        "event": result.event.kind().to_string(),
        "timestamp": result.created_at.to_rfc3339(),
        "overall_status": result.overall,
        "summary": {
            "total_issues": result.total_issues(),
            "total_fixes": result.total_fixes(),
            "checks_run": result.outcomes.len(),
            "top_issues": top,
        },
        "checks": result.outcomes.iter().map(|o| json!({
            "name": o.check_name,
            "status": o.status,
            "issue_count": o.issues.len(),
            "fix_count": o.fixes_applied.len(),
            "failure": o.failure,
        })).collect::<Vec<_>>(),
    })
}

fn detailed(result: &AggregateResult) -> Value {
    let mut payload = summary(result);
    payload["format"] = json!("detailed");
    payload["results"] = result
        .outcomes
        .iter()
        .map(|o| serde_json::to_value(o).unwrap_or_else(|_| json!(null)))
        .collect();
    payload
}

fn full_transcript(result: &AggregateResult) -> Value {
    let mut payload = detailed(result);
    payload["format"] = json!("full_transcript");
    // Suggestions carry whatever the reasoning service said; there is
    // no separate transcript store
    payload["transcript"] = result
        .outcomes
        .iter()
        .flat_map(|o| o.issues.iter())
        .filter_map(|i| i.suggestion.as_deref())
        .collect::<Vec<_>>()
        .into();
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{
        ChangeEvent, ChangeKind, CheckOutcome, CheckStatus, DebouncedEvent, IssueSeverity,
    };
    use crate::core::services::build_result;

    fn sample() -> AggregateResult {
        let event = DebouncedEvent::single(ChangeEvent::new("src/app.py", ChangeKind::Modified));
        let outcome = CheckOutcome::new(
            "secret_scan",
            CheckStatus::Warning,
            vec![
                Issue::new("low issue", IssueSeverity::Low),
                Issue::new("critical issue", IssueSeverity::Critical),
                Issue::new("medium issue", IssueSeverity::Medium),
                Issue::new("high issue", IssueSeverity::High),
            ],
        );
        build_result(event, vec![outcome, CheckOutcome::approved("line_hygiene")])
    }

    #[test]
    fn test_summary_keeps_worst_three() {
        let payload = format(&sample(), DetailLevel::Summary);
        assert_eq!(payload["format"], "summary");
        assert_eq!(payload["summary"]["total_issues"], 4);
        let top = payload["summary"]["top_issues"].as_array().unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0]["severity"], "critical");
        assert_eq!(top[1]["severity"], "high");
        assert!(payload.get("results").is_none());
    }

    #[test]
    fn test_detailed_includes_full_outcomes() {
        let payload = format(&sample(), DetailLevel::Detailed);
        assert_eq!(payload["format"], "detailed");
        let results = payload["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["check_name"], "secret_scan");
    }

    #[test]
    fn test_full_transcript_collects_suggestions() {
        let event = DebouncedEvent::single(ChangeEvent::new("app.log", ChangeKind::Modified));
        let outcome = CheckOutcome::new(
            "log_investigator",
            CheckStatus::Warning,
            vec![Issue::new("ERROR boom", IssueSeverity::Medium).with_suggestion("check the db")],
        );
        let payload = format(&build_result(event, vec![outcome]), DetailLevel::FullTranscript);
        assert_eq!(payload["format"], "full_transcript");
        assert_eq!(payload["transcript"][0], "check the db");
    }
}
