//! Terminal output for one-shot runs
//!
//! Renders aggregate results for humans (colored) or machines (JSON).

use colored::Colorize;

use crate::core::models::{AggregateResult, CheckStatus, IssueSeverity, OverallStatus};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn paint_overall(status: OverallStatus) -> String {
    let label = status.to_string().to_uppercase();
    match status {
        OverallStatus::Approved => label.as_str().green().bold().to_string(),
        OverallStatus::Fixed => label.as_str().blue().bold().to_string(),
        OverallStatus::Warning => label.as_str().yellow().bold().to_string(),
        OverallStatus::Denied => label.as_str().red().bold().to_string(),
    }
}

fn paint_check(status: CheckStatus) -> String {
    let label = status.to_string();
    match status {
        CheckStatus::Approved => label.as_str().green().to_string(),
        CheckStatus::Fixed => label.as_str().blue().to_string(),
        CheckStatus::Warning => label.as_str().yellow().to_string(),
        CheckStatus::Denied => label.as_str().red().to_string(),
    }
}

fn paint_severity(severity: IssueSeverity) -> String {
    let label = format!("[{severity}]");
    match severity {
        IssueSeverity::Low => label.as_str().dimmed().to_string(),
        IssueSeverity::Medium => label.as_str().yellow().to_string(),
        IssueSeverity::High => label.as_str().red().to_string(),
        IssueSeverity::Critical => label.as_str().red().bold().to_string(),
    }
}

/// Render one result as human-readable text
#[must_use]
pub fn render_result(result: &AggregateResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} ({})\n",
        paint_overall(result.overall),
        result.event.path().display(),
        result.event.kind(),
    ));

    for outcome in &result.outcomes {
        out.push_str(&format!(
            "  {} {} ({}ms)\n",
            paint_check(outcome.status),
            outcome.check_name,
            outcome.duration_ms
        ));
        if let Some(failure) = &outcome.failure {
            out.push_str(&format!("    {} {}\n", "failed:".red(), failure));
        }
        for issue in &outcome.issues {
            let line = issue.line.map(|l| format!(":{l}")).unwrap_or_default();
            out.push_str(&format!(
                "    {} {}{}\n",
                paint_severity(issue.severity),
                issue.message,
                line
            ));
            if let Some(suggestion) = &issue.suggestion {
                out.push_str(&format!("      {} {}\n", "->".dimmed(), suggestion.as_str().dimmed()));
            }
        }
        for fix in &outcome.fixes_applied {
            out.push_str(&format!("    {} {}\n", "fixed:".blue(), fix.description));
        }
    }
    out
}

/// Render one result in the requested mode
pub fn render(result: &AggregateResult, mode: OutputMode) -> anyhow::Result<String> {
    match mode {
        OutputMode::Human => Ok(render_result(result)),
        OutputMode::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

/// Render a closing summary over several results
#[must_use]
pub fn render_summary(results: &[AggregateResult]) -> String {
    let denied = results.iter().filter(|r| r.overall == OverallStatus::Denied).count();
    let warnings = results.iter().filter(|r| r.overall == OverallStatus::Warning).count();
    let fixed = results.iter().filter(|r| r.overall == OverallStatus::Fixed).count();
    let issues: usize = results.iter().map(AggregateResult::total_issues).sum();

    let verdict = if denied > 0 {
        "denied".red().bold().to_string()
    } else if warnings > 0 {
        "passed with warnings".yellow().to_string()
    } else {
        "passed".green().to_string()
    };
    format!(
        "{} file(s) checked: {verdict} ({denied} denied, {warnings} warning(s), {fixed} fixed, {issues} issue(s))\n",
        results.len()
    )
}
