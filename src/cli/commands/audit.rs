//! `doorman audit` - query past run records

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};

use doorman::core::ports::{AuditFilter, AuditSink};
use doorman::output::OutputMode;
use doorman::paths;
use doorman::storage::FileAuditSink;

/// Parse `--since`: RFC3339, or a relative `30m` / `24h` / `7d`
fn parse_since(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    let (amount, unit) = value.split_at(value.len().saturating_sub(1));
    let amount: i64 = amount.parse().with_context(|| format!("invalid --since value: {value}"))?;
    let delta = match unit {
        "m" => Duration::minutes(amount),
        "h" => Duration::hours(amount),
        "d" => Duration::days(amount),
        _ => anyhow::bail!("invalid --since value: {value} (use RFC3339, or 30m / 24h / 7d)"),
    };
    Ok(Utc::now() - delta)
}

/// Print audit records matching the filter
pub fn execute(
    path: Option<PathBuf>,
    since: Option<String>,
    mode: OutputMode,
) -> anyhow::Result<i32> {
    let root = Path::new(".");
    let sink = FileAuditSink::new(paths::audit_dir(root))?;
    let filter = AuditFilter {
        path_prefix: path,
        since: since.as_deref().map(parse_since).transpose()?,
        until: None,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let records = runtime.block_on(sink.query(&filter))?;

    match mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputMode::Human => {
            for record in &records {
                println!(
                    "{}  {:<8}  {}  ({} issue(s), {} fix(es))",
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.overall.to_string(),
                    record.event.path().display(),
                    record.total_issues(),
                    record.total_fixes(),
                );
            }
            println!("{} record(s)", records.len());
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_since_relative() {
        let day_ago = parse_since("24h").unwrap();
        let delta = Utc::now() - day_ago;
        assert!((delta - Duration::hours(24)).num_seconds().abs() < 5);

        assert!(parse_since("7d").is_ok());
        assert!(parse_since("30m").is_ok());
    }

    #[test]
    fn test_parse_since_rfc3339() {
        let instant = parse_since("2026-08-01T00:00:00Z").unwrap();
        assert_eq!(instant.to_rfc3339(), "2026-08-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_since_rejects_garbage() {
        assert!(parse_since("yesterday").is_err());
        assert!(parse_since("12w").is_err());
    }
}
