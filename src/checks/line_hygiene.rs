//! Line hygiene check
//!
//! Flags trailing whitespace and a missing final newline. The only
//! built-in side-effecting check: with auto-fix enabled its fix pass
//! rewrites the offending lines.

use async_trait::async_trait;

use crate::core::models::{ChangeEvent, CheckOutcome, CheckStatus, Fix, Issue, IssueSeverity};
use crate::core::ports::{Check, CheckError, CheckMode, FileSnapshot};
use crate::core::services::Applicability;

/// Whitespace and final-newline hygiene
#[derive(Debug)]
pub struct LineHygiene {
    applicability: Applicability,
    mode: CheckMode,
}

impl LineHygiene {
    /// Check name used in config and outcomes
    pub const NAME: &'static str = "line_hygiene";

    /// Create the check
    #[must_use]
    pub fn new(applicability: Applicability, mode: CheckMode) -> Self {
        Self { applicability, mode }
    }

    fn clean(content: &str) -> String {
        let mut cleaned: String = content
            .split('\n')
            .map(|line| line.trim_end_matches([' ', '\t']))
            .collect::<Vec<_>>()
            .join("\n");
        if !cleaned.is_empty() && !cleaned.ends_with('\n') {
            cleaned.push('\n');
        }
        cleaned
    }
}

#[async_trait]
impl Check for LineHygiene {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn mode(&self) -> CheckMode {
        self.mode
    }

    fn applicable(&self, event: &ChangeEvent) -> bool {
        self.applicability.matches(event)
    }

    async fn run(&self, file: &FileSnapshot, _event: &ChangeEvent) -> Result<CheckOutcome, CheckError> {
        let Some(content) = file.text()? else {
            return Ok(CheckOutcome::approved(Self::NAME));
        };

        let mut issues = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.ends_with(' ') || line.ends_with('\t') {
                issues.push(
                    Issue::new("trailing whitespace", IssueSeverity::Low)
                        .at_line(u32::try_from(idx + 1).unwrap_or(u32::MAX))
                        .with_suggestion("strip trailing spaces and tabs"),
                );
            }
        }
        if !content.is_empty() && !content.ends_with('\n') {
            issues.push(
                Issue::new("missing trailing newline", IssueSeverity::Low)
                    .with_suggestion("end the file with a newline"),
            );
        }

        let status = if issues.is_empty() { CheckStatus::Approved } else { CheckStatus::Warning };
        Ok(CheckOutcome::new(Self::NAME, status, issues))
    }

    async fn fix(&self, content: &str) -> Result<Option<(String, Vec<Fix>)>, CheckError> {
        let cleaned = Self::clean(content);
        if cleaned == content {
            return Ok(None);
        }

        let mut fixes = Vec::new();
        let stripped = content
            .lines()
            .filter(|line| line.ends_with(' ') || line.ends_with('\t'))
            .count();
        if stripped > 0 {
            fixes.push(Fix::new(format!("stripped trailing whitespace on {stripped} line(s)")));
        }
        if !content.is_empty() && !content.ends_with('\n') {
            fixes.push(Fix::new("added trailing newline"));
        }
        Ok(Some((cleaned, fixes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn snapshot(content: &str) -> FileSnapshot {
        FileSnapshot::with_content(PathBuf::from("src/sample.rs"), content.to_string())
    }

    fn event() -> ChangeEvent {
        ChangeEvent::new("src/sample.rs", crate::core::models::ChangeKind::Modified)
    }

    fn check() -> LineHygiene {
        LineHygiene::new(Applicability::any(), CheckMode::SideEffecting)
    }

    #[tokio::test]
    async fn test_clean_file_approved() {
        let outcome = check().run(&snapshot("fn main() {}\n"), &event()).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Approved);
        assert!(outcome.issues.is_empty());
    }

    #[tokio::test]
    async fn test_flags_trailing_whitespace_with_line() {
        let outcome = check().run(&snapshot("let x = 1;  \nlet y = 2;\n"), &event()).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Warning);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].line, Some(1));
    }

    #[tokio::test]
    async fn test_flags_missing_trailing_newline() {
        let outcome = check().run(&snapshot("no newline"), &event()).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Warning);
        assert!(outcome.issues[0].message.contains("trailing newline"));
    }

    #[tokio::test]
    async fn test_fix_repairs_both() {
        let (fixed, fixes) = check().fix("a \nb\t\nc").await.unwrap().unwrap();
        assert_eq!(fixed, "a\nb\nc\n");
        assert_eq!(fixes.len(), 2);
    }

    #[tokio::test]
    async fn test_fix_noop_on_clean_content() {
        assert!(check().fix("a\nb\n").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleted_file_approved() {
        let gone = FileSnapshot::absent(PathBuf::from("src/sample.rs"));
        let outcome = check().run(&gone, &event()).await.unwrap();
        assert_eq!(outcome.status, CheckStatus::Approved);
    }
}
