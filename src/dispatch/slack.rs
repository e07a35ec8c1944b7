//! Slack notifier
//!
//! Posts Block Kit messages to an incoming webhook.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::core::models::{AggregateResult, CheckStatus, OverallStatus};
use crate::core::ports::{DetailLevel, Notifier};

fn status_emoji(status: OverallStatus) -> &'static str {
    match status {
        OverallStatus::Approved => ":white_check_mark:",
        OverallStatus::Fixed => ":wrench:",
        OverallStatus::Warning => ":warning:",
        OverallStatus::Denied => ":x:",
    }
}

fn check_emoji(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Approved => ":white_check_mark:",
        CheckStatus::Fixed => ":wrench:",
        CheckStatus::Warning => ":warning:",
        CheckStatus::Denied => ":x:",
    }
}

fn status_color(status: OverallStatus) -> &'static str {
    match status {
        OverallStatus::Approved => "#2eb67d",
        OverallStatus::Fixed => "#36c5f0",
        OverallStatus::Warning => "#ecb22e",
        OverallStatus::Denied => "#e01e5a",
    }
}

/// Slack incoming-webhook notifier
#[derive(Debug)]
pub struct SlackNotifier {
    webhook_url: String,
    channel: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    /// Create a notifier for a webhook URL
    #[must_use]
    pub fn new(webhook_url: String, channel: String) -> Self {
        Self { webhook_url, channel, client: reqwest::Client::new() }
    }

    fn build_message(&self, result: &AggregateResult, detail: DetailLevel) -> Value {
        let mut blocks = vec![
            json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!(
                        "{} doorman: {}",
                        status_emoji(result.overall),
                        result.overall.to_string().to_uppercase()
                    ),
                }
            }),
            json!({
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*File:*\n`{}`", result.event.event.file_name()) },
                    { "type": "mrkdwn", "text": format!("*Event:*\n{}", result.event.kind()) },
                ]
            }),
        ];

        for outcome in &result.outcomes {
            let mut text = format!(
                "*{} {}:* {}",
                check_emoji(outcome.status),
                outcome.check_name,
                outcome.status
            );
            if !outcome.issues.is_empty() {
                text.push_str(&format!("\n• Issues: {}", outcome.issues.len()));
            }
            if !outcome.fixes_applied.is_empty() {
                text.push_str(&format!("\n• Fixes: {}", outcome.fixes_applied.len()));
            }
            if let Some(failure) = &outcome.failure {
                text.push_str(&format!("\n• Failed: {failure}"));
            }
            if detail != DetailLevel::Summary {
                for issue in &outcome.issues {
                    text.push_str(&format!("\n> [{}] {}", issue.severity, issue.message));
                }
            }
            blocks.push(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": text }
            }));
        }

        blocks.push(json!({ "type": "divider" }));

        json!({
            "channel": self.channel,
            "blocks": blocks,
            "attachments": [{
                "color": status_color(result.overall),
                "footer": "doorman - quality control at the door",
            }]
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, result: &AggregateResult, detail: DetailLevel) -> anyhow::Result<()> {
        let message = self.build_message(result, detail);
        let response = self.client.post(&self.webhook_url).json(&message).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}
