//! Ticket action
//!
//! Creates a remote ticket by posting a compact payload to a
//! configured endpoint (an issue-tracker bridge or automation hook).
//! The wire format of any particular tracker is that bridge's
//! business; doorman only needs a reference back.

use async_trait::async_trait;
use serde_json::json;

use crate::core::models::AggregateResult;
use crate::core::ports::ExternalAction;

/// Webhook-backed ticket creation
#[derive(Debug)]
pub struct TicketWebhookAction {
    endpoint: String,
    labels: Vec<String>,
    client: reqwest::Client,
}

impl TicketWebhookAction {
    /// Create the action for an endpoint
    #[must_use]
    pub fn new(endpoint: String, labels: Vec<String>) -> Self {
        Self { endpoint, labels, client: reqwest::Client::new() }
    }

    fn build_payload(&self, result: &AggregateResult) -> serde_json::Value {
        let failing: Vec<String> = result
            .outcomes
            .iter()
            .filter(|o| !o.issues.is_empty() || o.failure.is_some())
            .map(|o| o.check_name.clone())
            .collect();

        let body = result
            .outcomes
            .iter()
            .flat_map(|o| {
                o.issues.iter().map(move |i| {
                    format!(
                        "- **{}** [{}]: {}{}",
                        o.check_name,
                        i.severity,
                        i.message,
                        i.line.map(|l| format!(" (line {l})")).unwrap_or_default()
                    )
                })
            })
            .collect::<Vec<_>>()
            .join("\n");

        json!({
            "title": format!(
                "[doorman] {} in {}",
                result.overall,
                result.event.event.file_name()
            ),
            "body": body,
            "file": result.event.path().to_string_lossy(),
            "overall_status": result.overall,
            "checks": failing,
            "labels": self.labels,
        })
    }
}

#[async_trait]
impl ExternalAction for TicketWebhookAction {
    fn name(&self) -> &str {
        "ticket"
    }

    async fn apply(&self, result: &AggregateResult) -> anyhow::Result<String> {
        let payload = self.build_payload(result);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        // Take a reference from the response when the bridge returns
        // JSON with a url/reference field; fall back to the status
        let reference = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("url")
                .or_else(|| body.get("reference"))
                .or_else(|| body.get("id"))
                .map(|v| v.to_string().trim_matches('"').to_string()),
            Err(_) => None,
        };
        Ok(reference.unwrap_or_else(|| "created".to_string()))
    }
}
