//! Generic webhook notifier
//!
//! Posts the formatted payload to any HTTP endpoint with configurable
//! method and headers.

use std::collections::BTreeMap;

use anyhow::bail;
use async_trait::async_trait;
use chrono::Utc;

use crate::core::models::AggregateResult;
use crate::core::ports::{DetailLevel, Notifier};

use super::formatter;

/// Webhook notifier for arbitrary endpoints
#[derive(Debug)]
pub struct WebhookNotifier {
    url: String,
    method: String,
    headers: BTreeMap<String, String>,
    include_timestamp: bool,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier; `method` is POST or PUT
    #[must_use]
    pub fn new(url: String, method: String, headers: BTreeMap<String, String>) -> Self {
        Self {
            url,
            method: method.to_uppercase(),
            headers,
            include_timestamp: true,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, result: &AggregateResult, detail: DetailLevel) -> anyhow::Result<()> {
        let mut payload = formatter::format(result, detail);
        if self.include_timestamp {
            payload["sent_at"] = serde_json::json!(Utc::now().to_rfc3339());
        }

        let mut request = match self.method.as_str() {
            "POST" => self.client.post(&self.url),
            "PUT" => self.client.put(&self.url),
            other => bail!("unsupported HTTP method: {other}"),
        };
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        request.json(&payload).send().await?.error_for_status()?;
        Ok(())
    }
}
