//! HTTP reasoning-service client
//!
//! The concrete `AgentService` implementation: one JSON POST per
//! query against a configured endpoint, with a request timeout. The
//! endpoint is expected to be an inference gateway that accepts
//! `{prompt, model}` and answers with `{output}` (or plain text).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use serde_json::json;

use crate::config::AgentConfig;
use crate::core::ports::AgentService;

/// Reqwest-backed reasoning client
#[derive(Debug)]
pub struct HttpAgentService {
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
    client: reqwest::Client,
}

impl HttpAgentService {
    /// Build the client from configuration
    ///
    /// Returns `None` when the agent is disabled or has no endpoint;
    /// checks then fall back to local triage.
    pub fn from_config(config: &AgentConfig) -> anyhow::Result<Option<Self>> {
        if !config.enabled || config.endpoint.is_empty() {
            return Ok(None);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("could not build agent HTTP client")?;
        Ok(Some(Self {
            endpoint: config.endpoint.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
            model: config.model.clone(),
            client,
        }))
    }
}

#[async_trait]
impl AgentService for HttpAgentService {
    async fn query(&self, prompt: &str) -> anyhow::Result<String> {
        debug!("agent query ({} chars)", prompt.len());
        let mut request = self.client.post(&self.endpoint).json(&json!({
            "prompt": prompt,
            "model": self.model,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.text().await?;

        // Gateways answer JSON or plain text; take what we get
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(output) = value.get("output").and_then(|v| v.as_str()) {
                return Ok(output.to_string());
            }
            if let Some(text) = value.get("text").and_then(|v| v.as_str()) {
                return Ok(text.to_string());
            }
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_yields_none() {
        let config = AgentConfig::default();
        assert!(HttpAgentService::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_enabled_without_endpoint_yields_none() {
        let config = AgentConfig { enabled: true, ..AgentConfig::default() };
        assert!(HttpAgentService::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_enabled_with_endpoint_builds() {
        let config = AgentConfig {
            enabled: true,
            endpoint: "https://gateway.invalid/v1/complete".into(),
            ..AgentConfig::default()
        };
        assert!(HttpAgentService::from_config(&config).unwrap().is_some());
    }
}
