//! Result dispatch: notifiers, external actions, payload formatting
//!
//! Everything here is downstream of the orchestrator: it consumes
//! read-only `AggregateResult`s and never feeds back into a run.

pub mod dispatcher;
pub mod file_log;
pub mod formatter;
pub mod retry;
pub mod slack;
pub mod ticket;
pub mod webhook;

pub use dispatcher::{ActionRule, Dispatcher, NotifierEntry};
pub use file_log::{FileLogNotifier, Rotation};
pub use retry::{RetryPolicy, with_backoff};
pub use slack::SlackNotifier;
pub use ticket::TicketWebhookAction;
pub use webhook::WebhookNotifier;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::config::DoormanConfig;
use crate::core::models::OverallStatus;
use crate::core::ports::DetailLevel;
use crate::storage::DispatchLedger;

/// Build the dispatcher from configuration
///
/// Enabled channels missing their endpoint are a configuration error;
/// validation here runs at startup, before the first event.
pub fn build_dispatcher(
    config: &DoormanConfig,
    root: &Path,
    ledger: Arc<DispatchLedger>,
) -> anyhow::Result<Dispatcher> {
    let mut notifiers: Vec<NotifierEntry> = Vec::new();

    let slack = &config.notifications.slack;
    if slack.enabled {
        if slack.webhook_url.is_empty() {
            bail!("notifications.slack is enabled but webhook_url is not set");
        }
        notifiers.push(NotifierEntry {
            notifier: Arc::new(SlackNotifier::new(slack.webhook_url.clone(), slack.channel.clone())),
            detail: parse_detail(&slack.detail_level)?,
            min_status: parse_status(&slack.min_status)?,
        });
    }

    let webhook = &config.notifications.webhook;
    if webhook.enabled {
        if webhook.url.is_empty() {
            bail!("notifications.webhook is enabled but url is not set");
        }
        notifiers.push(NotifierEntry {
            notifier: Arc::new(WebhookNotifier::new(
                webhook.url.clone(),
                webhook.method.clone(),
                webhook.headers.clone(),
            )),
            detail: parse_detail(&webhook.detail_level)?,
            min_status: parse_status(&webhook.min_status)?,
        });
    }

    let file_log = &config.notifications.file_log;
    if file_log.enabled {
        let rotation = file_log
            .rotation
            .parse::<Rotation>()
            .map_err(|err| anyhow::anyhow!("notifications.file_log.rotation: {err}"))?;
        notifiers.push(NotifierEntry {
            notifier: Arc::new(
                FileLogNotifier::new(crate::paths::logs_dir(root), rotation)
                    .context("could not create log directory")?,
            ),
            detail: parse_detail(&file_log.detail_level)?,
            min_status: OverallStatus::Approved,
        });
    }

    let mut actions: Vec<ActionRule> = Vec::new();
    let ticket = &config.actions.ticket;
    if ticket.enabled {
        if ticket.endpoint.is_empty() {
            bail!("actions.ticket is enabled but endpoint is not set");
        }
        let trigger = ticket
            .trigger
            .iter()
            .map(|s| parse_status(s))
            .collect::<anyhow::Result<Vec<_>>>()?;
        actions.push(ActionRule {
            action: Arc::new(TicketWebhookAction::new(
                ticket.endpoint.clone(),
                ticket.labels.clone(),
            )),
            trigger,
            retry: RetryPolicy {
                attempts: ticket.retry_attempts.max(1),
                base_delay: Duration::from_millis(500),
            },
        });
    }

    Ok(Dispatcher::new(notifiers, actions, ledger))
}

fn parse_status(value: &str) -> anyhow::Result<OverallStatus> {
    value.parse::<OverallStatus>().map_err(|err| anyhow::anyhow!(err))
}

fn parse_detail(value: &str) -> anyhow::Result<DetailLevel> {
    value.parse::<DetailLevel>().map_err(|err| anyhow::anyhow!(err))
}
