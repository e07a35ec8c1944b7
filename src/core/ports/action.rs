//! External action contract (ticket/PR creation)

use async_trait::async_trait;

use crate::core::models::AggregateResult;

/// One remote side effect triggered by a result
///
/// `apply` must be safe to retry: the dispatcher retries transient
/// failures with backoff and guards the whole action behind a durable
/// idempotency record, so a crash between apply and record can cause a
/// second apply.
#[async_trait]
pub trait ExternalAction: Send + Sync {
    /// Action name used in logs and idempotency keys
    fn name(&self) -> &str;

    /// Perform the action, returning a reference to what was created
    /// (ticket URL, issue key, ...)
    async fn apply(&self, result: &AggregateResult) -> anyhow::Result<String>;
}
