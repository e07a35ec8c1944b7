//! Result dispatch
//!
//! Fans an aggregate result out to every enabled notifier
//! (best-effort, independent failures) and evaluates external-action
//! rules behind a durable idempotency ledger.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, error, info, warn};

use crate::core::models::{AggregateResult, CheckStatus, OverallStatus};
use crate::core::ports::{DetailLevel, ExternalAction, Notifier};
use crate::storage::{DispatchLedger, action_key};

use super::retry::{RetryPolicy, with_backoff};

/// One notifier with its delivery settings
pub struct NotifierEntry {
    /// The channel itself
    pub notifier: Arc<dyn Notifier>,
    /// Verbosity for this channel
    pub detail: DetailLevel,
    /// Results below this status are not delivered
    pub min_status: OverallStatus,
}

/// One external action with its trigger rule
pub struct ActionRule {
    /// The action itself
    pub action: Arc<dyn ExternalAction>,
    /// Overall statuses that trigger the action
    pub trigger: Vec<OverallStatus>,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

/// Fans results out to notifiers and idempotent external actions
pub struct Dispatcher {
    notifiers: Vec<NotifierEntry>,
    actions: Vec<ActionRule>,
    ledger: Arc<DispatchLedger>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("notifiers", &self.notifiers.iter().map(|n| n.notifier.name()).collect::<Vec<_>>())
            .field("actions", &self.actions.iter().map(|a| a.action.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(
        notifiers: Vec<NotifierEntry>,
        actions: Vec<ActionRule>,
        ledger: Arc<DispatchLedger>,
    ) -> Self {
        Self { notifiers, actions, ledger }
    }

    /// Dispatch one result
    ///
    /// Never fails: every notifier and action failure is logged and
    /// contained. Dispatching the same unchanged result twice performs
    /// each external action at most once.
    pub async fn dispatch(&self, result: &AggregateResult) {
        let sends = self
            .notifiers
            .iter()
            .filter(|entry| result.overall.rank() >= entry.min_status.rank())
            .map(|entry| async move {
                if let Err(err) = entry.notifier.send(result, entry.detail).await {
                    error!("notifier {} failed: {err}", entry.notifier.name());
                } else {
                    debug!("notifier {} delivered", entry.notifier.name());
                }
            });
        join_all(sends).await;

        for rule in &self.actions {
            if !rule.trigger.contains(&result.overall) {
                continue;
            }
            self.apply_action(rule, result).await;
        }
    }

    /// Apply one action, guarded by the idempotency ledger
    ///
    /// The unit of idempotency is (path, check, content fingerprint):
    /// the action runs once when any triggering check has no ledger
    /// entry yet, and every triggering check's key is recorded on
    /// success.
    async fn apply_action(&self, rule: &ActionRule, result: &AggregateResult) {
        let fingerprint = result.event.event.fingerprint.as_deref();
        let keys: Vec<String> = result
            .outcomes
            .iter()
            .filter(|o| matches!(o.status, CheckStatus::Denied | CheckStatus::Warning))
            .map(|o| action_key(result.event.path(), &o.check_name, fingerprint))
            .collect();

        if keys.is_empty() {
            return;
        }
        let unseen: Vec<&String> = keys.iter().filter(|k| !self.ledger.seen(k)).collect();
        if unseen.is_empty() {
            debug!("action {} already taken for this result", rule.action.name());
            return;
        }

        let name = rule.action.name();
        match with_backoff(rule.retry, name, || rule.action.apply(result)).await {
            Ok(reference) => {
                info!("action {name} created {reference}");
                for key in unseen {
                    if let Err(err) = self.ledger.record(key, Utc::now()) {
                        warn!("could not record action key: {err}");
                    }
                }
            }
            Err(err) => {
                // Not recorded: the action stays eligible for retry on
                // the next dispatch of this result
                error!("action {name} failed after retries: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{
        ChangeEvent, ChangeKind, CheckOutcome, DebouncedEvent, Issue, IssueSeverity,
    };
    use crate::core::services::build_result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingAction {
        applies: AtomicUsize,
    }

    #[async_trait]
    impl ExternalAction for CountingAction {
        fn name(&self) -> &str {
            "counting"
        }

        async fn apply(&self, _result: &AggregateResult) -> anyhow::Result<String> {
            self.applies.fetch_add(1, Ordering::SeqCst);
            Ok("TICKET-1".to_string())
        }
    }

    struct CountingNotifier {
        sends: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send(&self, _result: &AggregateResult, _detail: DetailLevel) -> anyhow::Result<()> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail { anyhow::bail!("sink down") } else { Ok(()) }
        }
    }

    fn denied_result() -> AggregateResult {
        let mut event = ChangeEvent::new("src/app.py", ChangeKind::Modified);
        event.fingerprint = Some("abc123".to_string());
        let outcome = CheckOutcome::new(
            "secret_scan",
            CheckStatus::Denied,
            vec![Issue::new("key", IssueSeverity::Critical)],
        );
        build_result(DebouncedEvent::single(event), vec![outcome])
    }

    fn ledger() -> (tempfile::TempDir, Arc<DispatchLedger>) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DispatchLedger::open(dir.path().join("dispatched.json")).unwrap();
        (dir, Arc::new(ledger))
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy { attempts: 1, base_delay: Duration::from_millis(1) }
    }

    #[tokio::test]
    async fn test_double_dispatch_applies_action_once() {
        let (_dir, ledger) = ledger();
        let action = Arc::new(CountingAction { applies: AtomicUsize::new(0) });
        let dispatcher = Dispatcher::new(
            Vec::new(),
            vec![ActionRule {
                action: action.clone(),
                trigger: vec![OverallStatus::Denied, OverallStatus::Warning],
                retry: quick_retry(),
            }],
            ledger,
        );

        let result = denied_result();
        dispatcher.dispatch(&result).await;
        dispatcher.dispatch(&result).await;

        assert_eq!(action.applies.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_changed_fingerprint_triggers_again() {
        let (_dir, ledger) = ledger();
        let action = Arc::new(CountingAction { applies: AtomicUsize::new(0) });
        let dispatcher = Dispatcher::new(
            Vec::new(),
            vec![ActionRule {
                action: action.clone(),
                trigger: vec![OverallStatus::Denied],
                retry: quick_retry(),
            }],
            ledger,
        );

        dispatcher.dispatch(&denied_result()).await;
        let mut changed = denied_result();
        changed.event.event.fingerprint = Some("def456".to_string());
        dispatcher.dispatch(&changed).await;

        assert_eq!(action.applies.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_untriggered_status_skips_action() {
        let (_dir, ledger) = ledger();
        let action = Arc::new(CountingAction { applies: AtomicUsize::new(0) });
        let dispatcher = Dispatcher::new(
            Vec::new(),
            vec![ActionRule {
                action: action.clone(),
                trigger: vec![OverallStatus::Denied],
                retry: quick_retry(),
            }],
            ledger,
        );

        let event = DebouncedEvent::single(ChangeEvent::new("a.rs", ChangeKind::Modified));
        let approved = build_result(event, vec![CheckOutcome::approved("line_hygiene")]);
        dispatcher.dispatch(&approved).await;

        assert_eq!(action.applies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_block_others() {
        let (_dir, ledger) = ledger();
        let broken = Arc::new(CountingNotifier { sends: AtomicUsize::new(0), fail: true });
        let healthy = Arc::new(CountingNotifier { sends: AtomicUsize::new(0), fail: false });
        let dispatcher = Dispatcher::new(
            vec![
                NotifierEntry {
                    notifier: broken.clone(),
                    detail: DetailLevel::Summary,
                    min_status: OverallStatus::Approved,
                },
                NotifierEntry {
                    notifier: healthy.clone(),
                    detail: DetailLevel::Summary,
                    min_status: OverallStatus::Approved,
                },
            ],
            Vec::new(),
            ledger,
        );

        dispatcher.dispatch(&denied_result()).await;
        assert_eq!(broken.sends.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_min_status_threshold() {
        let (_dir, ledger) = ledger();
        let quiet = Arc::new(CountingNotifier { sends: AtomicUsize::new(0), fail: false });
        let dispatcher = Dispatcher::new(
            vec![NotifierEntry {
                notifier: quiet.clone(),
                detail: DetailLevel::Summary,
                min_status: OverallStatus::Denied,
            }],
            Vec::new(),
            ledger,
        );

        let event = DebouncedEvent::single(ChangeEvent::new("a.rs", ChangeKind::Modified));
        let approved = build_result(event, vec![CheckOutcome::approved("line_hygiene")]);
        dispatcher.dispatch(&approved).await;
        assert_eq!(quiet.sends.load(Ordering::SeqCst), 0);

        dispatcher.dispatch(&denied_result()).await;
        assert_eq!(quiet.sends.load(Ordering::SeqCst), 1);
    }
}
