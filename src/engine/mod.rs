//! The event orchestration engine
//!
//! Data flow: filesystem notification -> [`watcher`] -> [`debouncer`]
//! -> [`orchestrator`] (per-path lock, concurrent checks, fix fold)
//! -> audit log -> dispatcher.
//!
//! Ordering guarantees: events for one path are processed in arrival
//! order and never concurrently; events for different paths may
//! complete in any order; outcomes inside one run are collected in
//! check-registration order.

pub mod debouncer;
pub mod locks;
pub mod orchestrator;
pub mod watcher;

pub use debouncer::Debouncer;
pub use locks::PathLocks;
pub use orchestrator::{EngineOptions, Orchestrator};
pub use watcher::{WatchHandle, spawn_watcher};

use std::sync::Arc;

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::DoormanConfig;
use crate::core::ports::AuditSink;
use crate::dispatch::Dispatcher;

/// The assembled watch-mode engine
pub struct Engine {
    orchestrator: Arc<Orchestrator>,
    dispatcher: Arc<Dispatcher>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").field("orchestrator", &self.orchestrator).finish()
    }
}

impl Engine {
    /// Assemble the engine from its parts
    #[must_use]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        dispatcher: Arc<Dispatcher>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { orchestrator, dispatcher, audit }
    }

    /// Watch until ctrl-c
    ///
    /// On shutdown: intake stops, pending debounces flush, in-flight
    /// runs finish (fix application is never torn down mid-write) and
    /// the audit log is flushed before returning.
    pub async fn run(&self, config: &DoormanConfig) -> anyhow::Result<()> {
        let ignore = config.ignore_rules()?;
        let (out_tx, mut out_rx) = mpsc::channel(config.event_queue_size.max(1));
        let debouncer = Debouncer::spawn(
            config.debounce_delay(),
            config.event_queue_size.max(1),
            config.max_pending_changes,
            out_tx,
        );
        let watch =
            spawn_watcher(&config.watch_dir, config.recursive, ignore, debouncer.clone())?;

        info!("doorman on duty: watching {}", config.watch_dir.display());

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let mut runs: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested; draining in-flight runs");
                    break;
                }
                received = out_rx.recv() => {
                    let Some(debounced) = received else { break };
                    let orchestrator = self.orchestrator.clone();
                    let dispatcher = self.dispatcher.clone();
                    runs.spawn(async move {
                        let result = orchestrator.handle(debounced).await;
                        dispatcher.dispatch(&result).await;
                    });
                    // Reap already-finished runs so the set stays small
                    while runs.try_join_next().is_some() {}
                }
            }
        }

        // Stop intake, then let every started run finish cleanly
        drop(watch);
        drop(debouncer);
        while let Some(joined) = runs.join_next().await {
            if let Err(err) = joined {
                warn!("run task failed: {err}");
            }
        }
        self.audit.flush().await?;
        info!("doorman stopped");
        Ok(())
    }
}
