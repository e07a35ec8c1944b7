//! Command implementations

pub mod audit;
pub mod check;
pub mod init;
pub mod prune;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use doorman::agent::HttpAgentService;
use doorman::checks::build_registry;
use doorman::config::DoormanConfig;
use doorman::core::ports::AgentService;
use doorman::dispatch::{Dispatcher, build_dispatcher};
use doorman::engine::{EngineOptions, Orchestrator};
use doorman::paths;
use doorman::storage::{DispatchLedger, ErrorDedupStore, FileAuditSink};

/// Everything a command needs to process events
pub(crate) struct Stack {
    pub orchestrator: Arc<Orchestrator>,
    pub dispatcher: Arc<Dispatcher>,
    pub audit: Arc<FileAuditSink>,
}

/// Assemble stores, registry, orchestrator and dispatcher for a root
pub(crate) fn build_stack(config: &DoormanConfig, root: &Path) -> anyhow::Result<Stack> {
    std::fs::create_dir_all(paths::state_dir(root))
        .context("could not create .doorman state directory")?;

    let dedup = Arc::new(
        ErrorDedupStore::open(paths::dedup_file(root), config.track_fixed_errors)
            .context("could not open error dedup store")?,
    );
    let ledger = Arc::new(
        DispatchLedger::open(paths::ledger_file(root))
            .context("could not open dispatch ledger")?,
    );
    let agent = HttpAgentService::from_config(&config.agent)?
        .map(|service| Arc::new(service) as Arc<dyn AgentService>);

    let registry = build_registry(config, dedup, agent)?;
    let audit = Arc::new(FileAuditSink::new(paths::audit_dir(root))?);
    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        audit.clone(),
        EngineOptions::from(config),
    ));
    let dispatcher = Arc::new(build_dispatcher(config, root, ledger)?);

    Ok(Stack { orchestrator, dispatcher, audit })
}

/// Load config for a command, preferring an explicit `--config` path
pub(crate) fn load_config(
    explicit: Option<&Path>,
    root: &Path,
) -> anyhow::Result<DoormanConfig> {
    let config = match explicit {
        Some(path) => DoormanConfig::load(path)?,
        None => DoormanConfig::load_or_default(root)?,
    };
    Ok(config)
}
