//! `doorman watch` - the long-running engine

use std::path::PathBuf;

use log::info;

use doorman::engine::Engine;

use super::{build_stack, load_config};

/// Watch a tree until interrupted
pub fn execute(dir: Option<PathBuf>, config_path: Option<PathBuf>) -> anyhow::Result<i32> {
    let root = dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut config = load_config(config_path.as_deref(), &root)?;
    if let Some(dir) = dir {
        config.watch_dir = dir;
    }
    if !config.watch_dir.exists() {
        anyhow::bail!("watch directory does not exist: {}", config.watch_dir.display());
    }

    info!(
        "doorman v{} (debounce {}ms, {} concurrent checks)",
        doorman::VERSION,
        config.debounce_ms,
        config.max_concurrent_checks
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let stack = build_stack(&config, &root)?;
        let engine = Engine::new(stack.orchestrator, stack.dispatcher, stack.audit);
        engine.run(&config).await
    })?;
    Ok(0)
}
