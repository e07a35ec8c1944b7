//! `doorman check` - one-shot run over explicit files

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use doorman::config::{DoormanConfig, IgnoreRules};
use doorman::core::models::{AggregateResult, ChangeEvent, ChangeKind, DebouncedEvent, OverallStatus};
use doorman::output::{self, OutputMode};

use super::{build_stack, load_config};

/// Expand files and directories into a checkable file list
fn collect_files(paths: &[PathBuf], ignore: &IgnoreRules) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| !ignore.matches(e.path()))
            .filter_map(Result::ok)
        {
            if entry.file_type().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files
}

/// Run every check once over the given paths
pub fn execute(
    paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    no_fix: bool,
    mode: OutputMode,
) -> anyhow::Result<i32> {
    let root = Path::new(".");
    let mut config: DoormanConfig = load_config(config_path.as_deref(), root)?;
    if no_fix {
        config.report_only = true;
    }

    let targets = if paths.is_empty() { vec![config.watch_dir.clone()] } else { paths };
    let files = collect_files(&targets, &config.ignore_rules()?);
    if files.is_empty() {
        println!("nothing to check");
        return Ok(0);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let results: Vec<AggregateResult> = runtime.block_on(async {
        let stack = build_stack(&config, root)?;
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let event = DebouncedEvent::single(ChangeEvent::new(file, ChangeKind::Modified));
            let result = stack.orchestrator.handle(event).await;
            stack.dispatcher.dispatch(&result).await;
            print!("{}", output::render(&result, mode)?);
            results.push(result);
        }
        anyhow::Ok(results)
    })?;

    if mode == OutputMode::Human {
        print!("{}", output::render_summary(&results));
    }

    let denied = results.iter().any(|r| r.overall == OverallStatus::Denied);
    Ok(i32::from(denied))
}
