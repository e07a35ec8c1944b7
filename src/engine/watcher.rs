//! Filesystem watcher bridge
//!
//! Wraps `notify`'s platform watcher and forwards interesting events
//! into the debouncer. The watcher delivers at-least-once with no
//! cross-path ordering guarantee; everything downstream is built to
//! tolerate that.

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, trace, warn};
use notify::event::{EventKind, ModifyKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::IgnoreRules;
use crate::core::models::{ChangeEvent, ChangeKind};

use super::debouncer::Debouncer;

/// Keeps the platform watcher alive for the engine's lifetime
#[derive(Debug)]
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
}

/// Map a notify event to our change kind, dropping uninteresting kinds
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

fn forward(path: PathBuf, kind: ChangeKind, ignore: &IgnoreRules, debouncer: &Debouncer) {
    if ignore.matches(&path) {
        trace!("ignored: {}", path.display());
        return;
    }
    // Directory events carry no checkable content
    if kind != ChangeKind::Deleted && path.is_dir() {
        return;
    }
    debouncer.observe_blocking(ChangeEvent::new(path, kind));
}

/// Start watching `root` and feed events into the debouncer
///
/// The returned handle must be kept alive; dropping it stops the
/// watcher. The notify callback runs on its own thread and hands
/// events over with a blocking send, so watcher backpressure follows
/// the debouncer channel's bound.
pub fn spawn_watcher(
    root: &Path,
    recursive: bool,
    ignore: IgnoreRules,
    debouncer: Debouncer,
) -> anyhow::Result<WatchHandle> {
    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                let Some(kind) = change_kind(&event.kind) else { return };
                for path in event.paths {
                    forward(path, kind, &ignore, &debouncer);
                }
            }
            Err(err) => warn!("watcher error: {err}"),
        },
        notify::Config::default(),
    )
    .context("could not create filesystem watcher")?;

    let mode = if recursive { RecursiveMode::Recursive } else { RecursiveMode::NonRecursive };
    watcher
        .watch(root, mode)
        .with_context(|| format!("could not watch {}", root.display()))?;
    debug!("watching {} ({mode:?})", root.display());

    Ok(WatchHandle { _watcher: watcher })
}
