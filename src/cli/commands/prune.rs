//! `doorman prune` - drop old dedup and idempotency records

use std::path::Path;

use chrono::{Duration, Utc};

use doorman::config::DoormanConfig;
use doorman::paths;
use doorman::storage::{DispatchLedger, ErrorDedupStore};

/// Prune both durable key sets
pub fn execute(older_than_days: Option<u32>) -> anyhow::Result<i32> {
    let root = Path::new(".");
    let config = DoormanConfig::load_or_default(root)?;
    let days = older_than_days.unwrap_or(config.retention_days);
    let cutoff = Utc::now() - Duration::days(i64::from(days));

    let dedup = ErrorDedupStore::open(paths::dedup_file(root), true)?;
    let ledger = DispatchLedger::open(paths::ledger_file(root))?;

    let dedup_removed = dedup.prune(cutoff)?;
    let ledger_removed = ledger.prune(cutoff)?;

    println!(
        "pruned {dedup_removed} investigated error(s) and {ledger_removed} dispatch record(s) older than {days}d"
    );
    Ok(0)
}
