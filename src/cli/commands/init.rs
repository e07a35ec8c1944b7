//! `doorman init` - write a starter configuration

use std::fs;
use std::path::Path;

use doorman::paths;

const DEFAULT_CONFIG: &str = r##"# doorman configuration
# Quality control at the door: every file change below watch_dir runs
# through the enabled checks.

watch_dir = "."
recursive = true

# Quiet period: a burst of saves collapses into one run
debounce_ms = 2000

# Plain names match any path component; globs match file names/paths
ignore = [".git", ".doorman", "node_modules", "target", "__pycache__", "venv", "*.tmp", "*.swp"]

max_file_size = 1000000
max_concurrent_checks = 4
check_timeout_secs = 60

# Set true to suppress every fix and only report
report_only = false

# Skip error fingerprints that were already investigated
track_fixed_errors = true
retention_days = 30

[checks.line_hygiene]
enabled = true
auto_fix = true

[checks.data_format]
enabled = true
file_types = [".json", ".toml"]

[checks.license_header]
enabled = false

[checks.secret_scan]
enabled = true

[checks.log_investigator]
enabled = true
file_types = [".log"]

[notifications.slack]
enabled = false
webhook_url = "${SLACK_WEBHOOK_URL}"
channel = "#doorman"
min_status = "warning"
detail_level = "summary"

[notifications.webhook]
enabled = false
url = ""
method = "POST"
min_status = "approved"
detail_level = "detailed"

[notifications.file_log]
enabled = true
rotation = "daily"
detail_level = "detailed"

[actions.ticket]
enabled = false
endpoint = "${DOORMAN_TICKET_ENDPOINT}"
trigger = ["denied", "warning"]
labels = ["doorman", "automated"]

[agent]
enabled = false
endpoint = ""
api_key_env = "DOORMAN_AGENT_TOKEN"
timeout_secs = 60
"##;

/// Write `doorman.toml` and the state directory
pub fn execute(force: bool) -> anyhow::Result<i32> {
    let root = Path::new(".");
    let config_path = paths::config_file(root);

    if config_path.exists() && !force {
        println!("doorman.toml already exists (use --force to overwrite)");
        return Ok(1);
    }

    fs::write(&config_path, DEFAULT_CONFIG)?;
    fs::create_dir_all(paths::state_dir(root))?;
    println!("wrote {}", config_path.display());
    println!("hint: add .doorman/ to your .gitignore");
    Ok(0)
}
