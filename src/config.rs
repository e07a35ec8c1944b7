//! Configuration management
//!
//! Configuration lives in `doorman.toml` at the project root, with
//! environment-variable overrides applied after parsing. All
//! validation happens here or at registry build time, before the first
//! event is processed: a bad glob, an unknown check name or an
//! unparsable threshold is fatal at startup, never at runtime.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glob::Pattern;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors (always fatal, always at startup)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The named config file does not exist
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    /// The file could not be read
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// The file parsed but the values are unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level doorman configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DoormanConfig {
    /// Directory tree to watch
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,
    /// Watch subdirectories too
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Quiet period before a burst of events collapses into one run
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Paths to ignore: plain names match any path component,
    /// glob patterns match the path (or file name for `*.ext` forms)
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    /// Files larger than this are not checked
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Upper bound on paths waiting in the debouncer
    #[serde(default = "default_max_pending")]
    pub max_pending_changes: usize,
    /// Bound on buffered raw events between watcher and debouncer
    #[serde(default = "default_queue_size")]
    pub event_queue_size: usize,
    /// Global cap on concurrently running checks
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_checks: usize,
    /// Per-check timeout
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
    /// Suppress all fixes; checks degrade to reporting
    #[serde(default)]
    pub report_only: bool,
    /// Skip error fingerprints that were already investigated
    #[serde(default = "default_true")]
    pub track_fixed_errors: bool,
    /// Retention window for dedup and idempotency records
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Per-check settings, keyed by check name
    #[serde(default)]
    pub checks: BTreeMap<String, CheckConfig>,
    /// Notification channels
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// External actions
    #[serde(default)]
    pub actions: ActionsConfig,
    /// Reasoning service
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Settings for one check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Whether the check runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Extensions the check applies to (`".rs"` form); empty = all
    #[serde(default)]
    pub file_types: Vec<String>,
    /// Glob patterns the event path must match; empty = all
    #[serde(default)]
    pub paths: Vec<String>,
    /// Let a side-effecting check actually rewrite the file
    #[serde(default)]
    pub auto_fix: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self { enabled: true, file_types: Vec::new(), paths: Vec::new(), auto_fix: false }
    }
}

/// Notification channel settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Slack incoming-webhook channel
    #[serde(default)]
    pub slack: SlackConfig,
    /// Generic webhook channel
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Local JSON log channel
    #[serde(default)]
    pub file_log: FileLogConfig,
}

/// Slack notifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// Whether to send to Slack at all
    #[serde(default)]
    pub enabled: bool,
    /// Incoming webhook URL; supports `${ENV_VAR}` expansion
    #[serde(default)]
    pub webhook_url: String,
    /// Channel to post to
    #[serde(default = "default_slack_channel")]
    pub channel: String,
    /// Lowest overall status worth a message
    #[serde(default = "default_warning")]
    pub min_status: String,
    /// Payload verbosity: summary, detailed, full_transcript
    #[serde(default = "default_summary")]
    pub detail_level: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            channel: default_slack_channel(),
            min_status: default_warning(),
            detail_level: default_summary(),
        }
    }
}

/// Generic webhook notifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Whether to post results anywhere
    #[serde(default)]
    pub enabled: bool,
    /// Endpoint URL; supports `${ENV_VAR}` expansion
    #[serde(default)]
    pub url: String,
    /// HTTP method: POST or PUT
    #[serde(default = "default_post")]
    pub method: String,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Lowest overall status worth a delivery
    #[serde(default = "default_approved")]
    pub min_status: String,
    /// Payload verbosity
    #[serde(default = "default_summary")]
    pub detail_level: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            method: default_post(),
            headers: BTreeMap::new(),
            min_status: default_approved(),
            detail_level: default_summary(),
        }
    }
}

/// File-logger notifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLogConfig {
    /// Whether to keep a local log of results
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Rotation: daily, weekly, monthly, single
    #[serde(default = "default_daily")]
    pub rotation: String,
    /// Payload verbosity
    #[serde(default = "default_detailed")]
    pub detail_level: String,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self { enabled: true, rotation: default_daily(), detail_level: default_detailed() }
    }
}

/// External action settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionsConfig {
    /// Ticket creation via webhook
    #[serde(default)]
    pub ticket: TicketConfig,
}

/// Ticket action settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketConfig {
    /// Whether to create tickets at all
    #[serde(default)]
    pub enabled: bool,
    /// Endpoint to post ticket payloads to; supports `${ENV_VAR}`
    #[serde(default)]
    pub endpoint: String,
    /// Overall statuses that trigger a ticket
    #[serde(default = "default_ticket_trigger")]
    pub trigger: Vec<String>,
    /// Labels attached to created tickets
    #[serde(default)]
    pub labels: Vec<String>,
    /// Retry attempts for transient failures
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            trigger: default_ticket_trigger(),
            labels: Vec::new(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

/// Reasoning service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Whether checks may consult the service
    #[serde(default)]
    pub enabled: bool,
    /// Endpoint URL; supports `${ENV_VAR}` expansion
    #[serde(default)]
    pub endpoint: String,
    /// Environment variable holding the API token
    #[serde(default = "default_agent_token_env")]
    pub api_key_env: String,
    /// Model identifier passed through to the service
    #[serde(default)]
    pub model: Option<String>,
    /// Request timeout
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            api_key_env: default_agent_token_env(),
            model: None,
            timeout_secs: default_agent_timeout(),
        }
    }
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_true() -> bool {
    true
}
fn default_debounce_ms() -> u64 {
    2000
}
fn default_ignore() -> Vec<String> {
    vec![
        ".git".into(),
        ".doorman".into(),
        "node_modules".into(),
        "target".into(),
        "__pycache__".into(),
        "venv".into(),
        "*.tmp".into(),
        "*.swp".into(),
    ]
}
fn default_max_file_size() -> u64 {
    1_000_000
}
fn default_max_pending() -> usize {
    5000
}
fn default_queue_size() -> usize {
    1000
}
fn default_max_concurrent() -> usize {
    4
}
fn default_check_timeout() -> u64 {
    60
}
fn default_retention_days() -> u32 {
    30
}
fn default_slack_channel() -> String {
    "#doorman".into()
}
fn default_warning() -> String {
    "warning".into()
}
fn default_approved() -> String {
    "approved".into()
}
fn default_summary() -> String {
    "summary".into()
}
fn default_detailed() -> String {
    "detailed".into()
}
fn default_post() -> String {
    "POST".into()
}
fn default_daily() -> String {
    "daily".into()
}
fn default_ticket_trigger() -> Vec<String> {
    vec!["denied".into(), "warning".into()]
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_agent_token_env() -> String {
    "DOORMAN_AGENT_TOKEN".into()
}
fn default_agent_timeout() -> u64 {
    60
}

impl Default for DoormanConfig {
    fn default() -> Self {
        // A config file with no keys set
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl DoormanConfig {
    /// Load configuration from a file, apply env overrides and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.expand_env_vars();
        config.validate()?;
        info!("configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load `doorman.toml` under a root if present, defaults otherwise
    pub fn load_or_default(root: &Path) -> Result<Self, ConfigError> {
        let path = crate::paths::config_file(root);
        if path.exists() {
            Self::load(&path)
        } else {
            let mut config = Self::default();
            config.watch_dir = root.to_path_buf();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Debounce quiet period
    #[must_use]
    pub const fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Per-check timeout
    #[must_use]
    pub const fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    /// Settings for a check, defaults when not configured
    #[must_use]
    pub fn check(&self, name: &str) -> CheckConfig {
        self.checks.get(name).cloned().unwrap_or_default()
    }

    /// Compile the ignore list
    pub fn ignore_rules(&self) -> Result<IgnoreRules, ConfigError> {
        IgnoreRules::compile(&self.ignore)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("DOORMAN_WATCH_DIR") {
            info!("override: watch_dir = {dir}");
            self.watch_dir = PathBuf::from(dir);
        }
        if let Ok(ms) = std::env::var("DOORMAN_DEBOUNCE_MS") {
            if let Ok(ms) = ms.parse() {
                info!("override: debounce_ms = {ms}");
                self.debounce_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("DOORMAN_REPORT_ONLY") {
            self.report_only = v.eq_ignore_ascii_case("true") || v == "1";
            info!("override: report_only = {}", self.report_only);
        }
        if let Ok(v) = std::env::var("DOORMAN_TRACK_FIXED_ERRORS") {
            self.track_fixed_errors = v.eq_ignore_ascii_case("true") || v == "1";
            info!("override: track_fixed_errors = {}", self.track_fixed_errors);
        }
        if let Ok(size) = std::env::var("DOORMAN_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse() {
                info!("override: max_file_size = {size}");
                self.max_file_size = size;
            }
        }
        if let Ok(list) = std::env::var("DOORMAN_ENABLED_CHECKS") {
            let enabled: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();
            info!("override: enabled_checks = {enabled:?}");
            for (name, check) in &mut self.checks {
                check.enabled = enabled.iter().any(|e| e == name);
            }
            for name in enabled {
                self.checks.entry(name).or_default().enabled = true;
            }
        }
    }

    fn expand_env_vars(&mut self) {
        for value in [
            &mut self.notifications.slack.webhook_url,
            &mut self.notifications.webhook.url,
            &mut self.actions.ticket.endpoint,
            &mut self.agent.endpoint,
        ] {
            *value = expand_env(value);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.watch_dir.exists() {
            return Err(ConfigError::Invalid(format!(
                "watch directory does not exist: {}",
                self.watch_dir.display()
            )));
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::Invalid("debounce_ms must be greater than zero".into()));
        }
        if self.max_concurrent_checks == 0 {
            return Err(ConfigError::Invalid("max_concurrent_checks must be at least 1".into()));
        }
        self.ignore_rules()?;

        // Per-check globs
        for (name, check) in &self.checks {
            for pattern in &check.paths {
                Pattern::new(pattern).map_err(|err| {
                    ConfigError::Invalid(format!("check '{name}' has invalid glob '{pattern}': {err}"))
                })?;
            }
        }

        // Thresholds and detail levels must parse
        use crate::core::models::OverallStatus;
        use crate::core::ports::DetailLevel;
        for (what, value) in [
            ("notifications.slack.min_status", &self.notifications.slack.min_status),
            ("notifications.webhook.min_status", &self.notifications.webhook.min_status),
        ] {
            value.parse::<OverallStatus>().map_err(|err| {
                ConfigError::Invalid(format!("{what}: {err}"))
            })?;
        }
        for (what, value) in [
            ("notifications.slack.detail_level", &self.notifications.slack.detail_level),
            ("notifications.webhook.detail_level", &self.notifications.webhook.detail_level),
            ("notifications.file_log.detail_level", &self.notifications.file_log.detail_level),
        ] {
            value.parse::<DetailLevel>().map_err(|err| {
                ConfigError::Invalid(format!("{what}: {err}"))
            })?;
        }
        for status in &self.actions.ticket.trigger {
            status.parse::<OverallStatus>().map_err(|err| {
                ConfigError::Invalid(format!("actions.ticket.trigger: {err}"))
            })?;
        }
        if !matches!(
            self.notifications.file_log.rotation.as_str(),
            "daily" | "weekly" | "monthly" | "single"
        ) {
            return Err(ConfigError::Invalid(format!(
                "notifications.file_log.rotation: invalid rotation '{}'",
                self.notifications.file_log.rotation
            )));
        }
        Ok(())
    }
}

/// Expand a `${VAR}` reference against the environment
///
/// Unset variables leave the literal text in place, matching the
/// behavior users expect from shell-style templates.
fn expand_env(value: &str) -> String {
    if let Some(name) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        std::env::var(name).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

/// Compiled ignore rules applied at the watcher boundary
///
/// A plain rule (no glob metacharacters) matches when it equals any
/// path component. A glob rule without a separator matches the file
/// name; with a separator it matches the whole path.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    components: Vec<String>,
    name_globs: Vec<Pattern>,
    path_globs: Vec<Pattern>,
}

impl IgnoreRules {
    /// Compile a rule list; invalid globs are configuration errors
    pub fn compile(rules: &[String]) -> Result<Self, ConfigError> {
        let mut components = Vec::new();
        let mut name_globs = Vec::new();
        let mut path_globs = Vec::new();
        for rule in rules {
            if rule.contains(['*', '?', '[']) {
                let pattern = Pattern::new(rule).map_err(|err| {
                    ConfigError::Invalid(format!("invalid ignore pattern '{rule}': {err}"))
                })?;
                if rule.contains('/') {
                    path_globs.push(pattern);
                } else {
                    name_globs.push(pattern);
                }
            } else {
                components.push(rule.clone());
            }
        }
        Ok(Self { components, name_globs, path_globs })
    }

    /// Whether a path should be ignored
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        if path
            .components()
            .any(|c| self.components.iter().any(|ig| c.as_os_str() == ig.as_str()))
        {
            return true;
        }
        if let Some(name) = path.file_name() {
            let name = name.to_string_lossy();
            if self.name_globs.iter().any(|g| g.matches(&name)) {
                return true;
            }
        }
        let full = path.to_string_lossy();
        self.path_globs.iter().any(|g| g.matches(&full))
    }
}

#[cfg(test)]
mod tests {
    // Env mutation is unsafe in edition 2024; confined to serial tests
    #![allow(unsafe_code)]

    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = DoormanConfig::default();
        assert_eq!(config.debounce_ms, 2000);
        assert!(config.recursive);
        assert!(config.track_fixed_errors);
        assert!(!config.report_only);
        assert_eq!(config.max_concurrent_checks, 4);
        assert!(config.notifications.file_log.enabled);
        assert!(!config.notifications.slack.enabled);
    }

    #[test]
    fn test_parse_sample() {
        let toml = r#"
            watch_dir = "."
            debounce_ms = 500

            [checks.secret_scan]
            enabled = true
            file_types = [".py", ".rs"]

            [notifications.slack]
            enabled = true
            webhook_url = "https://hooks.slack.example/x"
            min_status = "denied"
        "#;
        let config: DoormanConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.check("secret_scan").file_types, vec![".py", ".rs"]);
        assert_eq!(config.notifications.slack.min_status, "denied");
        // Unconfigured checks fall back to defaults
        assert!(config.check("line_hygiene").enabled);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<DoormanConfig>("watcher_dir = \".\"").is_err());
    }

    #[test]
    fn test_invalid_min_status_rejected() {
        let mut config = DoormanConfig::default();
        config.notifications.slack.min_status = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_ignore_glob_rejected() {
        let mut config = DoormanConfig::default();
        config.ignore.push("src/[".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_check_glob_rejected() {
        let mut config = DoormanConfig::default();
        config.checks.insert(
            "secret_scan".into(),
            CheckConfig { paths: vec!["src/[".into()], ..CheckConfig::default() },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ignore_rules() {
        let rules = IgnoreRules::compile(&default_ignore()).unwrap();
        assert!(rules.matches(Path::new("proj/.git/objects/ab")));
        assert!(rules.matches(Path::new("proj/node_modules/left-pad/index.js")));
        assert!(rules.matches(Path::new("src/.main.rs.tmp")));
        assert!(rules.matches(Path::new("deep/dir/file.swp")));
        assert!(!rules.matches(Path::new("src/main.rs")));
    }

    #[test]
    fn test_ignore_component_is_exact() {
        let rules = IgnoreRules::compile(&[".git".into()]).unwrap();
        assert!(rules.matches(Path::new("a/.git/config")));
        assert!(!rules.matches(Path::new("a/gitters/file")));
    }

    #[test]
    #[serial]
    fn test_env_override_report_only() {
        // SAFETY: serial test, no concurrent env access
        unsafe { std::env::set_var("DOORMAN_REPORT_ONLY", "true") };
        let mut config = DoormanConfig::default();
        config.apply_env_overrides();
        unsafe { std::env::remove_var("DOORMAN_REPORT_ONLY") };
        assert!(config.report_only);
    }

    #[test]
    #[serial]
    fn test_env_override_enabled_checks() {
        unsafe { std::env::set_var("DOORMAN_ENABLED_CHECKS", "secret_scan,line_hygiene") };
        let mut config = DoormanConfig::default();
        config.checks.insert("data_format".into(), CheckConfig::default());
        config.apply_env_overrides();
        unsafe { std::env::remove_var("DOORMAN_ENABLED_CHECKS") };

        assert!(config.check("secret_scan").enabled);
        assert!(config.check("line_hygiene").enabled);
        assert!(!config.check("data_format").enabled);
    }

    #[test]
    #[serial]
    fn test_env_expansion() {
        unsafe { std::env::set_var("DOORMAN_TEST_HOOK", "https://hooks.example/abc") };
        assert_eq!(expand_env("${DOORMAN_TEST_HOOK}"), "https://hooks.example/abc");
        assert_eq!(expand_env("plain"), "plain");
        assert_eq!(expand_env("${DOORMAN_UNSET_VAR}"), "${DOORMAN_UNSET_VAR}");
        unsafe { std::env::remove_var("DOORMAN_TEST_HOOK") };
    }
}
