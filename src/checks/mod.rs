//! Built-in checks and the check registry
//!
//! The registry is a lookup table built once at startup from
//! configuration. Registration order is fixed and doubles as outcome
//! collection order and fix-fold order, so runs are deterministic for
//! a given configuration. An unknown check name in the config is fatal
//! at startup.

mod data_format;
mod license_header;
mod line_hygiene;
mod log_investigator;
mod secret_scan;

pub use data_format::DataFormat;
pub use license_header::LicenseHeader;
pub use line_hygiene::LineHygiene;
pub use log_investigator::LogInvestigator;
pub use secret_scan::SecretScan;

use std::sync::Arc;

use anyhow::bail;
use log::info;

use crate::config::{CheckConfig, DoormanConfig};
use crate::core::models::ChangeEvent;
use crate::core::ports::{AgentService, Check, CheckMode};
use crate::core::services::Applicability;
use crate::storage::ErrorDedupStore;

/// Built-in check names, in registration order
pub const KNOWN_CHECKS: &[&str] = &[
    LineHygiene::NAME,
    DataFormat::NAME,
    LicenseHeader::NAME,
    SecretScan::NAME,
    LogInvestigator::NAME,
];

/// The set of checks available to the orchestrator
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckRegistry").field("checks", &self.names()).finish()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckRegistry {
    /// An empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Register a check; registration order is preserved
    pub fn register(&mut self, check: Arc<dyn Check>) {
        info!("registered check: {}", check.name());
        self.checks.push(check);
    }

    /// Names of registered checks, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.name().to_string()).collect()
    }

    /// Number of registered checks
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Checks whose predicate accepts the event, in registration order
    #[must_use]
    pub fn applicable(&self, event: &ChangeEvent) -> Vec<Arc<dyn Check>> {
        self.checks.iter().filter(|c| c.applicable(event)).cloned().collect()
    }
}

fn applicability(
    cfg: &CheckConfig,
    default_file_types: &[&str],
) -> anyhow::Result<Applicability> {
    let file_types = if cfg.file_types.is_empty() {
        default_file_types.iter().map(ToString::to_string).collect()
    } else {
        cfg.file_types.clone()
    };
    Ok(Applicability::new(cfg.enabled, file_types, &cfg.paths)?)
}

/// Build the registry from configuration
///
/// Only enabled checks are registered. `report_only` forces every
/// check into report-only mode regardless of its `auto_fix` setting.
pub fn build_registry(
    config: &DoormanConfig,
    dedup: Arc<ErrorDedupStore>,
    agent: Option<Arc<dyn AgentService>>,
) -> anyhow::Result<CheckRegistry> {
    for name in config.checks.keys() {
        if !KNOWN_CHECKS.contains(&name.as_str()) {
            bail!("unknown check '{name}' in configuration (known: {})", KNOWN_CHECKS.join(", "));
        }
    }

    let mut registry = CheckRegistry::new();

    let cfg = config.check(LineHygiene::NAME);
    if cfg.enabled {
        let mode = if cfg.auto_fix && !config.report_only {
            CheckMode::SideEffecting
        } else {
            CheckMode::ReportOnly
        };
        registry.register(Arc::new(LineHygiene::new(applicability(&cfg, &[])?, mode)));
    }

    let cfg = config.check(DataFormat::NAME);
    if cfg.enabled {
        registry.register(Arc::new(DataFormat::new(applicability(
            &cfg,
            DataFormat::DEFAULT_FILE_TYPES,
        )?)));
    }

    let cfg = config.check(LicenseHeader::NAME);
    if cfg.enabled {
        registry.register(Arc::new(LicenseHeader::new(applicability(
            &cfg,
            LicenseHeader::DEFAULT_FILE_TYPES,
        )?)));
    }

    let cfg = config.check(SecretScan::NAME);
    if cfg.enabled {
        registry.register(Arc::new(SecretScan::new(applicability(&cfg, &[])?)?));
    }

    let cfg = config.check(LogInvestigator::NAME);
    if cfg.enabled {
        registry.register(Arc::new(LogInvestigator::new(
            applicability(&cfg, LogInvestigator::DEFAULT_FILE_TYPES)?,
            dedup,
            agent,
        )?));
    }

    Ok(registry)
}
