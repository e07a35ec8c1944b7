//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use doorman::output::OutputMode;

use super::commands;

/// doorman - quality control at the door
#[derive(Parser, Debug)]
#[command(
    name = "doorman",
    version,
    about = "Quality control at the door",
    long_about = "Watches a directory tree and routes every file change through a set of\n\
                  pluggable checks. Verdicts are aggregated per file, fixes are applied\n\
                  safely, and results fan out to Slack, webhooks and ticket automation."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch a directory and check files as they change
    Watch {
        /// Directory to watch (defaults to the configured watch_dir)
        dir: Option<PathBuf>,

        /// Path to a config file (defaults to ./doorman.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run all checks once over files or directories, then exit
    Check {
        /// Files or directories to check (defaults to the watch_dir)
        paths: Vec<PathBuf>,

        /// Path to a config file (defaults to ./doorman.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report only; never rewrite files
        #[arg(long)]
        no_fix: bool,
    },

    /// Write a commented default doorman.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Query the audit log
    Audit {
        /// Only records whose path starts with this prefix
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Only records after this instant (RFC3339, or 24h / 7d style)
        #[arg(short, long)]
        since: Option<String>,
    },

    /// Drop dedup and idempotency records older than the retention window
    Prune {
        /// Retention in days (defaults to the configured retention_days)
        #[arg(long)]
        older_than_days: Option<u32>,
    },
}

/// Parse arguments and dispatch; returns the process exit code
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();

    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    match cli.command {
        Command::Watch { dir, config } => commands::watch::execute(dir, config),
        Command::Check { paths, config, no_fix } => {
            commands::check::execute(paths, config, no_fix, mode)
        }
        Command::Init { force } => commands::init::execute(force),
        Command::Audit { path, since } => commands::audit::execute(path, since, mode),
        Command::Prune { older_than_days } => commands::prune::execute(older_than_days),
    }
}
