//! doorman - a filesystem quality gate
//!
//! doorman watches a directory tree, coalesces bursts of file changes,
//! routes each changed file through a set of pluggable checks running
//! concurrently, folds proposed fixes into the file one at a time, and
//! fans the aggregated verdict out to notification channels and
//! idempotent external actions.

// Keep the crate clippy-clean; opt-outs below are deliberate
#![deny(clippy::all, unsafe_code)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod agent;
pub mod checks;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod engine;
pub mod output;
pub mod paths;
pub mod storage;
