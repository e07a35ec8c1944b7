//! File logger notifier
//!
//! Appends formatted results to rotated JSONL files under
//! `.doorman/logs/`. The local channel that is always safe to enable.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::models::AggregateResult;
use crate::core::ports::{DetailLevel, Notifier};

use super::formatter;

/// Log file rotation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// One file per day
    Daily,
    /// One file per ISO week
    Weekly,
    /// One file per month
    Monthly,
    /// A single growing file
    Single,
}

impl std::str::FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "single" => Ok(Self::Single),
            _ => Err(format!("Invalid rotation: {s}. Use: daily, weekly, monthly, single")),
        }
    }
}

/// JSONL file notifier
#[derive(Debug)]
pub struct FileLogNotifier {
    dir: PathBuf,
    rotation: Rotation,
    write_guard: Mutex<()>,
}

impl FileLogNotifier {
    /// Create a notifier logging into `dir`
    pub fn new(dir: impl Into<PathBuf>, rotation: Rotation) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, rotation, write_guard: Mutex::new(()) })
    }

    fn current_file(&self) -> PathBuf {
        let now = Utc::now();
        let name = match self.rotation {
            Rotation::Daily => format!("{}.jsonl", now.format("%Y-%m-%d")),
            Rotation::Weekly => format!("{}.jsonl", now.format("%Y-W%W")),
            Rotation::Monthly => format!("{}.jsonl", now.format("%Y-%m")),
            Rotation::Single => "doorman.jsonl".to_string(),
        };
        self.dir.join(name)
    }
}

#[async_trait]
impl Notifier for FileLogNotifier {
    fn name(&self) -> &str {
        "file_log"
    }

    async fn send(&self, result: &AggregateResult, detail: DetailLevel) -> anyhow::Result<()> {
        let line = serde_json::to_string(&formatter::format(result, detail))?;
        let path = self.current_file();
        let _guard = self.write_guard.lock().expect("file log lock poisoned");
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
