use crate::core::file_event::Direction;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// One counted detection as persisted in the append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountRecord {
    /// Seconds since the Unix epoch.
    pub ts: f64,
    pub camera_ip: String,
    pub camera_name: String,
    pub direction: Direction,
    pub file: String,
    pub raw: String,
}

/// JSON-lines log of every counted detection.
#[derive(Debug, Clone)]
pub struct JsonlCountsLog {
    path: PathBuf,
}

impl JsonlCountsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlCountsLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &CountRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("Failed to serialize count record")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open counts log '{}'", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("Failed to append to counts log '{}'", self.path.display()))?;
        Ok(())
    }

    /// Records with `t0 <= ts <= t1`. Unreadable lines are skipped; a missing log is empty.
    pub async fn read_range(&self, t0: f64, t1: f64) -> Result<Vec<CountRecord>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read counts log '{}'", self.path.display()))
            }
        };
        let records: Vec<CountRecord> = content
            .lines()
            .filter_map(|line| serde_json::from_str::<CountRecord>(line).ok())
            .filter(|r| t0 <= r.ts && r.ts <= t1)
            .collect();
        debug!("Read {} count record(s) in [{}, {}]", records.len(), t0, t1);
        Ok(records)
    }
}
