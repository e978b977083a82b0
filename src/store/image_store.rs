use crate::common::timestamp_utils;
use crate::errors::AppError;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;

/// Final resting place for snapshots handed over by the workers.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Directory where workers may stage temporary snapshot files.
    fn staging_dir(&self) -> PathBuf;

    /// Moves a staged file into the store under a timestamped name and returns its new path.
    async fn move_and_stamp(&self, temp_path: &Path, camera_ip: &str, raw_name: &str) -> Result<PathBuf, AppError>;
}

#[derive(Debug, Clone)]
pub struct LocalImageStore {
    events_dir: PathBuf,
    staging_dir: PathBuf,
}

impl LocalImageStore {
    /// Creates both directories if needed. Staging lives next to the events so that the
    /// final move is a rename on the same filesystem.
    pub fn new(events_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let events_dir = events_dir.into();
        let staging_dir = events_dir.join(".staging");
        std::fs::create_dir_all(&staging_dir).map_err(|e| {
            AppError::Store(format!("Failed to create '{}': {}", staging_dir.display(), e))
        })?;
        Ok(LocalImageStore { events_dir, staging_dir })
    }

    pub fn events_dir(&self) -> &Path {
        &self.events_dir
    }

    /// Deletes `.jpg` files last modified more than `age` ago, both stored ones and
    /// leftovers in staging from captures that never completed. Returns how many.
    pub async fn purge_older_than(&self, age: Duration) -> Result<usize, AppError> {
        let cutoff = SystemTime::now().checked_sub(age).unwrap_or(SystemTime::UNIX_EPOCH);
        let removed = purge_dir(&self.events_dir, cutoff).await?;
        let abandoned = match purge_dir(&self.staging_dir, cutoff).await {
            Ok(n) => n,
            Err(e) => {
                warn!("⚠️ Could not purge staging dir '{}': {}", self.staging_dir.display(), e);
                0
            }
        };
        if abandoned > 0 {
            debug!("Removed {} abandoned staged snapshot(s)", abandoned);
        }
        if removed + abandoned > 0 {
            info!(
                "🧹 Purged {} image(s) older than {:?} from {}",
                removed + abandoned,
                age,
                self.events_dir.display()
            );
        }
        Ok(removed + abandoned)
    }
}

async fn purge_dir(dir: &Path, cutoff: SystemTime) -> Result<usize, AppError> {
    let mut removed = 0;
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_jpg = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("jpg"))
            .unwrap_or(false);
        if !is_jpg {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                debug!("Skipping '{}' during purge: {}", path.display(), e);
                continue;
            }
        };
        if modified < cutoff {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("⚠️ Failed to purge '{}': {}", path.display(), e),
            }
        }
    }
    Ok(removed)
}

#[async_trait]
impl ImageStore for LocalImageStore {
    fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone()
    }

    async fn move_and_stamp(&self, temp_path: &Path, camera_ip: &str, raw_name: &str) -> Result<PathBuf, AppError> {
        let stamp = timestamp_utils::current_local_timestamp_str("%Y%m%d_%H%M%S_%6f");
        let dest = self.events_dir.join(format!("{}__{}", stamp, raw_name));
        if fs::rename(temp_path, &dest).await.is_err() {
            // Staging may have been pointed at another filesystem.
            fs::copy(temp_path, &dest).await.map_err(|e| {
                AppError::Store(format!("Failed to store '{}' as '{}': {}", temp_path.display(), dest.display(), e))
            })?;
            let _ = fs::remove_file(temp_path).await;
        }
        debug!("Stored snapshot from {} at {}", camera_ip, dest.display());
        Ok(dest)
    }
}
