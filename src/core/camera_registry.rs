use crate::camera_config::CameraConfig;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Where the worker pool gets its camera list from.
pub trait CameraRegistry: Send + Sync {
    /// All cameras in configured order, enabled or not.
    fn load_all(&self) -> Result<Vec<CameraConfig>>;

    fn find_by_ip(&self, ip: &str) -> Result<Option<CameraConfig>> {
        Ok(self.load_all()?.into_iter().find(|c| c.ip == ip))
    }
}

/// A fixed list, typically the `cameras:` section of an already loaded config.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    cameras: Vec<CameraConfig>,
}

impl StaticRegistry {
    pub fn new(cameras: Vec<CameraConfig>) -> Self {
        debug!("📷 Static camera registry with {} camera(s).", cameras.len());
        StaticRegistry { cameras }
    }

    /// Keeps only the named cameras, in the order they were configured.
    pub fn filtered(&self, names: &[String]) -> Self {
        let cameras = self
            .cameras
            .iter()
            .filter(|c| names.iter().any(|n| n == &c.name || n == &c.ip))
            .cloned()
            .collect();
        StaticRegistry { cameras }
    }
}

impl CameraRegistry for StaticRegistry {
    fn load_all(&self) -> Result<Vec<CameraConfig>> {
        Ok(self.cameras.clone())
    }
}

/// One JSON object per line, as written by the older desktop build.
#[derive(Debug, Clone)]
pub struct JsonlCameraRegistry {
    path: PathBuf,
}

impl JsonlCameraRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlCameraRegistry { path: path.into() }
    }
}

impl CameraRegistry for JsonlCameraRegistry {
    fn load_all(&self) -> Result<Vec<CameraConfig>> {
        let start_time = Instant::now();
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read camera list '{}'", self.path.display()))?;
        let mut cameras = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<CameraConfig>(line) {
                Ok(cam) => cameras.push(cam),
                Err(e) => warn!(
                    "⚠️ Skipping unreadable camera entry on line {} of '{}': {}",
                    idx + 1,
                    self.path.display(),
                    e
                ),
            }
        }
        debug!(
            "Loaded {} camera(s) from '{}' in {:?}",
            cameras.len(),
            self.path.display(),
            start_time.elapsed()
        );
        Ok(cameras)
    }
}

// Helper to parse comma-separated camera names from CLI
pub fn parse_camera_names_arg(names_str_opt: Option<&String>) -> Option<Vec<String>> {
    debug!("📝 Parsing camera names argument: {:?}", names_str_opt);
    names_str_opt.map(|names_str| {
        names_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
