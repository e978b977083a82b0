use serde::Deserialize;
use std::fs;
use std::path::Path;
use crate::app_config::ApplicationConfig;
use crate::camera_config::CameraConfig;
use anyhow::{Result, Context, bail};
use std::collections::HashSet;
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Debug, Deserialize, Clone)]
pub struct MasterConfig {
    #[serde(rename = "application", default)]
    pub app_settings: ApplicationConfig,
    #[serde(default)]
    pub cameras: Vec<CameraConfig>,
}

pub fn load_config(path: &str) -> Result<MasterConfig> {
    debug!("📄 Attempting to load config from: {}", path);
    let start_time = Instant::now();

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'. 📖", path))?;

    let config = parse_config(&config_str)
        .with_context(|| format!("Invalid configuration in '{}'. 💔", path))?;

    info!("✅ Successfully loaded and validated configuration from '{}' in {:?}", path, start_time.elapsed());
    Ok(config)
}

pub fn parse_config(config_str: &str) -> Result<MasterConfig> {
    let config: MasterConfig = serde_yaml::from_str(config_str)
        .context("Failed to parse YAML configuration")?;
    validate_master_config(&config).context("Master configuration validation failed 👎")?;
    Ok(config)
}

fn validate_master_config(config: &MasterConfig) -> Result<()> {
    debug!("🕵️ Validating master configuration...");
    if config.app_settings.data_directory.trim().is_empty() {
        bail!("❌ Application data_directory cannot be empty.");
    }
    let data_path = Path::new(&config.app_settings.data_directory);
    if data_path.exists() && !data_path.is_dir() {
        bail!("❌ Data directory '{}' exists but is not a directory.", config.app_settings.data_directory);
    }
    if config.app_settings.retry_delay_secs == 0 {
        bail!("❌ retry_delay_secs must be at least 1; 0 would reconnect to a dead camera in a tight loop.");
    }
    if config.app_settings.debounce_ms == 0 {
        warn!("⚠️ debounce_ms is 0; every active event will trigger a snapshot.");
    }

    if config.cameras.is_empty() {
        warn!("⚠️ No cameras defined in the configuration. Monitoring will start no workers.");
    }

    let mut camera_ips = HashSet::new();
    let mut camera_names = HashSet::new();
    for (idx, camera) in config.cameras.iter().enumerate() {
        debug!("Validating camera #{}: {}", idx + 1, camera.label());
        if camera.ip.trim().is_empty() {
            bail!("❌ Address for camera #{} ('{}') cannot be empty.", idx + 1, camera.name);
        }
        // Counts are attributed by address, so two entries cannot share one.
        if !camera_ips.insert(camera.ip.as_str()) {
            bail!("❌ Duplicate camera address found: {}", camera.ip);
        }
        if !camera.name.is_empty() && !camera_names.insert(camera.name.as_str()) {
            bail!("❌ Duplicate camera name found: {}", camera.name);
        }
        if camera.login.is_empty() {
            warn!("⚠️ Login for camera '{}' is empty; the camera will likely reject requests.", camera.label());
        }
    }
    info!("👍 Master configuration validated: {} camera(s).", config.cameras.len());
    Ok(())
}
