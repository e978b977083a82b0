use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApplicationConfig {
    pub data_directory: String,
    pub log_level: Option<String>, // CLI --debug wins over this
    pub accept_invalid_certs: bool, // cameras on https usually ship self-signed certs
    pub debounce_ms: u64,
    pub retry_delay_secs: u64,
    pub stop_timeout_ms: u64,
    pub connect_timeout_secs: u64,
    pub stream_read_timeout_secs: u64,
    pub snapshot_read_timeout_secs: u64,
    pub image_retention_minutes: u64,
    pub purge_interval_secs: u64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        ApplicationConfig {
            data_directory: "./people_counter".to_string(),
            log_level: Some("info".to_string()),
            accept_invalid_certs: false,
            debounce_ms: 500,
            retry_delay_secs: 3,
            stop_timeout_ms: 1500,
            connect_timeout_secs: 5,
            stream_read_timeout_secs: 60,
            snapshot_read_timeout_secs: 10,
            image_retention_minutes: 2,
            purge_interval_secs: 20,
        }
    }
}

impl ApplicationConfig {
    pub fn events_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join("events")
    }

    pub fn counts_log_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join("counts.jsonl")
    }

    pub fn event_log_path(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join("events.log")
    }

    pub fn image_retention(&self) -> Duration {
        Duration::from_secs(self.image_retention_minutes * 60)
    }
}
