use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "?")]
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
            Direction::Unknown => "?",
        }
    }

    /// `self` unless unresolved, `fallback` otherwise.
    pub fn or(self, fallback: Direction) -> Direction {
        match self {
            Direction::Unknown => fallback,
            resolved => resolved,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A worker's output for one accepted detection.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEvent {
    /// Stored snapshot; `None` when the snapshot could not be fetched or stored.
    pub path: Option<PathBuf>,
    pub camera_ip: String,
    /// Canonical event token, with a `.jpg` suffix when an image was stored.
    pub raw_name: String,
    pub when: DateTime<Utc>,
}

impl FileEvent {
    pub fn path_str(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}
