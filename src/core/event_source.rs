use crate::core::file_event::FileEvent;
use async_trait::async_trait;
use std::sync::Arc;

/// Receives every accepted detection. Called concurrently from all workers.
pub type FileCallback = Arc<dyn Fn(FileEvent) + Send + Sync>;

/// Receives human-readable status lines. Called concurrently from all workers.
pub type LogCallback = Arc<dyn Fn(String) + Send + Sync>;

/// A source of detections that can be started and stopped as a unit.
///
/// The ISAPI alert-stream pool is the only implementation today; another vendor's
/// protocol would plug in here without touching callers.
#[async_trait]
pub trait EventSource: Send {
    fn get_type(&self) -> String; // e.g. "isapi"

    async fn start(&mut self, on_file: FileCallback, on_log: LogCallback);

    /// Never fails; stragglers are logged and abandoned.
    async fn stop(&mut self);

    fn is_running(&self) -> bool;
}
