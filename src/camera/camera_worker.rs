use crate::app_config::ApplicationConfig;
use crate::camera::alert_stream::{AlertStreamParser, RawEventRecord};
use crate::camera::event_filter::{EventFilter, Verdict, DEBOUNCE_WINDOW};
use crate::camera::isapi_client::{HttpTimeouts, IsapiClient};
use crate::camera_config::CameraConfig;
use crate::common::file_utils;
use crate::core::event_source::{FileCallback, LogCallback};
use crate::core::file_event::FileEvent;
use crate::errors::AppError;
use crate::store::image_store::ImageStore;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Response;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const RETRY_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Connecting,
    Streaming,
    Backoff,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub debounce: Duration,
    pub retry_delay: Duration,
    pub timeouts: HttpTimeouts,
    pub accept_invalid_certs: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        WorkerSettings {
            debounce: DEBOUNCE_WINDOW,
            retry_delay: RETRY_DELAY,
            timeouts: HttpTimeouts::default(),
            accept_invalid_certs: false,
        }
    }
}

impl WorkerSettings {
    pub fn from_app_config(app: &ApplicationConfig) -> Self {
        WorkerSettings {
            debounce: Duration::from_millis(app.debounce_ms),
            retry_delay: Duration::from_secs(app.retry_delay_secs),
            timeouts: HttpTimeouts::from_app_config(app),
            accept_invalid_certs: app.accept_invalid_certs,
        }
    }
}

#[derive(Debug)]
pub enum StopOutcome {
    Exited,
    Panicked(String),
    /// Did not exit within the wait and was aborted.
    TimedOut,
}

enum StreamEnd {
    Stopped,
    Failed(AppError),
}

// Resolves once a stop is requested, or when the handle has been dropped.
async fn stop_signalled(stop_rx: &mut watch::Receiver<bool>) {
    let _ = stop_rx.wait_for(|stop| *stop).await;
}

/// Owns one camera's alert-stream connection for as long as it runs.
struct CameraWorker {
    client: IsapiClient,
    settings: WorkerSettings,
    filter: EventFilter,
    image_store: Arc<dyn ImageStore>,
    on_file: FileCallback,
    on_log: LogCallback,
    stop_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<WorkerState>,
}

impl CameraWorker {
    fn ip(&self) -> &str {
        &self.client.camera().ip
    }

    fn log(&self, message: String) {
        (self.on_log)(message);
    }

    fn update_state(&self, new_state: WorkerState) {
        let old = self.state_tx.send_replace(new_state);
        if old != new_state {
            debug!("ISAPI [{}]: state {:?} -> {:?}", self.ip(), old, new_state);
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    async fn run(mut self) {
        info!("▶️ ISAPI [{}]: worker started for '{}'.", self.ip(), self.client.camera().label());
        loop {
            if self.stop_requested() {
                break;
            }
            self.update_state(WorkerState::Connecting);
            let connected = tokio::select! {
                _ = stop_signalled(&mut self.stop_rx) => break,
                res = self.client.open_alert_stream() => res,
            };

            let failure = match connected {
                Ok(response) => {
                    let scheme = self.client.camera().scheme.as_str().to_uppercase();
                    self.log(format!("ISAPI connected: {} ({})", self.ip(), scheme));
                    self.update_state(WorkerState::Streaming);
                    match self.stream(response).await {
                        StreamEnd::Stopped => break,
                        StreamEnd::Failed(e) => e,
                    }
                }
                Err(e) => e,
            };

            self.update_state(WorkerState::Backoff);
            warn!("⚠️ ISAPI [{}]: {}", self.ip(), failure);
            self.log(format!(
                "ISAPI stream error {}: {}; retrying in {}s",
                self.ip(),
                failure,
                self.settings.retry_delay.as_secs_f32()
            ));
            tokio::select! {
                _ = stop_signalled(&mut self.stop_rx) => break,
                _ = tokio::time::sleep(self.settings.retry_delay) => {}
            }
        }
        self.update_state(WorkerState::Stopped);
        info!("⏹️ ISAPI [{}]: worker stopped.", self.ip());
    }

    async fn stream(&mut self, mut response: Response) -> StreamEnd {
        let mut parser = AlertStreamParser::new();
        loop {
            let chunk = tokio::select! {
                _ = stop_signalled(&mut self.stop_rx) => return StreamEnd::Stopped,
                chunk = response.chunk() => chunk,
            };
            match chunk {
                Ok(Some(bytes)) => {
                    for record in parser.feed(&bytes) {
                        self.handle_record(record).await;
                    }
                    if self.stop_requested() {
                        return StreamEnd::Stopped;
                    }
                }
                Ok(None) => return StreamEnd::Failed(AppError::transport(self.ip(), "stream closed by camera")),
                Err(e) => return StreamEnd::Failed(AppError::transport(self.ip(), e)),
            }
        }
    }

    async fn handle_record(&mut self, record: RawEventRecord) {
        let token = record.token();
        self.log(format!(
            "Event {}: eventType={} ({}), state={}",
            self.ip(),
            record.event_type,
            token,
            record.event_state
        ));

        // Debounce against when the chunk arrived, not when we get here: blocks that came
        // in one chunk are 0 ms apart even if capturing the first one took seconds.
        let verdict = self.filter.judge_at(&token, &record, record.arrived);
        if verdict != Verdict::Accept {
            debug!("ISAPI [{}]: dropping {} ({:?})", self.ip(), token, verdict);
            return;
        }

        let channel = record.channel_id.unwrap_or(self.client.camera().snap_channel);
        let event = self.capture(channel, &token).await;
        (self.on_file)(event);
    }

    /// Always yields an event; a failed snapshot only leaves the path empty.
    async fn capture(&self, channel: u32, token: &str) -> FileEvent {
        let when = Utc::now();
        let without_image = FileEvent {
            path: None,
            camera_ip: self.ip().to_string(),
            raw_name: token.to_string(),
            when,
        };

        let bytes = match self.client.fetch_snapshot(channel).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.log(format!("Snapshot error {}: {}", self.ip(), e));
                return without_image;
            }
        };

        let staged = match file_utils::write_staged_snapshot(&self.image_store.staging_dir(), &bytes).await {
            Ok(path) => path,
            Err(e) => {
                self.log(format!("Snapshot error {}: {}", self.ip(), e));
                return without_image;
            }
        };

        let raw_name = format!("{}.jpg", token);
        match self.image_store.move_and_stamp(&staged, self.ip(), &raw_name).await {
            Ok(dest) => FileEvent {
                path: Some(dest),
                raw_name,
                ..without_image
            },
            Err(e) => {
                self.log(format!("Snapshot error {}: {}", self.ip(), e));
                let _ = tokio::fs::remove_file(&staged).await;
                without_image
            }
        }
    }
}

/// The pool's grip on one running worker.
pub struct WorkerHandle {
    camera_ip: String,
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<WorkerState>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Builds the camera's HTTP clients and starts its worker task.
    pub fn spawn(
        camera: CameraConfig,
        settings: WorkerSettings,
        image_store: Arc<dyn ImageStore>,
        on_file: FileCallback,
        on_log: LogCallback,
    ) -> Result<Self, AppError> {
        let camera_ip = camera.ip.clone();
        let client = IsapiClient::new(camera, settings.timeouts, settings.accept_invalid_certs)?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(WorkerState::Idle);

        let worker = CameraWorker {
            client,
            filter: EventFilter::new(settings.debounce),
            settings,
            image_store,
            on_file,
            on_log,
            stop_rx,
            state_tx,
        };
        let join = tokio::spawn(worker.run());

        Ok(WorkerHandle {
            camera_ip,
            stop_tx,
            state_rx,
            join,
        })
    }

    pub fn camera_ip(&self) -> &str {
        &self.camera_ip
    }

    pub fn state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }

    /// A receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<WorkerState> {
        self.state_rx.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.join.is_finished()
    }

    pub fn signal_stop(&self) {
        // Fails only when the worker is already gone.
        let _ = self.stop_tx.send(true);
    }

    /// Signals stop and waits at most `wait` for the task to end, aborting it otherwise.
    pub async fn stop(self, wait: Duration) -> StopOutcome {
        self.signal_stop();
        let mut join = self.join;
        match tokio::time::timeout(wait, &mut join).await {
            Ok(Ok(())) => StopOutcome::Exited,
            Ok(Err(e)) => StopOutcome::Panicked(e.to_string()),
            Err(_) => {
                join.abort();
                StopOutcome::TimedOut
            }
        }
    }
}
