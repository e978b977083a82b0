use crate::camera::camera_worker::{StopOutcome, WorkerHandle, WorkerSettings, WorkerState};
use crate::core::camera_registry::CameraRegistry;
use crate::core::event_source::{EventSource, FileCallback, LogCallback};
use crate::store::image_store::ImageStore;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const STOP_WAIT: Duration = Duration::from_millis(1500);

/// Runs one alert-stream worker per enabled camera of the registry.
pub struct IsapiEventSource {
    registry: Arc<dyn CameraRegistry>,
    image_store: Arc<dyn ImageStore>,
    settings: WorkerSettings,
    stop_wait: Duration,
    workers: Vec<WorkerHandle>,
    on_log: Option<LogCallback>,
}

impl IsapiEventSource {
    pub fn new(registry: Arc<dyn CameraRegistry>, image_store: Arc<dyn ImageStore>, settings: WorkerSettings) -> Self {
        IsapiEventSource {
            registry,
            image_store,
            settings,
            stop_wait: STOP_WAIT,
            workers: Vec::new(),
            on_log: None,
        }
    }

    /// Upper bound on how long `stop` waits for each worker.
    pub fn with_stop_wait(mut self, stop_wait: Duration) -> Self {
        self.stop_wait = stop_wait;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// `(camera address, state)` for every managed worker.
    pub fn worker_states(&self) -> Vec<(String, WorkerState)> {
        self.workers
            .iter()
            .map(|w| (w.camera_ip().to_string(), w.state()))
            .collect()
    }

    fn notice(&self, message: String) {
        match &self.on_log {
            Some(on_log) => on_log(message),
            None => info!("{}", message),
        }
    }
}

#[async_trait]
impl EventSource for IsapiEventSource {
    fn get_type(&self) -> String {
        "isapi".to_string()
    }

    async fn start(&mut self, on_file: FileCallback, on_log: LogCallback) {
        if self.is_running() {
            on_log("ISAPI already running".to_string());
            return;
        }
        let start_time = Instant::now();
        self.workers.clear();
        self.on_log = Some(on_log.clone());

        let cameras = match self.registry.load_all() {
            Ok(cameras) => cameras,
            Err(e) => {
                on_log(format!("ISAPI not started: failed to load cameras: {:#}", e));
                return;
            }
        };
        debug!("🎯 Registry returned {} camera(s).", cameras.len());

        for camera in cameras.into_iter().filter(|c| c.enabled) {
            let ip = camera.ip.clone();
            match WorkerHandle::spawn(
                camera,
                self.settings.clone(),
                Arc::clone(&self.image_store),
                Arc::clone(&on_file),
                Arc::clone(&on_log),
            ) {
                Ok(handle) => self.workers.push(handle),
                Err(e) => on_log(format!("ISAPI worker error {}: {}", ip, e)),
            }
        }

        on_log(format!("ISAPI started for {} cameras", self.workers.len()));
        debug!("Started {} worker(s) in {:?}", self.workers.len(), start_time.elapsed());
    }

    async fn stop(&mut self) {
        let workers = std::mem::take(&mut self.workers);
        if workers.is_empty() {
            return;
        }
        let stop_start = Instant::now();
        // Signal everyone first so they wind down in parallel.
        for worker in &workers {
            worker.signal_stop();
        }

        let wait = self.stop_wait;
        let outcomes = join_all(workers.into_iter().map(|worker| async move {
            let ip = worker.camera_ip().to_string();
            (ip, worker.stop(wait).await)
        }))
        .await;

        let total = outcomes.len();
        for (ip, outcome) in outcomes {
            match outcome {
                StopOutcome::Exited => debug!("ISAPI [{}]: worker exited.", ip),
                StopOutcome::Panicked(e) => {
                    warn!("💀 ISAPI [{}]: worker had panicked: {}", ip, e);
                    self.notice(format!("ISAPI worker error {}: {}", ip, e));
                }
                StopOutcome::TimedOut => {
                    warn!("⚠️ ISAPI [{}]: worker did not stop within {:?}; aborted.", ip, wait);
                    self.notice(format!("ISAPI worker {} did not stop in time; abandoned", ip));
                }
            }
        }
        info!("🏁 Stopped {} ISAPI worker(s) in {:?}.", total, stop_start.elapsed());
    }

    fn is_running(&self) -> bool {
        self.workers.iter().any(|w| w.is_active())
    }
}
