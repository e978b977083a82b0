use crate::app_config::ApplicationConfig;
use crate::camera_config::{AuthMode, CameraConfig};
use crate::errors::AppError;
use bytes::Bytes;
use diqwest::WithDigestAuth;
use log::{debug, error};
use reqwest::{Client, Response, StatusCode};
use std::time::{Duration, Instant};

pub const ALERT_STREAM_PATH: &str = "/ISAPI/Event/notification/alertStream";

#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub stream_read: Duration,
    pub snapshot_read: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        HttpTimeouts {
            connect: Duration::from_secs(5),
            stream_read: Duration::from_secs(60),
            snapshot_read: Duration::from_secs(10),
        }
    }
}

impl HttpTimeouts {
    pub fn from_app_config(app: &ApplicationConfig) -> Self {
        HttpTimeouts {
            connect: Duration::from_secs(app.connect_timeout_secs),
            stream_read: Duration::from_secs(app.stream_read_timeout_secs),
            snapshot_read: Duration::from_secs(app.snapshot_read_timeout_secs),
        }
    }
}

/// Authenticated ISAPI access for one camera.
///
/// Holds separate clients for the long-lived alert stream and for snapshots since the
/// two need different read timeouts.
pub struct IsapiClient {
    camera: CameraConfig,
    stream_client: Client,
    snapshot_client: Client,
}

fn build_client(read_timeout: Duration, connect_timeout: Duration, accept_invalid_certs: bool) -> Result<Client, AppError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

impl IsapiClient {
    pub fn new(camera: CameraConfig, timeouts: HttpTimeouts, accept_invalid_certs: bool) -> Result<Self, AppError> {
        Ok(IsapiClient {
            stream_client: build_client(timeouts.stream_read, timeouts.connect, accept_invalid_certs)?,
            snapshot_client: build_client(timeouts.snapshot_read, timeouts.connect, accept_invalid_certs)?,
            camera,
        })
    }

    pub fn camera(&self) -> &CameraConfig {
        &self.camera
    }

    pub fn alert_stream_url(&self) -> String {
        format!("{}{}", self.camera.base_url(), ALERT_STREAM_PATH)
    }

    pub fn snapshot_url(&self, channel: u32) -> String {
        format!(
            "{}/ISAPI/Streaming/channels/{}/picture?snapShotImageType=JPEG",
            self.camera.base_url(),
            channel
        )
    }

    async fn send_authenticated(&self, client: &Client, url: &str) -> Result<Response, AppError> {
        let login = &self.camera.login;
        let password = &self.camera.password;
        match self.camera.auth {
            AuthMode::Digest => client
                .get(url)
                .send_with_digest_auth(login, password)
                .await
                .map_err(|e| AppError::transport(&self.camera.ip, e)),
            AuthMode::Basic => client
                .get(url)
                .basic_auth(login, Some(password))
                .send()
                .await
                .map_err(|e| AppError::transport(&self.camera.ip, e)),
        }
    }

    fn require_success(&self, response: Response) -> Result<Response, AppError> {
        if !response.status().is_success() {
            return Err(AppError::HttpStatus {
                camera_ip: self.camera.ip.clone(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    /// Opens the long-lived alert stream. The body is read incrementally by the caller.
    pub async fn open_alert_stream(&self) -> Result<Response, AppError> {
        let url = self.alert_stream_url();
        debug!("ISAPI [{}]: Opening alert stream {}", self.camera.ip, url);
        let response = self.send_authenticated(&self.stream_client, &url).await?;
        self.require_success(response)
    }

    /// Fetches one JPEG still for `channel`.
    pub async fn fetch_snapshot(&self, channel: u32) -> Result<Bytes, AppError> {
        let start_time = Instant::now();
        let url = self.snapshot_url(channel);
        debug!("ISAPI [{}]: Requesting snapshot from {}", self.camera.ip, url);

        let result = async {
            let response = self.send_authenticated(&self.snapshot_client, &url).await?;
            let response = self.require_success(response)?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| AppError::transport(&self.camera.ip, e))?;
            if bytes.is_empty() {
                return Err(AppError::EmptyBody(self.camera.ip.clone()));
            }
            Ok(bytes)
        }
        .await;

        match &result {
            Ok(bytes) => debug!(
                "ISAPI [{}]: Received {} snapshot bytes in {:?}.",
                self.camera.ip,
                bytes.len(),
                start_time.elapsed()
            ),
            Err(e) => error!("❌ ISAPI [{}]: Snapshot failed: {}", self.camera.ip, e),
        }
        result
    }

    /// Touches the alert stream once and reports the status without reading the body.
    pub async fn probe_alert_stream(&self, timeout: Duration) -> Result<StatusCode, AppError> {
        let url = self.alert_stream_url();
        match tokio::time::timeout(timeout, self.send_authenticated(&self.stream_client, &url)).await {
            Ok(Ok(response)) => Ok(response.status()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AppError::transport(&self.camera.ip, format!("no response within {:?}", timeout))),
        }
    }
}
