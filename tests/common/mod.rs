// Shared helpers for the integration tests.
#![allow(dead_code)]

use rcount::camera::WorkerSettings;
use rcount::camera::isapi_client::HttpTimeouts;
use rcount::camera_config::{AuthMode, CameraConfig};
use rcount::core::event_source::{FileCallback, LogCallback};
use rcount::core::file_event::FileEvent;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

pub fn alert_block(event_type: &str, state: &str, channel: Option<u32>) -> String {
    let channel = channel
        .map(|c| format!("<channelID>{}</channelID>", c))
        .unwrap_or_default();
    format!(
        "--boundary\r\nContent-Type: application/xml\r\n\r\n\
         <EventNotificationAlert version=\"2.0\"><ipAddress>10.0.0.1</ipAddress>{}\
         <eventType>{}</eventType><eventState>{}</eventState></EventNotificationAlert>\r\n",
        channel, event_type, state
    )
}

/// A camera pointed at the mock server, using basic auth so no challenge round trip is needed.
pub fn mock_camera(name: &str, server: &MockServer) -> CameraConfig {
    let mut camera = CameraConfig::new(name, &server.address().to_string());
    camera.auth = AuthMode::Basic;
    camera.password = "secret".to_string();
    camera
}

pub const DIGEST_CHALLENGE: &str = "Digest realm=\"IP Camera(C1234)\", qop=\"auth\", \
     nonce=\"4e6a4d7a4d4449774f4441364d6a5a6a4e7a4d784f47493d\", opaque=\"5ccc069c403ebaf9f0171e9517f40e41\"";

/// A camera pointed at the mock server, left on the default digest auth.
pub fn digest_camera(name: &str, server: &MockServer) -> CameraConfig {
    let mut camera = CameraConfig::new(name, &server.address().to_string());
    camera.password = "secret".to_string();
    camera
}

/// Answers `ok` once the request carries credentials and a digest challenge before that.
pub async fn mount_digest_protected(server: &MockServer, route: &str, ok: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header_exists("authorization"))
        .respond_with(ok)
        .with_priority(1)
        .mount(server)
        .await;
    mount_digest_challenge(server, route).await;
}

/// A route that rejects every request, credentials or not.
pub async fn mount_digest_challenge(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(401).insert_header("www-authenticate", DIGEST_CHALLENGE))
        .mount(server)
        .await;
}

/// Polls the captured log lines until one contains `needle`.
pub async fn wait_for_log(lines: &Arc<Mutex<Vec<String>>>, needle: &str, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if logged(lines, needle) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    logged(lines, needle)
}

/// Fast timeouts and a long retry so a test only ever sees the first connection.
pub fn test_settings() -> WorkerSettings {
    WorkerSettings {
        debounce: Duration::from_millis(500),
        retry_delay: Duration::from_secs(30),
        timeouts: HttpTimeouts {
            connect: Duration::from_secs(2),
            stream_read: Duration::from_secs(5),
            snapshot_read: Duration::from_secs(2),
        },
        accept_invalid_certs: false,
    }
}

pub async fn mount_alert_stream(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/ISAPI/Event/notification/alertStream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "multipart/mixed; boundary=boundary")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

pub async fn mount_snapshot(server: &MockServer, channel: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/ISAPI/Streaming/channels/{}/picture", channel)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Callbacks that forward into channels plus a shared copy of every log line.
pub struct Sinks {
    pub on_file: FileCallback,
    pub on_log: LogCallback,
    pub events: mpsc::UnboundedReceiver<FileEvent>,
    pub lines: Arc<Mutex<Vec<String>>>,
}

pub fn sinks() -> Sinks {
    let (tx, events) = mpsc::unbounded_channel();
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    Sinks {
        on_file: Arc::new(move |event| {
            let _ = tx.send(event);
        }),
        on_log: Arc::new(move |line| captured.lock().unwrap().push(line)),
        events,
        lines,
    }
}

pub fn logged(lines: &Arc<Mutex<Vec<String>>>, needle: &str) -> bool {
    lines.lock().unwrap().iter().any(|l| l.contains(needle))
}
