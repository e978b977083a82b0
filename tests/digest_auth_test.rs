mod common;

use common::*;
use rcount::camera::isapi_client::IsapiClient;
use rcount::camera::WorkerHandle;
use rcount::camera_config::AuthMode;
use rcount::errors::AppError;
use rcount::store::image_store::LocalImageStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::timeout;
use wiremock::{MockServer, ResponseTemplate};

const SNAPSHOT_101: &str = "/ISAPI/Streaming/channels/101/picture";
const ALERT_STREAM: &str = "/ISAPI/Event/notification/alertStream";

#[tokio::test]
async fn snapshot_answers_digest_challenge() {
    let server = MockServer::start().await;
    mount_digest_protected(&server, SNAPSHOT_101, ResponseTemplate::new(200).set_body_bytes(FAKE_JPEG)).await;

    let camera = digest_camera("door", &server);
    assert_eq!(camera.auth, AuthMode::Digest);
    let client = IsapiClient::new(camera, test_settings().timeouts, false).unwrap();

    let bytes = client.fetch_snapshot(101).await.unwrap();
    assert_eq!(&bytes[..], FAKE_JPEG);

    // One bare request to get the challenge, then one with the digest response.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_none());
    let authorization = requests[1].headers.get("authorization").unwrap().to_str().unwrap();
    assert!(authorization.starts_with("Digest "), "{}", authorization);
    assert!(authorization.contains("username=\"admin\""));
    assert!(authorization.contains("realm=\"IP Camera(C1234)\""));
}

#[tokio::test]
async fn rejected_digest_credentials_surface_as_401() {
    let server = MockServer::start().await;
    mount_digest_challenge(&server, SNAPSHOT_101).await;

    let client = IsapiClient::new(digest_camera("door", &server), test_settings().timeouts, false).unwrap();
    match client.fetch_snapshot(101).await {
        Err(AppError::HttpStatus { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected HTTP 401, got {:?}", other),
    }
}

#[tokio::test]
async fn worker_streams_and_captures_with_digest() {
    let server = MockServer::start().await;
    mount_digest_protected(
        &server,
        ALERT_STREAM,
        ResponseTemplate::new(200).set_body_string(alert_block("linedetection", "active", None)),
    )
    .await;
    mount_digest_protected(&server, SNAPSHOT_101, ResponseTemplate::new(200).set_body_bytes(FAKE_JPEG)).await;

    let dir = tempdir().unwrap();
    let store = Arc::new(LocalImageStore::new(dir.path()).unwrap());
    let mut sinks = sinks();
    let camera = digest_camera("door", &server);
    let ip = camera.ip.clone();

    let handle = WorkerHandle::spawn(camera, test_settings(), store, sinks.on_file.clone(), sinks.on_log.clone())
        .unwrap();

    let event = timeout(Duration::from_secs(5), sinks.events.recv()).await.unwrap().unwrap();
    assert!(logged(&sinks.lines, &format!("ISAPI connected: {} (HTTP)", ip)));
    let stored = event.path.expect("digest-protected snapshot should be stored");
    assert_eq!(std::fs::read(stored).unwrap(), FAKE_JPEG);

    handle.stop(Duration::from_millis(1500)).await;
}
