#![allow(clippy::unwrap_used)]
// Integration tests for `LiveFeedClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sentra_api::{Error, LiveFeedClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, LiveFeedClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api/livefeed/", server.uri())).unwrap();
    let client = LiveFeedClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn feed_path(suffix: &str) -> String {
    format!("/api/livefeed/{suffix}")
}

// ── Camera tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_cameras() {
    let (server, client) = setup().await;

    let body = json!({
        "status": "success",
        "cameras": [
            {
                "camera_id": "CAM001",
                "location": "Iscon Cross Road, Ahmedabad",
                "ip_address": "192.168.1.10",
                "status": "active",
                "camera_type": "CCTV",
                "stream_url": "rtsp://192.168.1.10:554/live"
            },
            {
                "camera_id": "CAM004",
                "location": "Satellite Road, Ahmedabad",
                "status": "maintenance"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path(feed_path("cameras/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let cameras = client.list_cameras().await.unwrap();

    assert_eq!(cameras.len(), 2);
    assert_eq!(cameras[0].camera_id, "CAM001");
    assert_eq!(cameras[0].status, "active");
    assert_eq!(
        cameras[0].stream_url.as_deref(),
        Some("rtsp://192.168.1.10:554/live")
    );
    assert_eq!(cameras[1].status, "maintenance");
    assert!(cameras[1].ip_address.is_none());
}

#[tokio::test]
async fn test_list_cameras_error_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("cameras/")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "error", "message": "db offline" })),
        )
        .mount(&server)
        .await;

    let result = client.list_cameras().await;

    assert!(
        matches!(result, Err(Error::Backend { ref message }) if message == "db offline"),
        "expected Backend error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_error_prefers_envelope_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("cameras/CAM404/status/")))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "status": "error", "message": "Camera not found" })),
        )
        .mount(&server)
        .await;

    let err = client.get_camera_status("CAM404").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "HTTP 404: Camera not found");
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("cameras/")))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = client.list_cameras().await.unwrap_err();

    assert!(err.is_transient());
    assert!(matches!(err, Error::Http { status: 500, ref message } if message == "Internal Server Error"));
}

#[tokio::test]
async fn test_get_camera_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("cameras/CAM002/status/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "camera_status": {
                "camera_id": "CAM002",
                "status": "active",
                "last_ping": "2025-01-15T10:00:00",
                "uptime": "99.5%"
            }
        })))
        .mount(&server)
        .await;

    let status = client.get_camera_status("CAM002").await.unwrap();

    assert_eq!(status.camera_id.as_deref(), Some("CAM002"));
    assert_eq!(status.status.as_deref(), Some("active"));
    assert_eq!(status.uptime.as_deref(), Some("99.5%"));
}

#[tokio::test]
async fn test_set_camera_status_posts_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(feed_path("cameras/CAM003/status/")))
        .and(body_json(json!({ "status": "inactive" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Camera CAM003 status updated to inactive"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = client.set_camera_status("CAM003", "inactive").await.unwrap();

    assert_eq!(
        message.as_deref(),
        Some("Camera CAM003 status updated to inactive")
    );
}

// ── Detection tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_detections_scoped_to_camera() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("detections/")))
        .and(query_param("camera_id", "CAM001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "detections": [{
                "detection_id": "DET001",
                "camera_id": "CAM001",
                "violation_type": "speeding",
                "plate_number": "GJ05AB1234",
                "location": "Iscon Cross Road, Ahmedabad",
                "detected_at": "2025-01-15T10:30:00.123456",
                "confidence": 95,
                "speed": 85,
                "speed_limit": 60,
                "processed": false
            }]
        })))
        .mount(&server)
        .await;

    let detections = client.list_detections(Some("CAM001")).await.unwrap();

    assert_eq!(detections.len(), 1);
    let d = &detections[0];
    assert_eq!(d.detection_id.as_deref(), Some("DET001"));
    assert_eq!(d.violation_type.as_deref(), Some("speeding"));
    assert_eq!(d.confidence, Some(95.0));
    assert_eq!(d.speed, Some(85.0));
    assert_eq!(d.processed, Some(false));
}

#[tokio::test]
async fn test_list_detections_unscoped_tolerates_null_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("detections/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "detections": [{
                "detection_id": null,
                "violation_type": "no_helmet",
                "location": "CG Road, Ahmedabad"
            }]
        })))
        .mount(&server)
        .await;

    let detections = client.list_detections(None).await.unwrap();

    assert_eq!(detections.len(), 1);
    assert!(detections[0].detection_id.is_none());
    assert!(detections[0].confidence.is_none());
}

// ── Stream tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_stream() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("stream/CAM001/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "stream": {
                "camera_id": "CAM001",
                "stream_url": "rtsp://192.168.1.10:554/live",
                "stream_type": "http",
                "resolution": "1920x1080",
                "fps": 30,
                "is_live": true
            }
        })))
        .mount(&server)
        .await;

    let stream = client.get_stream("CAM001").await.unwrap();

    assert_eq!(
        stream.stream_url.as_deref(),
        Some("rtsp://192.168.1.10:554/live")
    );
    assert_eq!(stream.fps, Some(30));
    assert_eq!(stream.is_live, Some(true));
}

#[tokio::test]
async fn test_get_stream_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(feed_path("stream/CAM001/")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let result = client.get_stream("CAM001").await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
