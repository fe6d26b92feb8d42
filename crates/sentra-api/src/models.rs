// Live-feed API response types
//
// Every endpoint answers with the same envelope: a `status` discriminator,
// an optional `message`, and one payload key that differs per endpoint
// (`cameras`, `detections`, `stream`, `camera_status`). Fields use
// `#[serde(default)]` liberally because the backend falls back to mock
// records with a different field set when its database is unavailable.

use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Envelope discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Uniform response envelope.
///
/// ```json
/// { "status": "success", "cameras": [...] }
/// { "status": "error", "message": "Camera not found" }
/// ```
///
/// The payload key is endpoint-specific, so it stays as raw JSON here and
/// is pulled out by [`LiveFeedClient`](crate::LiveFeedClient).
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

// ── Camera ───────────────────────────────────────────────────────────

/// Camera row from `GET cameras/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraRecord {
    pub camera_id: String,
    #[serde(default)]
    pub location: String,
    /// `"active"`, `"inactive"`, `"offline"`, `"maintenance"`, ...
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub camera_type: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub installed_date: Option<String>,
    #[serde(default)]
    pub last_maintenance_date: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `GET cameras/{id}/status/` (`camera_status` key).
///
/// With a live database this is the whole camera document; in mock mode
/// it carries `last_ping` and `uptime` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraStatusRecord {
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_ping: Option<String>,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Detection ────────────────────────────────────────────────────────

/// Detection row from `GET detections/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Null when the source violation has no id yet.
    #[serde(default)]
    pub detection_id: Option<String>,
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub violation_type: Option<String>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Percentage, 0-100.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// ISO-8601, with or without an offset.
    #[serde(default)]
    pub detected_at: Option<String>,
    /// Measured speed in km/h (speeding detections only).
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub speed_limit: Option<f64>,
    #[serde(default)]
    pub evidence_photo: Option<String>,
    #[serde(default)]
    pub processed: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Stream ───────────────────────────────────────────────────────────

/// Stream descriptor from `GET stream/{id}/` (`stream` key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    #[serde(default)]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Backend's own hint (`"http"`, `"rtsp"`); not trusted for playability.
    #[serde(default)]
    pub stream_type: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
