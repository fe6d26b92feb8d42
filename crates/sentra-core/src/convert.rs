// ── API-to-domain type conversions ──
//
// Bridges raw `sentra_api` wire records into canonical `model` types.
// The backend mixes offset-aware RFC 3339 timestamps with naive Python
// `isoformat()` output, so timestamp parsing is lenient.

use chrono::{DateTime, NaiveDateTime, Utc};

use sentra_api::{CameraRecord, CameraStatusRecord, DetectionRecord, StreamDescriptor};

use crate::model::{
    Camera, CameraId, CameraStatus, CameraStatusReport, DetectionEvent, StreamSource,
    ViolationKind,
};

/// Parse a backend timestamp. Naive values are taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_opt_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_timestamp)
}

// ── Camera ───────────────────────────────────────────────────────────

impl From<CameraRecord> for Camera {
    fn from(r: CameraRecord) -> Self {
        Self {
            status: CameraStatus::from_wire(&r.status),
            installed_at: parse_opt_timestamp(r.installed_date.as_deref()),
            last_maintenance_at: parse_opt_timestamp(r.last_maintenance_date.as_deref()),
            id: CameraId::new(r.camera_id),
            location: r.location,
            ip_address: r.ip_address,
            camera_type: r.camera_type,
            stream_url: r.stream_url,
        }
    }
}

/// The status endpoint may omit `camera_id`; the caller's id fills in.
pub(crate) fn status_report(camera_id: &CameraId, r: CameraStatusRecord) -> CameraStatusReport {
    CameraStatusReport {
        camera_id: r.camera_id.map_or_else(|| camera_id.clone(), CameraId::new),
        status: r
            .status
            .as_deref()
            .map_or(CameraStatus::Unknown, CameraStatus::from_wire),
        last_ping: parse_opt_timestamp(r.last_ping.as_deref()),
        uptime: r.uptime,
    }
}

// ── Detection ────────────────────────────────────────────────────────

impl From<DetectionRecord> for DetectionEvent {
    fn from(r: DetectionRecord) -> Self {
        let violation_type = r.violation_type.unwrap_or_default();
        let detected_at = parse_opt_timestamp(r.detected_at.as_deref());
        let camera_id = r.camera_id.map(CameraId::new);

        // Rows without an id get a synthetic one so lists stay keyable.
        let id = r.detection_id.unwrap_or_else(|| {
            let camera = camera_id.as_ref().map_or("unknown", CameraId::as_str);
            let at = detected_at.map_or(0, |t| t.timestamp_millis());
            format!("{camera}:{violation_type}:{at}")
        });

        Self {
            id,
            kind: ViolationKind::from_wire(&violation_type),
            violation_type,
            camera_id,
            plate_number: r.plate_number,
            location: r.location,
            confidence: r.confidence,
            detected_at,
            speed: r.speed,
            speed_limit: r.speed_limit,
            evidence_photo: r.evidence_photo,
            processed: r.processed.unwrap_or(false),
        }
    }
}

// ── Stream ───────────────────────────────────────────────────────────

impl From<StreamDescriptor> for StreamSource {
    fn from(d: StreamDescriptor) -> Self {
        Self {
            url: d.stream_url.filter(|u| !u.trim().is_empty()),
            resolution: d.resolution,
            fps: d.fps,
            is_live: d.is_live,
        }
    }
}
