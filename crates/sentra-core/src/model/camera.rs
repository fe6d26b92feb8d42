// ── Camera domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable camera identifier (e.g. `"CAM001"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for CameraId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CameraId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Operational status of a camera.
///
/// The backend speaks lowercase strings; `"offline"` is an older spelling
/// of `"inactive"`. Anything unrecognised parses to `Unknown`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CameraStatus {
    Active,
    #[strum(to_string = "inactive", serialize = "offline")]
    Inactive,
    Maintenance,
    Unknown,
}

impl CameraStatus {
    /// Parse a backend status string, folding unknown values to `Unknown`.
    pub fn from_wire(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Unknown)
    }

    /// The string the backend expects on `POST cameras/{id}/status/`.
    pub fn as_wire(self) -> &'static str {
        self.into()
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A camera in the directory roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: CameraId,
    pub location: String,
    pub status: CameraStatus,
    pub ip_address: Option<String>,
    pub camera_type: Option<String>,
    /// Raw stream URL on record; the resolver asks the backend instead.
    pub stream_url: Option<String>,
    pub installed_at: Option<DateTime<Utc>>,
    pub last_maintenance_at: Option<DateTime<Utc>>,
}

impl Camera {
    /// Minimal camera, as used by tests and fakes.
    pub fn new(id: impl Into<CameraId>, location: impl Into<String>, status: CameraStatus) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            status,
            ip_address: None,
            camera_type: None,
            stream_url: None,
            installed_at: None,
            last_maintenance_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Point-in-time status report for one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraStatusReport {
    pub camera_id: CameraId,
    pub status: CameraStatus,
    pub last_ping: Option<DateTime<Utc>>,
    /// Free-form uptime figure from the backend (e.g. `"99.5%"`).
    pub uptime: Option<String>,
}
