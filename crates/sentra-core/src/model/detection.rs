// ── Detection domain types ──

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::camera::CameraId;

/// Violation classification.
///
/// The detector emits several spellings for the same violation; parsing
/// folds them onto one variant. Unrecognised values become `Other` (the raw
/// string stays on [`DetectionEvent::violation_type`]).
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ViolationKind {
    #[strum(to_string = "speeding", serialize = "over_speed")]
    Speeding,
    #[strum(to_string = "red_light_violation", serialize = "signal_jump")]
    RedLight,
    NoHelmet,
    NoSeatbelt,
    #[strum(to_string = "no_parking", serialize = "wrong_parking")]
    Parking,
    TripleRiding,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl ViolationKind {
    pub fn from_wire(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Other)
    }

    /// Human-readable label. `None` for `Other`, which is labelled from
    /// the raw string instead (see [`DetectionEvent::label`]).
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Speeding => Some("Over-speeding"),
            Self::RedLight => Some("Red Light Jump"),
            Self::NoHelmet => Some("No Helmet"),
            Self::NoSeatbelt => Some("No Seatbelt"),
            Self::Parking => Some("No Parking"),
            Self::TripleRiding => Some("Triple Riding"),
            Self::Other => None,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Speeding | Self::RedLight => Severity::High,
            Self::NoHelmet | Self::NoSeatbelt | Self::Parking | Self::TripleRiding => {
                Severity::Medium
            }
            Self::Other => Severity::Low,
        }
    }
}

/// A single detection, as returned by the detections endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub id: String,
    pub camera_id: Option<CameraId>,
    /// Raw classification string from the backend.
    pub violation_type: String,
    pub kind: ViolationKind,
    pub plate_number: Option<String>,
    pub location: Option<String>,
    /// Percentage, 0-100.
    pub confidence: Option<f64>,
    pub detected_at: Option<DateTime<Utc>>,
    pub speed: Option<f64>,
    pub speed_limit: Option<f64>,
    pub evidence_photo: Option<String>,
    pub processed: bool,
}

impl DetectionEvent {
    /// A bare detection with only the classification filled in.
    pub fn new(
        id: impl Into<String>,
        camera_id: Option<CameraId>,
        violation_type: impl Into<String>,
    ) -> Self {
        let violation_type = violation_type.into();
        Self {
            id: id.into(),
            camera_id,
            kind: ViolationKind::from_wire(&violation_type),
            violation_type,
            plate_number: None,
            location: None,
            confidence: None,
            detected_at: None,
            speed: None,
            speed_limit: None,
            evidence_photo: None,
            processed: false,
        }
    }

    /// Display label. Unrecognised kinds show the raw type upper-cased,
    /// with underscores as spaces.
    pub fn label(&self) -> Cow<'static, str> {
        if let Some(label) = self.kind.label() {
            return Cow::Borrowed(label);
        }
        let raw = self.violation_type.trim();
        if raw.is_empty() {
            Cow::Borrowed("Unknown")
        } else {
            Cow::Owned(raw.replace('_', " ").to_uppercase())
        }
    }

    /// How far over the limit a speeding detection was, in km/h.
    pub fn speed_excess(&self) -> Option<f64> {
        match (self.speed, self.speed_limit) {
            (Some(speed), Some(limit)) if speed > limit => Some(speed - limit),
            _ => None,
        }
    }
}
