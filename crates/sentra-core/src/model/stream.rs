// ── Stream domain types ──

use serde::{Deserialize, Serialize};
use url::Url;

use super::camera::CameraId;

/// Whether the backend's stream URL could be played as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamProtocol {
    /// Directly playable HTTP(S) media.
    Native,
    /// The backend URL used a transport the client cannot render; `url`
    /// holds a substitute chosen by the fallback policy.
    Incompatible,
}

/// Stream descriptor as the backend reports it, before playability checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    pub url: Option<String>,
    pub resolution: Option<String>,
    pub fps: Option<u32>,
    pub is_live: Option<bool>,
}

/// A playable stream for one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamReference {
    pub camera_id: CameraId,
    pub url: Url,
    pub protocol: StreamProtocol,
    /// The backend URL when a fallback was substituted.
    pub original_url: Option<String>,
    pub resolution: Option<String>,
    pub fps: Option<u32>,
    pub is_live: Option<bool>,
}

impl StreamReference {
    pub fn is_fallback(&self) -> bool {
        self.protocol == StreamProtocol::Incompatible
    }
}
