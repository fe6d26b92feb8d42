// Camera directory endpoints
//
// `GET cameras/` lists the roster; `cameras/{id}/status/` reads or sets
// a camera's operational status.

use serde_json::json;
use tracing::debug;

use crate::client::LiveFeedClient;
use crate::error::Error;
use crate::models::{CameraRecord, CameraStatusRecord};

impl LiveFeedClient {
    /// List every known camera.
    ///
    /// `GET cameras/`
    pub async fn list_cameras(&self) -> Result<Vec<CameraRecord>, Error> {
        let url = self.endpoint_url(&["cameras"])?;
        debug!("listing cameras");
        self.get(url, "cameras").await
    }

    /// Fetch the status document for one camera.
    ///
    /// `GET cameras/{id}/status/`
    pub async fn get_camera_status(&self, camera_id: &str) -> Result<CameraStatusRecord, Error> {
        let url = self.endpoint_url(&["cameras", camera_id, "status"])?;
        debug!(camera_id, "fetching camera status");
        self.get(url, "camera_status").await
    }

    /// Set a camera's operational status (`"active"`, `"inactive"`, ...).
    ///
    /// `POST cameras/{id}/status/` with `{"status": "..."}`. Returns the
    /// backend's confirmation message, if any.
    pub async fn set_camera_status(
        &self,
        camera_id: &str,
        status: &str,
    ) -> Result<Option<String>, Error> {
        let url = self.endpoint_url(&["cameras", camera_id, "status"])?;
        debug!(camera_id, status, "updating camera status");
        self.post(url, &json!({ "status": status })).await
    }
}
