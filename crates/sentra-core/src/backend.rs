// ── Backend seam ──
//
// Everything the orchestrator needs from the live-feed backend, behind one
// object-safe trait. `LiveFeedClient` is the production implementation;
// tests script their own.

use async_trait::async_trait;
use tracing::debug;

use sentra_api::LiveFeedClient;

use crate::convert::status_report;
use crate::error::CoreError;
use crate::model::{
    Camera, CameraId, CameraStatus, CameraStatusReport, DetectionEvent, StreamSource,
};

/// Source of camera rosters, detections and stream descriptors.
#[async_trait]
pub trait FeedBackend: Send + Sync {
    /// Full camera roster.
    async fn list_cameras(&self) -> Result<Vec<Camera>, CoreError>;

    /// Detection history, optionally scoped to one camera.
    async fn list_detections(
        &self,
        camera_id: Option<&CameraId>,
    ) -> Result<Vec<DetectionEvent>, CoreError>;

    /// Stream descriptor for a camera. The URL is not checked for
    /// playability here.
    async fn fetch_stream(&self, camera_id: &CameraId) -> Result<StreamSource, CoreError>;

    /// Operational status of a single camera.
    async fn camera_status(&self, camera_id: &CameraId) -> Result<CameraStatusReport, CoreError>;

    /// Change a camera's operational status. Returns the backend's
    /// confirmation message, if any.
    async fn set_camera_status(
        &self,
        camera_id: &CameraId,
        status: CameraStatus,
    ) -> Result<Option<String>, CoreError>;
}

#[async_trait]
impl FeedBackend for LiveFeedClient {
    async fn list_cameras(&self) -> Result<Vec<Camera>, CoreError> {
        let records = LiveFeedClient::list_cameras(self).await?;
        debug!(count = records.len(), "fetched camera roster");
        Ok(records.into_iter().map(Camera::from).collect())
    }

    async fn list_detections(
        &self,
        camera_id: Option<&CameraId>,
    ) -> Result<Vec<DetectionEvent>, CoreError> {
        let records = LiveFeedClient::list_detections(self, camera_id.map(CameraId::as_str)).await?;
        Ok(records.into_iter().map(DetectionEvent::from).collect())
    }

    async fn fetch_stream(&self, camera_id: &CameraId) -> Result<StreamSource, CoreError> {
        let descriptor = self.get_stream(camera_id.as_str()).await?;
        Ok(StreamSource::from(descriptor))
    }

    async fn camera_status(&self, camera_id: &CameraId) -> Result<CameraStatusReport, CoreError> {
        let record = self.get_camera_status(camera_id.as_str()).await?;
        Ok(status_report(camera_id, record))
    }

    async fn set_camera_status(
        &self,
        camera_id: &CameraId,
        status: CameraStatus,
    ) -> Result<Option<String>, CoreError> {
        LiveFeedClient::set_camera_status(self, camera_id.as_str(), status.as_wire())
            .await
            .map_err(CoreError::from)
    }
}
