// ── Camera directory client ──
//
// Thin wrapper over the backend's camera endpoints. Failures are logged
// here and returned as `Err`; the orchestrator turns them into state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::FeedBackend;
use crate::error::CoreError;
use crate::model::{Camera, CameraId, CameraStatus, CameraStatusReport};

/// Fetches the camera roster and per-camera operational status.
#[derive(Clone)]
pub struct CameraDirectory {
    backend: Arc<dyn FeedBackend>,
}

impl CameraDirectory {
    pub fn new(backend: Arc<dyn FeedBackend>) -> Self {
        Self { backend }
    }

    /// Fetch the full roster.
    pub async fn list_cameras(&self) -> Result<Vec<Camera>, CoreError> {
        match self.backend.list_cameras().await {
            Ok(cameras) => {
                debug!(
                    total = cameras.len(),
                    active = cameras.iter().filter(|c| c.is_active()).count(),
                    "camera directory loaded"
                );
                Ok(cameras)
            }
            Err(e) => {
                warn!(error = %e, "camera directory fetch failed");
                Err(e)
            }
        }
    }

    pub async fn camera_status(&self, camera_id: &CameraId) -> Result<CameraStatusReport, CoreError> {
        self.backend
            .camera_status(camera_id)
            .await
            .inspect_err(|e| warn!(camera = %camera_id, error = %e, "camera status fetch failed"))
    }

    /// Toggle a camera's operational status.
    ///
    /// `Unknown` is not a settable status and is rejected before any
    /// request goes out.
    pub async fn set_camera_status(
        &self,
        camera_id: &CameraId,
        status: CameraStatus,
    ) -> Result<Option<String>, CoreError> {
        if status == CameraStatus::Unknown {
            return Err(CoreError::ValidationFailed {
                message: format!("cannot set camera {camera_id} to status 'unknown'"),
            });
        }
        let message = self
            .backend
            .set_camera_status(camera_id, status)
            .await
            .inspect_err(|e| warn!(camera = %camera_id, error = %e, "camera status update failed"))?;
        debug!(camera = %camera_id, %status, "camera status updated");
        Ok(message)
    }
}

/// The camera auto-selected after a directory load: the first one that is
/// active, in roster order.
pub fn first_active(cameras: &[Camera]) -> Option<&Camera> {
    cameras.iter().find(|c| c.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_active_skips_inactive_cameras() {
        let cameras = vec![
            Camera::new("A", "Gate A", CameraStatus::Inactive),
            Camera::new("B", "Gate B", CameraStatus::Active),
            Camera::new("C", "Gate C", CameraStatus::Active),
        ];
        assert_eq!(first_active(&cameras).map(|c| c.id.as_str()), Some("B"));
    }

    #[test]
    fn first_active_with_none_active() {
        let cameras = vec![
            Camera::new("A", "Gate A", CameraStatus::Maintenance),
            Camera::new("B", "Gate B", CameraStatus::Unknown),
        ];
        assert!(first_active(&cameras).is_none());
        assert!(first_active(&[]).is_none());
    }
}
