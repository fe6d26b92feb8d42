// Detection history endpoint
//
// `GET detections/` returns the most recent detections, optionally
// narrowed with `?camera_id=`.

use tracing::debug;

use crate::client::LiveFeedClient;
use crate::error::Error;
use crate::models::DetectionRecord;

impl LiveFeedClient {
    /// List recent detections, scoped to one camera when `camera_id` is set.
    ///
    /// `GET detections/[?camera_id={id}]`
    pub async fn list_detections(
        &self,
        camera_id: Option<&str>,
    ) -> Result<Vec<DetectionRecord>, Error> {
        let mut url = self.endpoint_url(&["detections"])?;
        if let Some(id) = camera_id {
            url.query_pairs_mut().append_pair("camera_id", id);
        }
        debug!(camera_id, "listing detections");
        self.get(url, "detections").await
    }
}
